// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Concrete push sources: [`Subject`] and [`Property`].
//!
//! Both are handles: clones share the same underlying stream. Notifications
//! are delivered synchronously to every current subscriber. A notification
//! sent from inside an observer is queued and delivered once the current one
//! has reached every subscriber, so observers always see notifications in the
//! order they were sent.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use tracing::warn;

use crate::error::SourceEnded;
use crate::notification::{Notification, Observer};
use crate::source::{Source, Subscription};

struct Slot<T, E> {
    id: u64,
    active: Cell<bool>,
    observer: RefCell<Box<dyn Observer<T, E>>>,
}

impl<T, E> Slot<T, E> {
    fn deliver(&self, notification: Notification<T, E>) {
        if self.active.get() {
            self.observer.borrow_mut().notify(notification);
        }
    }
}

struct Core<T, E> {
    slots: Vec<Rc<Slot<T, E>>>,
    queue: VecDeque<Notification<T, E>>,
    next_id: u64,
    /// Set by `end`; no further notifications are accepted.
    ended: bool,
    /// Set once `End` has been delivered; subscribers are released.
    finished: bool,
    dispatching: bool,
    /// Whether delivered values are kept for replay to new subscribers.
    replay: bool,
    current: Option<T>,
}

type Shared<T, E> = Rc<RefCell<Core<T, E>>>;

impl<T, E> Core<T, E> {
    fn new(replay: bool, current: Option<T>) -> Shared<T, E> {
        Rc::new(RefCell::new(Self {
            slots: Vec::new(),
            queue: VecDeque::new(),
            next_id: 0,
            ended: false,
            finished: false,
            dispatching: false,
            replay,
            current,
        }))
    }
}

fn send<T, E>(core: &Shared<T, E>, notification: Notification<T, E>) -> Result<(), SourceEnded>
where
    T: Clone,
    E: Clone,
{
    {
        let mut state = core.borrow_mut();
        if state.ended {
            warn!("notification sent to an ended source was dropped");
            return Err(SourceEnded);
        }
        if notification.is_end() {
            state.ended = true;
        }
        state.queue.push_back(notification);
        if state.dispatching {
            return Ok(());
        }
        state.dispatching = true;
    }
    dispatch(core);
    Ok(())
}

/// Delivers queued notifications until the queue is empty.
///
/// The caller must have set `dispatching`.
fn dispatch<T, E>(core: &Shared<T, E>)
where
    T: Clone,
    E: Clone,
{
    loop {
        let (notification, slots) = {
            let mut state = core.borrow_mut();
            let Some(notification) = state.queue.pop_front() else {
                state.dispatching = false;
                return;
            };
            if state.replay {
                if let Notification::Value(value) = &notification {
                    state.current = Some(value.clone());
                }
            }
            // Observers subscribing while `End` is delivered get the
            // after-end replay instead of a slot that is about to be released.
            if notification.is_end() {
                state.finished = true;
            }
            (notification, state.slots.clone())
        };

        let is_end = notification.is_end();
        for slot in &slots {
            slot.deliver(notification.clone());
        }

        if is_end {
            let released = {
                let mut state = core.borrow_mut();
                state.queue.clear();
                core::mem::take(&mut state.slots)
            };
            for slot in &released {
                slot.active.set(false);
            }
        }
    }
}

fn subscribe<T, E>(core: &Shared<T, E>, observer: Box<dyn Observer<T, E>>) -> Subscription
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let mut state = core.borrow_mut();
    if state.finished {
        let replay = state.current.clone();
        drop(state);
        let mut observer = observer;
        if let Some(value) = replay {
            observer.notify(Notification::Value(value));
        }
        observer.notify(Notification::End);
        return Subscription::empty();
    }

    let id = state.next_id;
    state.next_id += 1;
    let slot = Rc::new(Slot {
        id,
        active: Cell::new(true),
        observer: RefCell::new(observer),
    });
    state.slots.push(slot.clone());
    let replay = state.current.clone();
    // The replay counts as a dispatch step so that anything the new observer
    // sends while handling it is queued behind it.
    let was_dispatching = core::mem::replace(&mut state.dispatching, true);
    drop(state);

    if let Some(value) = replay {
        slot.deliver(Notification::Value(value));
    }
    if !was_dispatching {
        dispatch(core);
    }

    let weak: Weak<RefCell<Core<T, E>>> = Rc::downgrade(core);
    Subscription::new(move || {
        let Some(core) = weak.upgrade() else {
            return;
        };
        let removed = {
            let mut state = core.borrow_mut();
            let position = state.slots.iter().position(|slot| slot.id == id);
            position.map(|position| state.slots.remove(position))
        };
        if let Some(slot) = removed {
            slot.active.set(false);
            // Dropped outside the borrow: the observer may own other subscriptions.
            drop(slot);
        }
    })
}

/// A plain push stream.
///
/// Subscribers only see notifications sent after they subscribed.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_lifetimes::{Notification, Source, Subject};
///
/// let subject = Subject::<u32, ()>::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let log = seen.clone();
/// let _subscription = subject.subscribe(move |n: Notification<u32, ()>| log.borrow_mut().push(n));
///
/// subject.emit(1).unwrap();
/// subject.end().unwrap();
/// assert!(subject.emit(2).is_err());
///
/// assert_eq!(*seen.borrow(), [Notification::Value(1), Notification::End]);
/// ```
pub struct Subject<T, E> {
    core: Shared<T, E>,
}

impl<T, E> Subject<T, E>
where
    T: Clone,
    E: Clone,
{
    /// Creates a subject with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: Core::new(false, None),
        }
    }

    /// Sends a value to every subscriber.
    pub fn emit(&self, value: T) -> Result<(), SourceEnded> {
        send(&self.core, Notification::Value(value))
    }

    /// Sends an error to every subscriber. Errors do not end the stream.
    pub fn error(&self, error: E) -> Result<(), SourceEnded> {
        send(&self.core, Notification::Error(error))
    }

    /// Ends the stream.
    pub fn end(&self) -> Result<(), SourceEnded> {
        send(&self.core, Notification::End)
    }
}

impl<T, E> Subject<T, E> {
    /// Returns `true` once [`end`](Self::end) has been called.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.core.borrow().ended
    }

    /// Returns the number of current subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.core.borrow().slots.len()
    }
}

impl<T, E> Default for Subject<T, E>
where
    T: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for Subject<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Subject<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.core.borrow();
        f.debug_struct("Subject")
            .field("subscribers", &state.slots.len())
            .field("ended", &state.ended)
            .finish()
    }
}

impl<T, E> Source for Subject<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    type Item = T;
    type Error = E;

    fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<T, E> + 'static,
    {
        subscribe(&self.core, Box::new(observer))
    }
}

/// A push stream with a current value.
///
/// Every new subscriber first receives the current value, if there is one,
/// before [`subscribe`](Source::subscribe) returns; later values follow as
/// they are set. A subscriber arriving after the end still receives the last
/// value, followed by the end.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_lifetimes::{Notification, Property, Source};
///
/// let property = Property::<&str, ()>::with_value("a");
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let log = seen.clone();
/// let _subscription = property.subscribe(move |n: Notification<&'static str, ()>| log.borrow_mut().push(n));
/// property.set("b").unwrap();
///
/// assert_eq!(*seen.borrow(), [Notification::Value("a"), Notification::Value("b")]);
/// assert_eq!(property.current(), Some("b"));
/// ```
pub struct Property<T, E> {
    core: Shared<T, E>,
}

impl<T, E> Property<T, E>
where
    T: Clone,
    E: Clone,
{
    /// Creates a property without a current value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: Core::new(true, None),
        }
    }

    /// Creates a property whose current value is `value`.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self {
            core: Core::new(true, Some(value)),
        }
    }

    /// Sets the current value and sends it to every subscriber.
    pub fn set(&self, value: T) -> Result<(), SourceEnded> {
        send(&self.core, Notification::Value(value))
    }

    /// Sends an error to every subscriber. The current value is unchanged.
    pub fn error(&self, error: E) -> Result<(), SourceEnded> {
        send(&self.core, Notification::Error(error))
    }

    /// Ends the stream. The current value is kept for late subscribers.
    pub fn end(&self) -> Result<(), SourceEnded> {
        send(&self.core, Notification::End)
    }

    /// Returns the last delivered value.
    #[must_use]
    pub fn current(&self) -> Option<T> {
        self.core.borrow().current.clone()
    }
}

impl<T, E> Property<T, E> {
    /// Returns `true` once [`end`](Self::end) has been called.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.core.borrow().ended
    }

    /// Returns the number of current subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.core.borrow().slots.len()
    }
}

impl<T, E> Default for Property<T, E>
where
    T: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for Property<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Property<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.core.borrow();
        f.debug_struct("Property")
            .field("current", &state.current)
            .field("subscribers", &state.slots.len())
            .field("ended", &state.ended)
            .finish()
    }
}

impl<T, E> Source for Property<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    type Item = T;
    type Error = E;

    fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<T, E> + 'static,
    {
        subscribe(&self.core, Box::new(observer))
    }
}
