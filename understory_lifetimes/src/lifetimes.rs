// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The snapshot-to-lifetimes combinator.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use tracing::{debug, error, trace};

use crate::diff::{SnapshotDiff, diff_keyed};
use crate::event::LifetimeEvent;
use crate::key::KeyFn;
use crate::notification::{Notification, Observer};
use crate::registry::{LifetimeEntry, LifetimeRegistry};
use crate::source::{Source, Subscription};

/// Converts a source of snapshots into a source of [`LifetimeEvent`]s.
///
/// Usually built with [`SourceExt::lifetimes`](crate::SourceExt::lifetimes)
/// and its keyed variants. For every snapshot, the identities that vanished
/// have their removal signals fired (in the order they first appeared), then
/// one event is emitted per new identity (in snapshot order). When the source
/// ends, or the output subscription is cancelled, every identity still alive
/// is removed in the order it first appeared. Errors are forwarded as they
/// arrive and do not disturb the diffing.
///
/// Each subscription has its own registry, so two subscribers to the same
/// `Lifetimes` get independent lifetimes.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_lifetimes::{LifetimeEvent, Notification, Source, SourceExt, Subject};
///
/// let snapshots = Subject::<Vec<char>, ()>::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let sink = log.clone();
/// let lifetimes = snapshots.clone().lifetimes();
/// let _subscription = lifetimes.subscribe(move |n: Notification<LifetimeEvent<char>, ()>| {
///     if let Notification::Value(event) = n {
///         let element = event.element;
///         sink.borrow_mut().push(format!("add {element}"));
///         let sink = sink.clone();
///         event.removal.on_fire(move || sink.borrow_mut().push(format!("remove {element}")));
///     }
/// });
///
/// snapshots.emit(vec!['a', 'b']).unwrap();
/// snapshots.emit(vec!['b', 'c']).unwrap();
/// snapshots.end().unwrap();
///
/// assert_eq!(
///     *log.borrow(),
///     ["add a", "add b", "remove a", "add c", "remove b", "remove c"]
/// );
/// ```
pub struct Lifetimes<S, KF> {
    source: S,
    key_fn: Rc<KF>,
}

impl<S, KF> Lifetimes<S, KF> {
    /// Wraps `source`, identifying snapshot items with `key_fn`.
    pub fn new(source: S, key_fn: KF) -> Self {
        Self {
            source,
            key_fn: Rc::new(key_fn),
        }
    }

    /// Returns the wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: fmt::Debug, KF> fmt::Debug for Lifetimes<S, KF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifetimes")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<S, KF, T> Source for Lifetimes<S, KF>
where
    S: Source,
    S::Item: IntoIterator<Item = T> + 'static,
    S::Error: 'static,
    T: Clone + 'static,
    KF: KeyFn<T, S::Error> + 'static,
    KF::Key: 'static,
{
    type Item = LifetimeEvent<T>;
    type Error = S::Error;

    fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<LifetimeEvent<T>, S::Error> + 'static,
    {
        let driver: Rc<Driver<S::Item, T, S::Error, KF>> =
            Rc::new(Driver::new(self.key_fn.clone(), Box::new(observer)));
        let upstream = {
            let driver = driver.clone();
            self.source
                .subscribe(move |notification: Notification<S::Item, S::Error>| {
                    driver.push(notification);
                })
        };
        driver.attach(upstream);
        Subscription::new(move || driver.cancel())
    }
}

struct DriverState<I, T, E, K> {
    registry: LifetimeRegistry<K, LifetimeEntry<T>>,
    /// Notifications that arrived while another one was being processed.
    pending: VecDeque<Notification<I, E>>,
    busy: bool,
    /// Set once teardown has started; nothing is processed afterwards.
    closed: bool,
}

/// Per-subscription state of a [`Lifetimes`] stream.
///
/// No `RefCell` borrow is held while user code runs (removal listeners, the
/// downstream observer), so both may cancel the subscription or push into the
/// source from inside their callbacks.
struct Driver<I, T, E, KF>
where
    KF: KeyFn<T, E>,
{
    key_fn: Rc<KF>,
    state: RefCell<DriverState<I, T, E, KF::Key>>,
    downstream: RefCell<Option<Box<dyn Observer<LifetimeEvent<T>, E>>>>,
    upstream: RefCell<Option<Subscription>>,
}

impl<I, T, E, KF> Driver<I, T, E, KF>
where
    I: IntoIterator<Item = T>,
    T: Clone,
    KF: KeyFn<T, E>,
{
    fn new(key_fn: Rc<KF>, downstream: Box<dyn Observer<LifetimeEvent<T>, E>>) -> Self {
        Self {
            key_fn,
            state: RefCell::new(DriverState {
                registry: LifetimeRegistry::new(),
                pending: VecDeque::new(),
                busy: false,
                closed: false,
            }),
            downstream: RefCell::new(Some(downstream)),
            upstream: RefCell::new(None),
        }
    }

    fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// Keeps the upstream subscription alive until teardown.
    fn attach(&self, upstream: Subscription) {
        if self.is_closed() {
            // The source ended while we were subscribing.
            upstream.unsubscribe();
        } else {
            *self.upstream.borrow_mut() = Some(upstream);
        }
    }

    /// Accepts one upstream notification and processes everything queued,
    /// one notification at a time.
    fn push(&self, notification: Notification<I, E>) {
        {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return;
            }
            state.pending.push_back(notification);
            if state.busy {
                return;
            }
            state.busy = true;
        }

        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                match state.pending.pop_front() {
                    Some(next) if !state.closed => next,
                    _ => {
                        state.busy = false;
                        return;
                    }
                }
            };
            match next {
                Notification::Value(snapshot) => self.apply(snapshot),
                Notification::Error(error) => {
                    debug!("forwarding source error");
                    self.emit(Notification::Error(error));
                }
                Notification::End => self.finish(),
            }
        }
    }

    fn apply(&self, snapshot: I) {
        // Keys are extracted before the registry is borrowed: a key function
        // that cancels or pushes into the source must find the state free.
        let keyed: Vec<(Result<KF::Key, E>, T)> = snapshot
            .into_iter()
            .map(|item| (self.key_fn.key(&item), item))
            .collect();
        let SnapshotDiff {
            removed,
            added,
            errors,
        } = {
            let state = self.state.borrow();
            if state.closed {
                return;
            }
            diff_keyed(&state.registry, keyed)
        };
        trace!(
            removed = removed.len(),
            added = added.len(),
            errors = errors.len(),
            "diffed snapshot"
        );

        for error in errors {
            if self.is_closed() {
                return;
            }
            self.emit(Notification::Error(error));
        }

        for key in removed {
            let entry = {
                let mut state = self.state.borrow_mut();
                if state.closed {
                    return;
                }
                state.registry.remove(&key)
            };
            if let Some(entry) = entry {
                entry.fire();
            }
        }

        for (key, element) in added {
            let (entry, removal) = LifetimeEntry::new(element.clone());
            {
                let mut state = self.state.borrow_mut();
                if state.closed {
                    return;
                }
                if state.registry.insert(key, entry).is_err() {
                    error!("diff reported an addition for a key that is still live; skipped");
                    continue;
                }
            }
            self.emit(Notification::Value(LifetimeEvent::new(element, removal)));
        }
    }

    /// Fires every remaining removal signal in registry order and closes.
    fn teardown(&self, reason: &'static str) {
        let remaining: Vec<LifetimeEntry<T>> = {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return;
            }
            state.closed = true;
            state.pending.clear();
            state.registry.drain().map(|(_, entry)| entry).collect()
        };
        debug!(reason, remaining = remaining.len(), "tearing down lifetimes");
        for entry in remaining {
            entry.fire();
        }
    }

    fn finish(&self) {
        self.teardown("source ended");
        let downstream = self.downstream.borrow_mut().take();
        if let Some(mut downstream) = downstream {
            downstream.notify(Notification::End);
        }
        let upstream = self.upstream.borrow_mut().take();
        drop(upstream);
    }

    fn cancel(&self) {
        let upstream = self.upstream.borrow_mut().take();
        drop(upstream);
        self.teardown("cancelled");
        let downstream = self.downstream.borrow_mut().take();
        drop(downstream);
    }

    fn emit(&self, notification: Notification<LifetimeEvent<T>, E>) {
        // Taken out for the call: the observer may cancel from inside it.
        let Some(mut downstream) = self.downstream.borrow_mut().take() else {
            return;
        };
        downstream.notify(notification);
        if !self.is_closed() {
            *self.downstream.borrow_mut() = Some(downstream);
        }
    }
}
