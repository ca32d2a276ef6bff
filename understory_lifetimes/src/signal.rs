// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot removal signals.
//!
//! A removal signal is split into two halves by [`removal_signal`]:
//!
//! - [`RemovalTrigger`]: the single writer. [`RemovalTrigger::fire`] consumes
//!   the trigger, so a signal cannot be fired twice. Dropping a trigger that
//!   was never fired fires it, so a signal is never left pending.
//! - [`RemovalSignal`]: a cloneable reader handle. Listeners registered with
//!   [`RemovalSignal::on_fire`] run exactly once, in registration order.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_lifetimes::removal_signal;
//!
//! let (trigger, signal) = removal_signal();
//! let hits = Rc::new(Cell::new(0));
//!
//! let counter = hits.clone();
//! signal.on_fire(move || counter.set(counter.get() + 1));
//! assert!(!signal.is_fired());
//!
//! trigger.fire();
//! assert!(signal.is_fired());
//! assert_eq!(hits.get(), 1);
//!
//! // Late listeners run immediately.
//! let counter = hits.clone();
//! signal.on_fire(move || counter.set(counter.get() + 1));
//! assert_eq!(hits.get(), 2);
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use smallvec::SmallVec;

type Listener = Box<dyn FnOnce()>;

/// Identifies a listener registered with [`RemovalSignal::on_fire`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct SignalState {
    fired: bool,
    next_id: u64,
    // Almost every signal has exactly one listener.
    listeners: SmallVec<[(ListenerId, Listener); 1]>,
}

/// Creates a connected, unfired trigger/signal pair.
#[must_use]
pub fn removal_signal() -> (RemovalTrigger, RemovalSignal) {
    let state = Rc::new(RefCell::new(SignalState {
        fired: false,
        next_id: 0,
        listeners: SmallVec::new(),
    }));
    (
        RemovalTrigger {
            state: state.clone(),
        },
        RemovalSignal { state },
    )
}

fn fire(state: &RefCell<SignalState>) {
    let listeners = {
        let mut state = state.borrow_mut();
        if state.fired {
            return;
        }
        state.fired = true;
        core::mem::take(&mut state.listeners)
    };
    // The borrow is released first: listeners may register further listeners
    // (which then run immediately) or drop other subscriptions.
    for (_, listener) in listeners {
        listener();
    }
}

/// The firing half of a removal signal.
///
/// See the [module documentation](self) for the contract.
pub struct RemovalTrigger {
    state: Rc<RefCell<SignalState>>,
}

impl RemovalTrigger {
    /// Fires the signal, running every registered listener in registration order.
    pub fn fire(self) {
        fire(&self.state);
    }

    /// Returns a reader handle for this trigger's signal.
    #[must_use]
    pub fn signal(&self) -> RemovalSignal {
        RemovalSignal {
            state: self.state.clone(),
        }
    }
}

impl Drop for RemovalTrigger {
    fn drop(&mut self) {
        fire(&self.state);
    }
}

impl fmt::Debug for RemovalTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemovalTrigger")
            .field("fired", &self.state.borrow().fired)
            .finish()
    }
}

/// The observing half of a removal signal.
///
/// Cloning the handle does not create a new signal; all clones observe the
/// same firing. Use [`RemovalSignal::same_signal`] to compare identities.
#[derive(Clone)]
pub struct RemovalSignal {
    state: Rc<RefCell<SignalState>>,
}

impl RemovalSignal {
    /// Returns `true` once the signal has fired.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.state.borrow().fired
    }

    /// Registers `listener` to run when the signal fires.
    ///
    /// If the signal has already fired, `listener` runs immediately, before
    /// this method returns.
    pub fn on_fire(&self, listener: impl FnOnce() + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id);
        state.next_id = state.next_id.wrapping_add(1);
        if state.fired {
            drop(state);
            listener();
        } else {
            state.listeners.push((id, Box::new(listener)));
        }
        id
    }

    /// Removes a pending listener.
    ///
    /// Returns `false` if the listener already ran or was already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|(listener_id, _)| *listener_id != id);
        state.listeners.len() != before
    }

    /// Returns `true` if both handles observe the same signal.
    #[must_use]
    pub fn same_signal(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for RemovalSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("RemovalSignal")
            .field("fired", &state.fired)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}
