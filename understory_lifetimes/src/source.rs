// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Push sources and subscriptions.

use alloc::boxed::Box;
use core::fmt;

use crate::key::{ByKey, Identity, TryByKey};
use crate::lifetimes::Lifetimes;
use crate::notification::Observer;
use crate::signal::{ListenerId, RemovalSignal};

/// A push-based producer of notifications.
///
/// Subscribing registers an observer; the returned [`Subscription`] cancels
/// it. A source delivers values and errors in any interleaving, then at most
/// one [`End`](crate::Notification::End).
pub trait Source {
    /// The value type.
    type Item;
    /// The error type.
    type Error;

    /// Registers `observer` and returns the guard that cancels it.
    ///
    /// A property-like source may notify `observer` before this returns.
    fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: Observer<Self::Item, Self::Error> + 'static;
}

/// An owned cancellation guard returned by [`Source::subscribe`].
///
/// Cancellation runs synchronously, either through
/// [`unsubscribe`](Self::unsubscribe) or when the guard is dropped.
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a subscription that runs `cancel` when cancelled.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Creates a subscription with nothing left to cancel.
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    /// Cancels the subscription. All cleanup has run when this returns.
    pub fn unsubscribe(mut self) {
        self.run_cancel();
    }

    /// Drops the guard without cancelling.
    ///
    /// The observer stays registered until the source ends.
    pub fn detach(mut self) {
        self.cancel = None;
    }

    /// Cancels this subscription when `signal` fires.
    ///
    /// This scopes a subscription to the lifetime of another element, e.g. a
    /// watcher of a container's children that should stop when the container
    /// is removed. If `signal` has already fired, the subscription is
    /// cancelled immediately.
    pub fn cancel_on(self, signal: &RemovalSignal) -> ListenerId {
        signal.on_fire(move || self.unsubscribe())
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("pending", &self.cancel.is_some())
            .finish()
    }
}

/// Combinators available on every [`Source`] of snapshots.
pub trait SourceExt: Source + Sized {
    /// Turns snapshots into lifetimes, using each item as its own key.
    fn lifetimes(self) -> Lifetimes<Self, Identity> {
        Lifetimes::new(self, Identity)
    }

    /// Turns snapshots into lifetimes, identifying items by `key_fn`.
    fn lifetimes_by_key<F>(self, key_fn: F) -> Lifetimes<Self, ByKey<F>> {
        Lifetimes::new(self, ByKey(key_fn))
    }

    /// Turns snapshots into lifetimes with a fallible key function.
    ///
    /// Items whose key cannot be extracted are left out of their snapshot and
    /// the error is forwarded downstream.
    fn try_lifetimes_by_key<F>(self, key_fn: F) -> Lifetimes<Self, TryByKey<F>> {
        Lifetimes::new(self, TryByKey(key_fn))
    }
}

impl<S: Source> SourceExt for S {}
