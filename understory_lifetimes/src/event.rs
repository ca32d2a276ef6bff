// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifetime events.

use crate::signal::RemovalSignal;

/// One identity appearing: the element as first observed, plus the signal
/// that fires exactly once when the identity disappears.
#[derive(Clone, Debug)]
pub struct LifetimeEvent<T> {
    /// The element as observed in the snapshot that introduced it.
    pub element: T,
    /// Fires once the element's key is gone, or when the stream ends or is cancelled.
    pub removal: RemovalSignal,
}

impl<T> LifetimeEvent<T> {
    /// Creates an event from its parts.
    #[must_use]
    pub fn new(element: T, removal: RemovalSignal) -> Self {
        Self { element, removal }
    }

    /// Returns `true` while the removal signal has not fired.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.removal.is_fired()
    }

    /// Keeps the lifetime but swaps the element, e.g. for an inner element
    /// found inside the detected container.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LifetimeEvent<U> {
        LifetimeEvent {
            element: f(self.element),
            removal: self.removal,
        }
    }

    /// Splits the event into its element and removal signal.
    pub fn into_parts(self) -> (T, RemovalSignal) {
        (self.element, self.removal)
    }
}
