// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared helpers for the integration tests.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use std::cell::RefCell;
use std::rc::Rc;

use understory_lifetimes::{LifetimeEvent, Notification, RemovalSignal};

/// One observed step of a lifetimes stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Step<T, E> {
    Add(T),
    Remove(T),
    Error(E),
    End,
}

/// Records adds, removals (via each event's removal signal), errors and the end.
///
/// Clones share one log.
pub(crate) struct Recorder<T, E> {
    steps: Rc<RefCell<Vec<Step<T, E>>>>,
    signals: Rc<RefCell<Vec<RemovalSignal>>>,
}

impl<T, E> Clone for Recorder<T, E> {
    fn clone(&self) -> Self {
        Self {
            steps: self.steps.clone(),
            signals: self.signals.clone(),
        }
    }
}

impl<T, E> Recorder<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            steps: Rc::new(RefCell::new(Vec::new())),
            signals: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// An observer that records into this recorder.
    pub(crate) fn observer(&self) -> impl FnMut(Notification<LifetimeEvent<T>, E>) + 'static {
        let steps = self.steps.clone();
        let signals = self.signals.clone();
        move |notification: Notification<LifetimeEvent<T>, E>| match notification {
            Notification::Value(event) => {
                steps.borrow_mut().push(Step::Add(event.element.clone()));
                signals.borrow_mut().push(event.removal.clone());
                let steps = steps.clone();
                let element = event.element;
                event
                    .removal
                    .on_fire(move || steps.borrow_mut().push(Step::Remove(element)));
            }
            Notification::Error(error) => steps.borrow_mut().push(Step::Error(error)),
            Notification::End => steps.borrow_mut().push(Step::End),
        }
    }

    pub(crate) fn steps(&self) -> Vec<Step<T, E>> {
        self.steps.borrow().clone()
    }

    /// Removal signals in the order their events were emitted.
    pub(crate) fn signals(&self) -> Vec<RemovalSignal> {
        self.signals.borrow().clone()
    }

    /// Pushes a marker step, e.g. to show where a snapshot boundary was.
    pub(crate) fn push(&self, step: Step<T, E>) {
        self.steps.borrow_mut().push(step);
    }
}
