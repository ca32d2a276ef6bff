// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Push notifications and the observers that receive them.

/// A single notification delivered by a [`Source`](crate::Source).
///
/// A source delivers any number of values and errors, interleaved in any
/// order, followed by at most one `End`. Nothing is delivered after `End`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification<T, E> {
    /// A value (for a snapshot source, one complete snapshot).
    Value(T),
    /// An error. Errors are not terminal.
    Error(E),
    /// The source will deliver nothing further.
    End,
}

impl<T, E> Notification<T, E> {
    /// Returns `true` if this is a [`Notification::Value`].
    #[must_use]
    #[inline]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value(..))
    }

    /// Returns `true` if this is a [`Notification::Error`].
    #[must_use]
    #[inline]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(..))
    }

    /// Returns `true` if this is [`Notification::End`].
    #[must_use]
    #[inline]
    pub const fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Maps the value of a [`Notification::Value`], leaving errors and `End` untouched.
    pub fn map_value<U>(self, f: impl FnOnce(T) -> U) -> Notification<U, E> {
        match self {
            Self::Value(value) => Notification::Value(f(value)),
            Self::Error(error) => Notification::Error(error),
            Self::End => Notification::End,
        }
    }
}

/// Receives the notifications of a [`Source`](crate::Source).
///
/// Any `FnMut(Notification<T, E>)` closure is an observer.
pub trait Observer<T, E> {
    /// Handles one notification.
    fn notify(&mut self, notification: Notification<T, E>);
}

impl<T, E, F> Observer<T, E> for F
where
    F: FnMut(Notification<T, E>),
{
    #[inline]
    fn notify(&mut self, notification: Notification<T, E>) {
        self(notification);
    }
}
