// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity key extraction.

use core::fmt;
use core::hash::Hash;

/// Extracts the identity key of a snapshot item.
///
/// Two items with equal keys are the same identity, no matter how the rest of
/// the item differs. Key extraction should be pure. Keys are extracted before
/// the combinator touches its registry, so a key function that cancels the
/// subscription (or pushes into the source, which is queued) is tolerated.
///
/// `E` is the error type of the source; a fallible key function reports
/// failures in that type so they can be forwarded downstream.
pub trait KeyFn<T, E> {
    /// The identity key.
    type Key: Clone + Eq + Hash;

    /// Returns the key of `item`.
    fn key(&self, item: &T) -> Result<Self::Key, E>;
}

/// The item is its own key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity;

impl<T, E> KeyFn<T, E> for Identity
where
    T: Clone + Eq + Hash,
{
    type Key = T;

    #[inline]
    fn key(&self, item: &T) -> Result<T, E> {
        Ok(item.clone())
    }
}

/// Keys items with an infallible function.
#[derive(Copy, Clone)]
pub struct ByKey<F>(pub F);

impl<T, E, K, F> KeyFn<T, E> for ByKey<F>
where
    F: Fn(&T) -> K,
    K: Clone + Eq + Hash,
{
    type Key = K;

    #[inline]
    fn key(&self, item: &T) -> Result<K, E> {
        Ok((self.0)(item))
    }
}

impl<F> fmt::Debug for ByKey<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByKey").finish_non_exhaustive()
    }
}

/// Keys items with a fallible function.
///
/// An item whose key cannot be extracted is left out of the snapshot it
/// belongs to, and the error is forwarded on the output.
#[derive(Copy, Clone)]
pub struct TryByKey<F>(pub F);

impl<T, E, K, F> KeyFn<T, E> for TryByKey<F>
where
    F: Fn(&T) -> Result<K, E>,
    K: Clone + Eq + Hash,
{
    type Key = K;

    #[inline]
    fn key(&self, item: &T) -> Result<K, E> {
        (self.0)(item)
    }
}

impl<F> fmt::Debug for TryByKey<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TryByKey").finish_non_exhaustive()
    }
}
