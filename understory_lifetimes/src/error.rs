// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use core::fmt;

/// Error returned by [`LifetimeRegistry::insert`](crate::LifetimeRegistry::insert)
/// when the key already has a live entry.
///
/// Entries are never replaced in place: the old entry must be removed first.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyOccupied<K> {
    /// The key that already has a live entry.
    pub key: K,
}

impl<K: fmt::Debug> fmt::Debug for KeyOccupied<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyOccupied {{ key: {:?} }}", self.key)
    }
}

impl<K: fmt::Debug> fmt::Display for KeyOccupied<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key {:?} already has a live registry entry", self.key)
    }
}

impl<K: fmt::Debug> core::error::Error for KeyOccupied<K> {}

/// Error returned when notifying a [`Subject`](crate::Subject) or
/// [`Property`](crate::Property) that has already ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SourceEnded;

impl fmt::Display for SourceEnded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the source has already ended")
    }
}

impl core::error::Error for SourceEnded {}
