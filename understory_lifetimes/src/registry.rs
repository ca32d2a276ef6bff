// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Insertion-ordered registry of live entries.

use alloc::collections::BTreeMap;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::error::KeyOccupied;
use crate::signal::{RemovalSignal, RemovalTrigger, removal_signal};

/// An insertion-ordered map from identity key to live entry.
///
/// Iteration yields entries in the order they were inserted. Removing an entry
/// keeps the relative order of the remaining ones, and a key that is removed
/// and inserted again moves to the end.
///
/// Entries are never replaced in place: [`insert`](Self::insert) on a key
/// that is still present fails with [`KeyOccupied`].
///
/// # Example
///
/// ```
/// use understory_lifetimes::LifetimeRegistry;
///
/// let mut registry = LifetimeRegistry::new();
/// registry.insert('a', 1).unwrap();
/// registry.insert('b', 2).unwrap();
/// registry.insert('c', 3).unwrap();
///
/// assert!(registry.insert('b', 20).is_err());
/// assert_eq!(registry.remove(&'a'), Some(1));
/// registry.insert('a', 10).unwrap();
///
/// let keys: Vec<_> = registry.keys().copied().collect();
/// assert_eq!(keys, ['b', 'c', 'a']);
/// ```
#[derive(Debug, Clone)]
pub struct LifetimeRegistry<K, V> {
    /// Key to insertion sequence number.
    slots: HashMap<K, u64>,
    /// Entries ordered by insertion sequence number.
    order: BTreeMap<u64, (K, V)>,
    next_seq: u64,
}

impl<K, V> Default for LifetimeRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> LifetimeRegistry<K, V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if there are no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.order.values().map(|(key, value)| (key, value))
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.order.values().map(|(key, _)| key)
    }

    /// Removes every entry, yielding them in insertion order.
    pub fn drain(&mut self) -> impl Iterator<Item = (K, V)> + '_ {
        self.slots.clear();
        core::mem::take(&mut self.order).into_values()
    }
}

impl<K, V> LifetimeRegistry<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Returns `true` if `key` has a live entry.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Returns the live entry for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let seq = self.slots.get(key)?;
        self.order.get(seq).map(|(_, value)| value)
    }

    /// Appends a new entry at the end of the iteration order.
    ///
    /// Fails without touching the registry if `key` already has a live entry.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), KeyOccupied<K>> {
        if self.slots.contains_key(&key) {
            return Err(KeyOccupied { key });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(key.clone(), seq);
        self.order.insert(seq, (key, value));
        Ok(())
    }

    /// Removes and returns the entry for `key`.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let seq = self.slots.remove(key)?;
        self.order.remove(&seq).map(|(_, value)| value)
    }
}

/// A live entry: the element as first observed plus the trigger of its
/// removal signal.
///
/// The element is frozen at creation. Later snapshots that still contain the
/// same key do not update it.
#[derive(Debug)]
pub struct LifetimeEntry<T> {
    element: T,
    trigger: RemovalTrigger,
}

impl<T> LifetimeEntry<T> {
    /// Creates an entry with a fresh, unfired removal signal.
    #[must_use]
    pub fn new(element: T) -> (Self, RemovalSignal) {
        let (trigger, signal) = removal_signal();
        (Self { element, trigger }, signal)
    }

    /// The element captured when the entry was created.
    #[must_use]
    pub fn element(&self) -> &T {
        &self.element
    }

    /// Returns a reader handle for this entry's removal signal.
    #[must_use]
    pub fn signal(&self) -> RemovalSignal {
        self.trigger.signal()
    }

    /// Fires the removal signal and returns the captured element.
    pub fn fire(self) -> T {
        self.trigger.fire();
        self.element
    }
}
