// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Snapshot diffing against the live registry.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashSet;
use tracing::{trace, warn};

use crate::key::KeyFn;
use crate::registry::LifetimeRegistry;

/// The result of diffing one snapshot against the live registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotDiff<K, T, E> {
    /// Live keys missing from the snapshot, in registry insertion order.
    pub removed: Vec<K>,
    /// Snapshot items whose key is not live, in snapshot order.
    pub added: Vec<(K, T)>,
    /// Key extraction failures, in snapshot order.
    pub errors: Vec<E>,
}

impl<K, T, E> SnapshotDiff<K, T, E> {
    /// Returns `true` if the snapshot changes nothing and raised no errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.errors.is_empty()
    }
}

/// Diffs `snapshot` against the keys currently in `registry`.
///
/// Keys present in both produce nothing. The registry is not modified.
///
/// When several items in one snapshot share a key, the first occurrence wins
/// and later ones are ignored. An item whose key cannot be extracted is left
/// out of the snapshot entirely: it adds nothing, and it does not keep any
/// live entry alive.
///
/// # Example
///
/// ```
/// use understory_lifetimes::{Identity, LifetimeRegistry, diff};
///
/// let mut registry = LifetimeRegistry::new();
/// registry.insert('a', ()).unwrap();
/// registry.insert('b', ()).unwrap();
///
/// let result = diff::<_, (), _, _, _>(&registry, ['b', 'd'], &Identity);
/// assert_eq!(result.removed, ['a']);
/// assert_eq!(result.added, [('d', 'd')]);
/// ```
pub fn diff<T, E, KF, V, I>(
    registry: &LifetimeRegistry<KF::Key, V>,
    snapshot: I,
    key_fn: &KF,
) -> SnapshotDiff<KF::Key, T, E>
where
    I: IntoIterator<Item = T>,
    KF: KeyFn<T, E> + ?Sized,
{
    diff_keyed(
        registry,
        snapshot.into_iter().map(|item| (key_fn.key(&item), item)),
    )
}

/// Like [`diff`], for items whose keys were already extracted.
pub(crate) fn diff_keyed<K, T, E, V, I>(
    registry: &LifetimeRegistry<K, V>,
    keyed: I,
) -> SnapshotDiff<K, T, E>
where
    I: IntoIterator<Item = (Result<K, E>, T)>,
    K: Clone + Eq + Hash,
{
    let keyed = keyed.into_iter();
    let mut present: HashSet<K> = HashSet::with_capacity(keyed.size_hint().0);
    let mut added = Vec::new();
    let mut errors = Vec::new();

    for (key, item) in keyed {
        let key = match key {
            Ok(key) => key,
            Err(error) => {
                warn!("key extraction failed; item left out of snapshot");
                errors.push(error);
                continue;
            }
        };
        if !present.insert(key.clone()) {
            trace!("ignoring duplicate key within snapshot");
            continue;
        }
        if !registry.contains(&key) {
            added.push((key, item));
        }
    }

    let removed = registry
        .keys()
        .filter(|key| !present.contains(*key))
        .cloned()
        .collect();

    SnapshotDiff {
        removed,
        added,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{ByKey, Identity, TryByKey};
    use alloc::vec;

    fn registry_of(keys: &[char]) -> LifetimeRegistry<char, ()> {
        let mut registry = LifetimeRegistry::new();
        for key in keys {
            registry.insert(*key, ()).unwrap();
        }
        registry
    }

    #[test]
    fn removed_follow_registry_order() {
        // Inserted c, a, b: removal order is registry order, not alphabetical
        // and not snapshot order.
        let registry = registry_of(&['c', 'a', 'b']);
        let result: SnapshotDiff<_, _, ()> = diff(&registry, ['b'], &Identity);

        assert_eq!(result.removed, vec!['c', 'a']);
        assert!(result.added.is_empty());
    }

    #[test]
    fn added_follow_snapshot_order() {
        let registry = registry_of(&['a']);
        let result: SnapshotDiff<_, _, ()> = diff(&registry, ['z', 'a', 'm'], &Identity);

        assert!(result.removed.is_empty());
        assert_eq!(result.added, vec![('z', 'z'), ('m', 'm')]);
    }

    #[test]
    fn unchanged_snapshot_is_empty() {
        let registry = registry_of(&['a', 'b']);
        let result: SnapshotDiff<_, _, ()> = diff(&registry, ['b', 'a'], &Identity);
        assert!(result.is_empty());
    }

    #[test]
    fn first_duplicate_wins() {
        let registry = LifetimeRegistry::<u32, ()>::new();
        let items = [(1, "first"), (2, "x"), (1, "second")];
        let by_id = ByKey(|item: &(u32, &str)| item.0);
        let result: SnapshotDiff<_, _, ()> = diff(&registry, items, &by_id);

        assert_eq!(result.added, vec![(1, (1, "first")), (2, (2, "x"))]);
    }

    #[test]
    fn failing_key_is_excluded_and_reported() {
        let mut registry = LifetimeRegistry::new();
        registry.insert(1_u32, ()).unwrap();
        registry.insert(2_u32, ()).unwrap();

        // The error carries the length of the rejected input.
        let parse = TryByKey(|s: &&str| s.parse::<u32>().map_err(|_| s.len()));
        let result = diff(&registry, ["2", "oops", "3"], &parse);

        assert_eq!(result.errors, vec![4]);
        assert_eq!(result.removed, vec![1]);
        assert_eq!(result.added, vec![(3, "3")]);
    }
}
