//! Resize policy: when to grow or shrink the bucket array, and the rehash
//! that moves every entry into its bucket under the new capacity.

use crate::addressing::{
    above_max_load, below_min_load, bucket_of, hash_key, MIN_CAPACITY, RESIZE_FACTOR,
};
use crate::bucket::{empty_buckets, Bucket};
use core::hash::{BuildHasher, Hash};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Resize {
    Grow,
    Shrink,
}

impl Resize {
    /// Checked once after a successful insert.
    pub fn after_insert(len: usize, capacity: usize) -> Option<Resize> {
        above_max_load(len, capacity).then_some(Resize::Grow)
    }

    /// Checked once after a successful erase.
    pub fn after_erase(len: usize, capacity: usize) -> Option<Resize> {
        (capacity > MIN_CAPACITY && below_min_load(len, capacity)).then_some(Resize::Shrink)
    }

    pub fn target(self, capacity: usize) -> usize {
        match self {
            Resize::Grow => capacity * RESIZE_FACTOR,
            Resize::Shrink => (capacity / RESIZE_FACTOR).max(MIN_CAPACITY),
        }
    }
}

/// Replaces `buckets` with `new_capacity` fresh chains and moves every
/// entry into `hash & (new_capacity - 1)`. Entries are moved, not cloned.
pub(crate) fn rehash<K, V, S>(buckets: &mut Vec<Bucket<K, V>>, new_capacity: usize, hasher: &S)
where
    K: Hash,
    S: BuildHasher,
{
    debug_assert!(new_capacity.is_power_of_two());
    let old = core::mem::replace(buckets, empty_buckets(new_capacity));
    for bucket in old {
        for entry in bucket.into_entries() {
            let i = bucket_of(hash_key(hasher, &entry.key), new_capacity);
            buckets[i].push_entry(entry);
        }
    }
}

/// Runs `kind` against `buckets` and returns the new capacity.
pub(crate) fn apply<K, V, S>(
    kind: Resize,
    buckets: &mut Vec<Bucket<K, V>>,
    len: usize,
    hasher: &S,
) -> usize
where
    K: Hash,
    S: BuildHasher,
{
    let old_capacity = buckets.len();
    let new_capacity = kind.target(old_capacity);
    rehash(buckets, new_capacity, hasher);
    log::debug!(
        "{:?}: capacity {} -> {} ({} entries)",
        kind,
        old_capacity,
        new_capacity,
        len
    );
    new_capacity
}
