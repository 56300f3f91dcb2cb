//! Hash-to-bucket addressing and the capacity constants the map is built on.
//!
//! Capacity is always a power of two, so reducing a hash into
//! `[0, capacity)` is a mask with `capacity - 1`. Load-factor comparisons
//! are done in integers (`len * 4` against `capacity * 3` or `capacity`),
//! which is exact for the 0.25 / 0.75 thresholds.

use core::hash::{BuildHasher, Hash};

/// Bucket count of a map created with `new()` / `with_hasher()`.
pub const DEFAULT_CAPACITY: usize = 16;
/// Capacity never shrinks below this.
pub const MIN_CAPACITY: usize = 1;
/// Capacity is multiplied or divided by this on every resize.
pub const RESIZE_FACTOR: usize = 2;
pub const MIN_LOAD_FACTOR: f64 = 0.25;
pub const MAX_LOAD_FACTOR: f64 = 0.75;

/// Full hash of `key` under `hasher`.
#[inline]
pub fn hash_key<Q, S>(hasher: &S, key: &Q) -> u64
where
    Q: ?Sized + Hash,
    S: BuildHasher,
{
    hasher.hash_one(key)
}

/// Reduces a full hash into a bucket index. `capacity` must be a power of two.
#[inline]
pub fn bucket_of(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity.is_power_of_two());
    (hash as usize) & (capacity - 1)
}

#[inline]
pub fn load_factor(len: usize, capacity: usize) -> f64 {
    len as f64 / capacity as f64
}

/// `len / capacity > MAX_LOAD_FACTOR`
#[inline]
pub(crate) fn above_max_load(len: usize, capacity: usize) -> bool {
    len.saturating_mul(4) > capacity.saturating_mul(3)
}

/// `len / capacity < MIN_LOAD_FACTOR`
#[inline]
pub(crate) fn below_min_load(len: usize, capacity: usize) -> bool {
    len.saturating_mul(4) < capacity
}

/// Capacity for a bulk build of `count` raw input pairs: start at
/// `DEFAULT_CAPACITY` and double until the capacity is strictly greater
/// than `count` and `count` fits under the maximum load factor.
///
/// `count` is the raw input length, duplicates included.
pub fn presized_capacity(count: usize) -> usize {
    let mut capacity = DEFAULT_CAPACITY;
    while capacity <= count || above_max_load(count, capacity) {
        capacity *= RESIZE_FACTOR;
    }
    capacity
}
