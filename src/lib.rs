//! chained-hashmap: a separate-chaining hash map with power-of-two
//! capacity, automatic grow/shrink, and an explicit cursor.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small, predictable map whose resize behavior is fully
//!   determined by its length and capacity, built in layers that can be
//!   tested on their own.
//! - Layers:
//!   - `addressing`: hash-to-bucket masking, capacity constants, and the
//!     integer load-factor checks.
//!   - `bucket`: one owned, unordered chain per slot; swap-remove erase.
//!   - `resize`: grow/shrink decisions and the rehash that moves entries.
//!   - `ChainedHashMap<K, V, S>`: the public map; probes under a
//!     debug-only guard and resizes at most once per mutating call.
//!   - `cursor`: a `(bucket, offset)` position over the bucket array, and
//!     the iterators built on it.
//!   - `spam`: a phrase-score classifier built on the map, driven by the
//!     `spam-detector` binary.
//!
//! Constraints
//! - Capacity is always a power of two and never below `MIN_CAPACITY`.
//! - After any insert, `len / capacity <= MAX_LOAD_FACTOR`.
//! - A successful erase halves the capacity iff `len * 4 < capacity` and
//!   `capacity > MIN_CAPACITY`. Each call resizes at most once, so the load
//!   can stay below `MIN_LOAD_FACTOR` (one key erased from 16 buckets
//!   leaves 0 / 8).
//! - Each key is stored at most once; `insert` never overwrites.
//!
//! Reentrancy policy
//! - Probing and rehashing call `K: Hash + Eq`. A key impl that reaches
//!   back into the same map during one of those sections panics in debug
//!   builds (`ProbeGuard`). Release builds carry no check.
//!
//! Iteration
//! - Buckets in index order, each chain in storage order. Any resize
//!   redistributes entries; erase reorders within a chain. Cursors borrow
//!   the map, so a mutation cannot happen while one is alive.
//!
//! Notes and non-goals
//! - Single-threaded: no interior locking, the map is `!Sync`.
//! - No insertion-order preservation, no open addressing, no
//!   user-tunable load factors.

pub mod addressing;
mod bucket;
mod chained_hash_map;
mod chained_hash_map_proptest;
pub mod cursor;
pub mod error;
mod probe_guard;
pub mod resize;
pub mod spam;

// Public surface
pub use addressing::{
    DEFAULT_CAPACITY, MAX_LOAD_FACTOR, MIN_CAPACITY, MIN_LOAD_FACTOR, RESIZE_FACTOR,
};
pub use chained_hash_map::ChainedHashMap;
pub use cursor::{Cursor, IntoIter, Iter, IterMut, Keys, Values};
pub use error::{MapError, Result};
pub use probe_guard::{ProbeGuard, ProbeScope};
pub use resize::Resize;
