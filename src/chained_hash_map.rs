//! ChainedHashMap: the public map over the bucket store and resize policy.

use crate::addressing::{bucket_of, hash_key, load_factor, presized_capacity, DEFAULT_CAPACITY};
use crate::bucket::{empty_buckets, Bucket};
use crate::cursor::{Cursor, IntoIter, Iter, IterMut, Keys, Values};
use crate::error::{MapError, Result};
use crate::probe_guard::ProbeGuard;
use crate::resize::{self, Resize};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Bucket array plus live-entry count. Kept apart from the hasher and the
/// probe guard so a public method can hold the guard while mutating this.
#[derive(Clone)]
pub(crate) struct Table<K, V> {
    pub(crate) buckets: Vec<Bucket<K, V>>,
    pub(crate) len: usize,
}

impl<K, V> Table<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            buckets: empty_buckets(capacity),
            len: 0,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn clear(&mut self) {
        for b in &mut self.buckets {
            b.clear();
        }
        self.len = 0;
    }
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash,
{
    #[inline]
    fn slot<Q, S>(&self, hasher: &S, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
        S: BuildHasher,
    {
        bucket_of(hash_key(hasher, q), self.capacity())
    }

    fn get<Q, S>(&self, hasher: &S, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        S: BuildHasher,
    {
        self.buckets[self.slot(hasher, q)].find(q)
    }

    fn get_mut<Q, S>(&mut self, hasher: &S, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        S: BuildHasher,
    {
        let i = self.slot(hasher, q);
        self.buckets[i].find_mut(q)
    }

    /// Appends a key the caller has just probed as absent and returns its
    /// `(bucket, offset)`. The grow check runs against `len + 1` before the
    /// push: the same decision as checking after it, but the new entry's
    /// position stays known.
    fn push_new<S>(&mut self, hasher: &S, hash: u64, key: K, value: V) -> (usize, usize)
    where
        S: BuildHasher,
    {
        if let Some(kind) = Resize::after_insert(self.len + 1, self.capacity()) {
            resize::apply(kind, &mut self.buckets, self.len, hasher);
        }
        let i = bucket_of(hash, self.capacity());
        let offset = self.buckets[i].push(key, value);
        self.len += 1;
        (i, offset)
    }

    fn insert<S>(&mut self, hasher: &S, key: K, value: V) -> bool
    where
        S: BuildHasher,
    {
        let hash = hash_key(hasher, &key);
        let i = bucket_of(hash, self.capacity());
        if self.buckets[i].position(&key).is_some() {
            return false;
        }
        self.push_new(hasher, hash, key, value);
        true
    }

    fn get_or_insert_with<S, F>(&mut self, hasher: &S, key: K, default: F) -> &mut V
    where
        S: BuildHasher,
        F: FnOnce() -> V,
    {
        let hash = hash_key(hasher, &key);
        let i = bucket_of(hash, self.capacity());
        let (i, offset) = match self.buckets[i].position(&key) {
            Some(offset) => (i, offset),
            None => self.push_new(hasher, hash, key, default()),
        };
        self.buckets[i].value_mut_at(offset)
    }

    fn remove<Q, S>(&mut self, hasher: &S, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        S: BuildHasher,
    {
        let i = self.slot(hasher, q);
        let removed = self.buckets[i].swap_remove(q)?;
        self.len -= 1;
        if let Some(kind) = Resize::after_erase(self.len, self.capacity()) {
            resize::apply(kind, &mut self.buckets, self.len, hasher);
        }
        Some(removed)
    }

    /// Bulk build: capacity is fixed up front from the raw pair count, and a
    /// repeated key replaces the earlier pair.
    fn from_parallel<S>(hasher: &S, keys: Vec<K>, values: Vec<V>) -> Self
    where
        S: BuildHasher,
    {
        let mut table = Self::with_capacity(presized_capacity(keys.len()));
        table.len = keys.len();
        for (key, value) in keys.into_iter().zip(values) {
            let i = table.slot(hasher, &key);
            if table.buckets[i].swap_remove(&key).is_some() {
                table.len -= 1;
            }
            table.buckets[i].push(key, value);
        }
        log::trace!(
            "bulk build: capacity {} for {} live entries",
            table.capacity(),
            table.len
        );
        table
    }
}

/// A separate-chaining hash map with power-of-two capacity.
///
/// Capacity doubles when an insert pushes the load factor above 0.75 and
/// halves when an erase drops it below 0.25 (never below one bucket). Each
/// mutating call resizes at most once.
///
/// Iteration visits buckets in index order and each chain in storage order.
/// That order is neither insertion order nor stable across mutation:
/// resizes redistribute entries and erase swap-removes within a chain.
pub struct ChainedHashMap<K, V, S = RandomState> {
    hasher: S,
    pub(crate) table: Table<K, V>,
    probe: ProbeGuard,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Empty map with `DEFAULT_CAPACITY` buckets.
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Builds a map from parallel key and value sequences.
    ///
    /// Capacity is the smallest power of two (starting from
    /// `DEFAULT_CAPACITY`) that exceeds `keys.len()` and keeps
    /// `keys.len()` under the maximum load factor. The estimate uses the raw
    /// length, so inputs with many repeated keys end up with a lower load
    /// factor. When a key repeats, the later value wins.
    pub fn from_parallel(keys: Vec<K>, values: Vec<V>) -> Result<Self> {
        Self::from_parallel_with_hasher(keys, values, Default::default())
    }
}

impl<K, V> Default for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            table: Table::with_capacity(DEFAULT_CAPACITY),
            probe: ProbeGuard::new(),
        }
    }

    pub fn from_parallel_with_hasher(keys: Vec<K>, values: Vec<V>, hasher: S) -> Result<Self> {
        if keys.len() != values.len() {
            return Err(MapError::MismatchedInput {
                keys: keys.len(),
                values: values.len(),
            });
        }
        let table = Table::from_parallel(&hasher, keys, values);
        Ok(Self {
            hasher,
            table,
            probe: ProbeGuard::new(),
        })
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.table.len
    }

    pub fn is_empty(&self) -> bool {
        self.table.len == 0
    }

    /// Number of buckets. Always a power of two.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        load_factor(self.table.len, self.table.capacity())
    }

    /// Adds `key -> value` if `key` is absent. Returns `false`, leaving the
    /// map untouched, when the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let _p = self.probe.enter();
        self.table.insert(&self.hasher, key, value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _p = self.probe.enter();
        self.table.get(&self.hasher, q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _p = self.probe.enter();
        self.table.get(&self.hasher, q)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _p = self.probe.enter();
        self.table.get_mut(&self.hasher, q)
    }

    /// Value for `q`, or `MapError::KeyNotFound`.
    pub fn at<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(MapError::KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_mut(q).ok_or(MapError::KeyNotFound)
    }

    /// Read-write index access: the value for `key`, inserting
    /// `V::default()` first when the key is absent (which may grow the map).
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let _p = self.probe.enter();
        self.table.get_or_insert_with(&self.hasher, key, default)
    }

    /// Read-only index access: a copy of the value for `q`, or
    /// `V::default()` when absent. Never inserts.
    pub fn get_or_default<Q>(&self, q: &Q) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone + Default,
    {
        self.get(q).cloned().unwrap_or_default()
    }

    /// Removes `q` and returns its value. May halve the capacity.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _p = self.probe.enter();
        self.table.remove(&self.hasher, q)
    }

    /// Returns whether `q` was present. An absent key leaves size, capacity
    /// and contents unchanged.
    pub fn erase<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).is_some()
    }

    /// Drops every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Length of the chain holding `q`.
    pub fn bucket_size<Q>(&self, q: &Q) -> Result<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.bucket_index(q)?;
        Ok(self.table.buckets[i].len())
    }

    /// Index of the chain holding `q`.
    pub fn bucket_index<Q>(&self, q: &Q) -> Result<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _p = self.probe.enter();
        let i = self.table.slot(&self.hasher, q);
        match self.table.buckets[i].position(q) {
            Some(_) => Ok(i),
            None => Err(MapError::KeyNotFound),
        }
    }
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    /// Cursor at the first live entry, or at the end if the map is empty.
    pub fn cursor(&self) -> Cursor<'_, K, V> {
        Cursor::begin(&self.table.buckets)
    }

    /// The end sentinel.
    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        Cursor::end(&self.table.buckets)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.cursor(), self.table.len)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.table.buckets, self.table.len)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }
}

impl<K, V, S> Clone for ChainedHashMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            table: self.table.clone(),
            probe: ProbeGuard::new(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if core::ptr::eq(self, source) {
            return;
        }
        // Clone first: a panicking K/V clone must leave `self` intact.
        let table = source.table.clone();
        let hasher = source.hasher.clone();
        self.table = table;
        self.hasher = hasher;
    }
}

impl<K, V, S> PartialEq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    /// Same length and every key maps to an equal value in `other`.
    /// Bucket layout and iteration order are irrelevant.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for ChainedHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.table.buckets, self.table.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::{MAX_LOAD_FACTOR, MIN_CAPACITY, MIN_LOAD_FACTOR};
    use std::collections::BTreeSet;

    // Every key lands in bucket 0: worst-case chains.
    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }

    fn assert_layout<K: Eq + Hash, V, S: BuildHasher>(m: &ChainedHashMap<K, V, S>) {
        assert!(m.capacity().is_power_of_two());
        assert!(m.capacity() >= MIN_CAPACITY);
        let mut total = 0;
        for (i, b) in m.table.buckets.iter().enumerate() {
            for e in b.iter() {
                assert_eq!(m.table.slot(m.hasher(), &e.key), i);
                total += 1;
            }
        }
        assert_eq!(total, m.len());
    }

    /// Invariant: a fresh map is empty with the default capacity.
    #[test]
    fn new_map_is_empty_with_default_capacity() {
        let m: ChainedHashMap<String, i32> = ChainedHashMap::new();
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
        assert_eq!(m.capacity(), DEFAULT_CAPACITY);
        assert_eq!(m.load_factor(), 0.0);
        assert!(m.iter().next().is_none());
    }

    /// Invariant: a duplicate insert returns false and does not overwrite.
    #[test]
    fn duplicate_insert_rejected() {
        let mut m: ChainedHashMap<String, i32> = ChainedHashMap::new();
        assert!(m.insert("dup".to_string(), 1));
        assert!(!m.insert("dup".to_string(), 2));
        assert_eq!(m.at("dup"), Ok(&1));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: `at` and `get` agree; absent keys are `KeyNotFound`.
    #[test]
    fn at_and_get_parity() {
        let mut m: ChainedHashMap<String, i32> = ChainedHashMap::new();
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            m.insert((*k).to_string(), i as i32);
        }
        for k in ["a", "b", "c"] {
            assert_eq!(m.at(k).ok(), m.get(k));
            assert!(m.contains_key(k));
        }
        for k in ["x", "y"] {
            assert_eq!(m.at(k), Err(MapError::KeyNotFound));
            assert!(m.get(k).is_none());
            assert!(!m.contains_key(k));
        }
    }

    #[test]
    fn at_mut_updates_in_place() {
        let mut m: ChainedHashMap<&'static str, i32> = ChainedHashMap::new();
        m.insert("k", 10);
        *m.at_mut(&"k").unwrap() += 5;
        assert_eq!(m.at(&"k"), Ok(&15));
        assert_eq!(m.at_mut(&"missing"), Err(MapError::KeyNotFound));
    }

    /// Invariant: index access inserts a default value once, then returns the
    /// stored value on later calls.
    #[test]
    fn get_or_insert_default_inserts_once() {
        let mut m: ChainedHashMap<String, i32> = ChainedHashMap::new();
        *m.get_or_insert_default("hits".to_string()) += 1;
        *m.get_or_insert_default("hits".to_string()) += 1;
        assert_eq!(m.at("hits"), Ok(&2));
        assert_eq!(m.len(), 1);
        assert_eq!(*m.get_or_insert_default("zero".to_string()), 0);
        assert_eq!(m.len(), 2);
    }

    /// Index access that crosses the grow threshold still hands back the
    /// reference to the new entry.
    #[test]
    fn get_or_insert_default_across_grow() {
        let mut m: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        for k in 0..12 {
            m.insert(k, k);
        }
        assert_eq!(m.capacity(), 16);
        *m.get_or_insert_default(99) = 7;
        assert_eq!(m.capacity(), 32);
        assert_eq!(m.at(&99), Ok(&7));
        assert_layout(&m);
    }

    #[test]
    fn get_or_default_never_inserts() {
        let mut m: ChainedHashMap<&'static str, i32> = ChainedHashMap::new();
        m.insert("a", 4);
        assert_eq!(m.get_or_default(&"a"), 4);
        assert_eq!(m.get_or_default(&"b"), 0);
        assert_eq!(m.len(), 1);
        assert!(!m.contains_key(&"b"));
    }

    /// Scenario: 13 distinct keys into a fresh map never exceed 0.75 and grow
    /// once the 13th key arrives.
    #[test]
    fn thirteen_inserts_grow_once() {
        let mut m: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        for k in 0..13u32 {
            assert!(m.insert(k, k * 2));
            assert!(m.load_factor() <= MAX_LOAD_FACTOR);
            if k < 12 {
                assert_eq!(m.capacity(), 16);
            }
        }
        assert_eq!(m.capacity(), 32);
        assert_eq!(m.len(), 13);
        assert_layout(&m);
    }

    /// Invariant: erasing an absent key changes nothing.
    #[test]
    fn erase_absent_is_noop() {
        let mut m: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        for k in 0..5 {
            m.insert(k, k);
        }
        let before = m.clone();
        let cap = m.capacity();
        assert!(!m.erase(&42));
        assert_eq!(m.len(), 5);
        assert_eq!(m.capacity(), cap);
        assert!(m == before);
    }

    /// Invariant: erases shrink by halving while load drops below 0.25, down
    /// to a single bucket.
    #[test]
    fn erase_shrinks_to_minimum() {
        let mut m: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        for k in 0..4 {
            m.insert(k, k);
        }
        assert_eq!(m.capacity(), 16);
        assert!(m.erase(&0)); // 3/16 < 0.25
        assert_eq!(m.capacity(), 8);
        assert!(m.erase(&1)); // 2/8 == 0.25
        assert_eq!(m.capacity(), 8);
        assert!(m.erase(&2)); // 1/8
        assert_eq!(m.capacity(), 4);
        assert!(m.erase(&3)); // 0/4
        assert_eq!(m.capacity(), 2);
        assert!(m.is_empty());
        assert_layout(&m);

        // one more insert/erase pair walks down to the floor
        m.insert(7, 7);
        assert!(m.erase(&7));
        assert_eq!(m.capacity(), 1);
        m.insert(8, 8);
        assert_eq!(m.capacity(), 2); // 1/1 > 0.75
        assert!(m.erase(&8));
        assert_eq!(m.capacity(), 1);
        assert!(m.load_factor() < MIN_LOAD_FACTOR);
    }

    #[test]
    fn remove_returns_value_and_entry() {
        let mut m: ChainedHashMap<String, i32> = ChainedHashMap::new();
        m.insert("a".to_string(), 1);
        m.insert("b".to_string(), 2);
        assert_eq!(m.remove("a"), Some(1));
        assert_eq!(m.remove("a"), None);
        assert_eq!(m.remove_entry("b"), Some(("b".to_string(), 2)));
        assert!(m.is_empty());
    }

    /// Invariant: clear drops entries but keeps the capacity.
    #[test]
    fn clear_keeps_capacity() {
        let mut m: ChainedHashMap<u32, String> = ChainedHashMap::new();
        for k in 0..40 {
            m.insert(k, k.to_string());
        }
        let cap = m.capacity();
        m.clear();
        assert_eq!(m.len(), 0);
        assert_eq!(m.capacity(), cap);
        assert!(m.iter().next().is_none());
        assert!(!m.contains_key(&3));
        assert!(m.insert(3, "three".to_string()));
    }

    #[test]
    fn bucket_diagnostics() {
        let mut m: ChainedHashMap<String, i32, ConstBuildHasher> =
            ChainedHashMap::with_hasher(ConstBuildHasher);
        m.insert("a".to_string(), 1);
        m.insert("b".to_string(), 2);
        m.insert("c".to_string(), 3);
        assert_eq!(m.bucket_index("a"), Ok(0));
        assert_eq!(m.bucket_size("b"), Ok(3));
        assert_eq!(m.bucket_index("zz"), Err(MapError::KeyNotFound));
        assert_eq!(m.bucket_size("zz"), Err(MapError::KeyNotFound));

        let mut r: ChainedHashMap<u64, u64> = ChainedHashMap::new();
        for k in 0..100 {
            r.insert(k, k);
        }
        for k in 0..100 {
            let i = r.bucket_index(&k).unwrap();
            assert!(i < r.capacity());
            assert!(r.bucket_size(&k).unwrap() >= 1);
        }
    }

    /// Swap-remove reorders a chain: with every key in one bucket, erasing
    /// the first key moves the last key to the front of iteration.
    #[test]
    fn erase_reorders_chain_by_swap_remove() {
        let mut m: ChainedHashMap<&'static str, i32, ConstBuildHasher> =
            ChainedHashMap::with_hasher(ConstBuildHasher);
        for (i, k) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            m.insert(k, i as i32);
        }
        let order: Vec<_> = m.keys().copied().collect();
        assert_eq!(order, vec!["a", "b", "c", "d", "e"]);
        assert!(m.erase(&"a"));
        let order: Vec<_> = m.keys().copied().collect();
        assert_eq!(order, vec!["e", "b", "c", "d"]);
    }

    /// Scenario: later duplicates overwrite; count drops once per duplicate.
    #[test]
    fn from_parallel_last_duplicate_wins() {
        let m = ChainedHashMap::from_parallel(vec!["a", "b", "a"], vec![1, 2, 3]).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.at(&"a"), Ok(&3));
        assert_eq!(m.at(&"b"), Ok(&2));
        assert_eq!(m.capacity(), 16);
        assert_layout(&m);
    }

    #[test]
    fn from_parallel_rejects_mismatched_lengths() {
        let r = ChainedHashMap::from_parallel(vec![1, 2, 3], vec!["x", "y"]);
        assert_eq!(
            r.err(),
            Some(MapError::MismatchedInput { keys: 3, values: 2 })
        );
    }

    /// Capacity comes from the raw length, duplicates included.
    #[test]
    fn from_parallel_sizes_from_raw_length() {
        let keys: Vec<u32> = (0..30).map(|i| i % 3).collect();
        let values: Vec<u32> = (0..30).collect();
        let m = ChainedHashMap::from_parallel(keys, values).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.capacity(), 64);
        assert_eq!(m.at(&0), Ok(&27));
        assert_eq!(m.at(&1), Ok(&28));
        assert_eq!(m.at(&2), Ok(&29));
    }

    #[test]
    fn from_parallel_empty() {
        let m: ChainedHashMap<u8, u8> = ChainedHashMap::from_parallel(vec![], vec![]).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), DEFAULT_CAPACITY);
    }

    /// Invariant: equality ignores insertion order and resize history.
    #[test]
    fn equality_is_layout_independent() {
        let mut a: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        let mut b: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        for k in 0..40 {
            a.insert(k, k + 1);
        }
        for k in (0..200).rev() {
            b.insert(k, k + 1);
        }
        for k in 40..200 {
            b.erase(&k);
        }
        // grown to 64 vs. shrunk back to 128
        assert_eq!(a.capacity(), 64);
        assert_eq!(b.capacity(), 128);
        assert!(a == b);

        *b.at_mut(&7).unwrap() = 0;
        assert!(a != b);
        *b.at_mut(&7).unwrap() = 8;
        b.erase(&7);
        assert!(a != b);
    }

    /// Invariant: clones are deep and independent.
    #[test]
    fn clone_is_independent() {
        let mut original: ChainedHashMap<String, Vec<i32>> = ChainedHashMap::new();
        original.insert("a".to_string(), vec![1]);
        original.insert("b".to_string(), vec![2]);

        let mut copy = original.clone();
        assert!(copy == original);
        assert_eq!(copy.capacity(), original.capacity());

        copy.at_mut("a").unwrap().push(10);
        copy.insert("c".to_string(), vec![3]);
        assert_eq!(original.at("a"), Ok(&vec![1]));
        assert!(!original.contains_key("c"));

        original.erase("b");
        assert!(copy.contains_key("b"));
    }

    #[test]
    fn clone_from_replaces_contents() {
        let mut src: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        for k in 0..20 {
            src.insert(k, k);
        }
        let mut dst: ChainedHashMap<u32, u32> = ChainedHashMap::new();
        dst.insert(1000, 1);
        dst.clone_from(&src);
        assert!(dst == src);
        assert!(!dst.contains_key(&1000));
        assert_eq!(dst.capacity(), src.capacity());
    }

    /// A clone that panics part-way leaves the destination usable.
    #[test]
    fn clone_from_panic_keeps_destination() {
        struct Fragile(bool);
        impl Clone for Fragile {
            fn clone(&self) -> Self {
                assert!(!self.0, "fragile value cloned");
                Fragile(false)
            }
        }

        let mut src: ChainedHashMap<u32, Fragile> = ChainedHashMap::new();
        for k in 0..20 {
            src.insert(k, Fragile(k == 19));
        }
        let mut dst: ChainedHashMap<u32, Fragile> = ChainedHashMap::new();
        for k in 100..105 {
            dst.insert(k, Fragile(false));
        }
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            dst.clone_from(&src);
        }));
        assert!(res.is_err());

        assert_eq!(dst.len(), 5);
        assert_eq!(dst.capacity(), DEFAULT_CAPACITY);
        assert!(dst.contains_key(&100));
        assert!(!dst.contains_key(&0));
        assert!(dst.insert(7, Fragile(false)));
        assert!(dst.erase(&100));
        assert_eq!(dst.iter().count(), dst.len());
        assert_layout(&dst);
    }

    /// Invariant: iteration yields each entry once; iter_mut writes persist.
    #[test]
    fn iteration_and_mutation() {
        let mut m: ChainedHashMap<String, i32> = ChainedHashMap::new();
        let keys = ["k1", "k2", "k3"];
        for (i, k) in keys.iter().enumerate() {
            m.insert((*k).to_string(), i as i32);
        }
        let seen: BTreeSet<String> = m.iter().map(|(k, _)| k.clone()).collect();
        let expected: BTreeSet<String> = keys.iter().map(|s| (*s).to_string()).collect();
        assert_eq!(seen, expected);

        for (_k, v) in m.iter_mut() {
            *v += 10;
        }
        assert_eq!(m.at("k1"), Ok(&10));
        assert_eq!(m.at("k2"), Ok(&11));
        assert_eq!(m.at("k3"), Ok(&12));

        for (_k, v) in &mut m {
            *v *= 2;
        }
        let total: i32 = m.values().sum();
        assert_eq!(total, 66);

        let mut owned: Vec<(String, i32)> = m.into_iter().collect();
        owned.sort();
        assert_eq!(owned[0], ("k1".to_string(), 20));
        assert_eq!(owned.len(), 3);
    }

    #[test]
    fn debug_renders_as_map() {
        let mut m: ChainedHashMap<&'static str, i32> = ChainedHashMap::new();
        m.insert("k", 1);
        assert_eq!(format!("{:?}", m), r#"{"k": 1}"#);
    }

    /// Invariant (debug-only): a key whose `Eq` reaches back into the map
    /// during a probe panics instead of observing a half-updated table.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_probe() {
        use std::cell::Cell;

        struct ReentryKey {
            id: &'static str,
            map: Cell<*const ChainedHashMap<ReentryKey, i32, ConstBuildHasher>>,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                let m = other.map.get();
                if !m.is_null() {
                    // Re-enter the map that is probing right now.
                    let _ = unsafe { &*m }.contains_key(self);
                }
                self.id == other.id
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        let mut m: ChainedHashMap<ReentryKey, i32, ConstBuildHasher> =
            ChainedHashMap::with_hasher(ConstBuildHasher);
        m.insert(
            ReentryKey {
                id: "a",
                map: Cell::new(core::ptr::null()),
            },
            1,
        );
        let query = ReentryKey {
            id: "b",
            map: Cell::new(&m as *const _),
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = m.contains_key(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
