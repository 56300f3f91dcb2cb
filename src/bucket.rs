//! Bucket store: one growable, unordered chain of owned entries per slot.

use core::borrow::Borrow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

/// A single chain. Order inside a chain carries no meaning: removal is
/// swap-with-last, so it reorders the remaining entries.
#[derive(Debug, Clone)]
pub(crate) struct Bucket<K, V> {
    entries: Vec<Entry<K, V>>,
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K, V> Bucket<K, V> {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub(crate) fn entry_at(&self, offset: usize) -> Option<&Entry<K, V>> {
        self.entries.get(offset)
    }

    pub(crate) fn position<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries.iter().position(|e| e.key.borrow() == q)
    }

    pub(crate) fn find<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries
            .iter()
            .find(|e| e.key.borrow() == q)
            .map(|e| &e.value)
    }

    pub(crate) fn find_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries
            .iter_mut()
            .find(|e| e.key.borrow() == q)
            .map(|e| &mut e.value)
    }

    /// Appends without checking for an existing key; callers probe first.
    /// Returns the offset of the new entry.
    #[inline]
    pub(crate) fn push(&mut self, key: K, value: V) -> usize {
        self.entries.push(Entry { key, value });
        self.entries.len() - 1
    }

    /// `offset` must come from `push` or `position` on this chain with no
    /// mutation in between.
    #[inline]
    pub(crate) fn value_mut_at(&mut self, offset: usize) -> &mut V {
        &mut self.entries[offset].value
    }

    /// Unlinks the entry for `q` by moving the last entry into its slot.
    pub(crate) fn swap_remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let i = self.position(q)?;
        let Entry { key, value } = self.entries.swap_remove(i);
        Some((key, value))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Appends an entry moved out of another chain during a rehash.
    #[inline]
    pub(crate) fn push_entry(&mut self, entry: Entry<K, V>) {
        self.entries.push(entry);
    }

    pub(crate) fn iter(&self) -> core::slice::Iter<'_, Entry<K, V>> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> core::slice::IterMut<'_, Entry<K, V>> {
        self.entries.iter_mut()
    }

    pub(crate) fn into_entries(self) -> std::vec::IntoIter<Entry<K, V>> {
        self.entries.into_iter()
    }
}

/// Allocates `capacity` empty chains.
pub(crate) fn empty_buckets<K, V>(capacity: usize) -> Vec<Bucket<K, V>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, Bucket::default);
    buckets
}
