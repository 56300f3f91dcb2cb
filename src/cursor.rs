//! Positions over the bucket array and the iterators built on them.
//!
//! A `Cursor` is `(bucket, offset)` plus a shared borrow of the bucket
//! array. It starts at the first non-empty bucket, walks each chain, then
//! skips empty buckets up to the end sentinel `(capacity, 0)`. Because it
//! borrows the map, any structural mutation ends its lifetime at compile
//! time.

use crate::bucket::{Bucket, Entry};
use crate::error::{MapError, Result};
use core::fmt;
use core::iter::FusedIterator;

pub struct Cursor<'a, K, V> {
    buckets: &'a [Bucket<K, V>],
    bucket: usize,
    offset: usize,
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) fn begin(buckets: &'a [Bucket<K, V>]) -> Self {
        let mut c = Self {
            buckets,
            bucket: 0,
            offset: 0,
        };
        c.skip_empty();
        c
    }

    pub(crate) fn end(buckets: &'a [Bucket<K, V>]) -> Self {
        Self {
            buckets,
            bucket: buckets.len(),
            offset: 0,
        }
    }

    fn skip_empty(&mut self) {
        while self.bucket < self.buckets.len() && self.buckets[self.bucket].is_empty() {
            self.bucket += 1;
        }
    }

    /// Bucket index of the current position; equals the capacity at the end.
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    /// Offset inside the current chain.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_end(&self) -> bool {
        self.bucket >= self.buckets.len()
    }

    /// The entry under the cursor, or `MapError::OutOfRange` at the end.
    pub fn get(&self) -> Result<(&'a K, &'a V)> {
        self.buckets
            .get(self.bucket)
            .and_then(|b| b.entry_at(self.offset))
            .map(|e| (&e.key, &e.value))
            .ok_or(MapError::OutOfRange)
    }

    /// Steps to the next live entry. A cursor at the end stays there.
    pub fn advance(&mut self) {
        if self.is_end() {
            return;
        }
        self.offset += 1;
        if self.offset >= self.buckets[self.bucket].len() {
            self.offset = 0;
            self.bucket += 1;
            self.skip_empty();
        }
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

/// Same map, same bucket, same offset.
impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.buckets, other.buckets)
            && self.bucket == other.bucket
            && self.offset == other.offset
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K, V> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("bucket", &self.bucket)
            .field("offset", &self.offset)
            .field("capacity", &self.buckets.len())
            .finish()
    }
}

/// Iterator over `(&K, &V)` driven by a `Cursor`.
pub struct Iter<'a, K, V> {
    cursor: Cursor<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(cursor: Cursor<'a, K, V>, len: usize) -> Self {
        Self {
            cursor,
            remaining: len,
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.cursor.get().ok()?;
        self.cursor.advance();
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in the same order as `Iter`.
pub struct IterMut<'a, K, V> {
    buckets: core::slice::IterMut<'a, Bucket<K, V>>,
    chain: core::slice::IterMut<'a, Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(buckets: &'a mut [Bucket<K, V>], len: usize) -> Self {
        Self {
            buckets: buckets.iter_mut(),
            chain: Default::default(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.chain.next() {
                self.remaining -= 1;
                return Some((&e.key, &mut e.value));
            }
            self.chain = self.buckets.next()?.iter_mut();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator; consumes the map.
pub struct IntoIter<K, V> {
    buckets: std::vec::IntoIter<Bucket<K, V>>,
    chain: std::vec::IntoIter<Entry<K, V>>,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(buckets: Vec<Bucket<K, V>>, len: usize) -> Self {
        Self {
            buckets: buckets.into_iter(),
            chain: Vec::new().into_iter(),
            remaining: len,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(Entry { key, value }) = self.chain.next() {
                self.remaining -= 1;
                return Some((key, value));
            }
            self.chain = self.buckets.next()?.into_entries();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
