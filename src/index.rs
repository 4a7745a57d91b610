use core::fmt;
use core::ops::RangeBounds;

use crate::capability::Capabilities;
use crate::error::InsertError;
use crate::raw::{ORDER, RawIndex};

mod capacity;
mod iter;

pub use iter::{Iter, Range};

/// An ordered index of records, stored in a B+ tree.
///
/// Records live in the leaves, which are chained left to right in ascending
/// key order; internal nodes hold copies of keys that route searches. The
/// index knows nothing about the records themselves: comparison, key
/// extraction, key copying and release all go through the [`Capabilities`]
/// value given to [`new`](BPlusIndex::new).
///
/// Each key is stored at most once. Records are never removed one at a time;
/// they are updated in place through [`get_mut`](BPlusIndex::get_mut) and
/// friends, and all released together by [`destroy`](BPlusIndex::destroy) or
/// when the index is dropped.
///
/// It is a logic error to change a record's key while it is in the index,
/// for example through [`get_mut`](BPlusIndex::get_mut). The behavior
/// resulting from such a logic error is not specified, but will be
/// encapsulated to the `BPlusIndex` that observed it and not result in
/// undefined behavior.
///
/// # Examples
///
/// ```
/// use bplus_index::{BPlusIndex, Keyed, NaturalOrder};
///
/// #[derive(Debug)]
/// struct Slot {
///     id: u32,
///     vacant: bool,
///     revenue: u32,
/// }
///
/// impl Keyed for Slot {
///     type Key = u32;
///     fn key(&self) -> &u32 { &self.id }
/// }
///
/// let mut slots = BPlusIndex::new(NaturalOrder::<Slot>::new());
/// for id in 1..=50 {
///     slots.insert(Slot { id, vacant: true, revenue: 0 }).unwrap();
/// }
///
/// // Take the first vacant slot between 21 and 30.
/// let slot = slots.first_match_mut(21..=30, |s| s.vacant).unwrap();
/// slot.vacant = false;
/// slot.revenue += 100;
///
/// assert!(!slots.get(&21).unwrap().vacant);
/// assert_eq!(slots.first_match(21..=30, |s| s.vacant).map(|s| s.id), Some(22));
///
/// // Walk everything in key order.
/// let total: u32 = slots.iter().map(|s| s.revenue).sum();
/// assert_eq!(total, 100);
/// ```
pub struct BPlusIndex<C: Capabilities> {
    raw: RawIndex<C>,
}

impl<C: Capabilities> BPlusIndex<C> {
    /// Maximum fanout of an internal node. Nodes hold at most `ORDER - 1` keys.
    pub const ORDER: usize = ORDER;

    /// Makes a new, empty index over the records described by `capabilities`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{BPlusIndex, Keyed, NaturalOrder};
    ///
    /// struct Slot { id: u32 }
    /// impl Keyed for Slot {
    ///     type Key = u32;
    ///     fn key(&self) -> &u32 { &self.id }
    /// }
    ///
    /// let index = BPlusIndex::new(NaturalOrder::<Slot>::new());
    /// assert!(index.is_empty());
    /// ```
    #[must_use]
    pub const fn new(capabilities: C) -> Self {
        BPlusIndex {
            raw: RawIndex::new(capabilities),
        }
    }

    /// Returns the capability set this index was built with.
    #[must_use]
    pub fn capabilities(&self) -> &C {
        self.raw.capabilities()
    }

    /// Returns the number of records in the index.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the index holds no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the number of levels between the root and the leaves,
    /// counting both. An empty index has height 0; a single leaf has height 1.
    ///
    /// Every leaf is at this depth.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Adds a record to the index.
    ///
    /// On success the index owns the record until it is released by
    /// [`destroy`](BPlusIndex::destroy) or drop.
    ///
    /// # Errors
    ///
    /// - [`IndexError::DuplicateKey`](crate::IndexError::DuplicateKey) if a
    ///   record with an equal key is already present.
    /// - [`IndexError::AllocationFailure`](crate::IndexError::AllocationFailure)
    ///   or [`IndexError::CapacityExceeded`](crate::IndexError::CapacityExceeded)
    ///   if the index cannot grow.
    ///
    /// In every case the index is left exactly as it was and the record is
    /// returned inside the error.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{BPlusIndex, Keyed, NaturalOrder};
    ///
    /// #[derive(Debug)]
    /// struct Slot { id: u32 }
    /// impl Keyed for Slot {
    ///     type Key = u32;
    ///     fn key(&self) -> &u32 { &self.id }
    /// }
    ///
    /// let mut index = BPlusIndex::new(NaturalOrder::<Slot>::new());
    /// assert!(index.insert(Slot { id: 37 }).is_ok());
    /// assert!(index.insert(Slot { id: 37 }).unwrap_err().is_duplicate());
    /// assert_eq!(index.len(), 1);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, record: C::Record) -> Result<(), InsertError<C::Record>> {
        self.raw.insert(record)
    }

    /// Inserts every record from `records`, stopping at the first rejection.
    ///
    /// Returns how many records were inserted. Records before the rejected one
    /// stay in the index; records after it are not consumed from the iterator.
    ///
    /// # Errors
    ///
    /// Returns the first [`InsertError`], carrying the rejected record.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{BPlusIndex, Keyed, NaturalOrder};
    ///
    /// #[derive(Debug)]
    /// struct Slot { id: u32 }
    /// impl Keyed for Slot {
    ///     type Key = u32;
    ///     fn key(&self) -> &u32 { &self.id }
    /// }
    ///
    /// let mut index = BPlusIndex::new(NaturalOrder::<Slot>::new());
    /// let loaded = index.try_extend((1..=20).map(|id| Slot { id })).unwrap();
    /// assert_eq!(loaded, 20);
    ///
    /// let err = index.try_extend([Slot { id: 21 }, Slot { id: 5 }, Slot { id: 22 }]).unwrap_err();
    /// assert_eq!(err.record().id, 5);
    /// assert_eq!(index.len(), 21);
    /// ```
    pub fn try_extend<I>(&mut self, records: I) -> Result<usize, InsertError<C::Record>>
    where
        I: IntoIterator<Item = C::Record>,
    {
        let mut inserted = 0;
        for record in records {
            self.raw.insert(record)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Returns the record whose key equals `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{BPlusIndex, Keyed, NaturalOrder};
    ///
    /// struct Slot { id: u32 }
    /// impl Keyed for Slot {
    ///     type Key = u32;
    ///     fn key(&self) -> &u32 { &self.id }
    /// }
    ///
    /// let mut index = BPlusIndex::new(NaturalOrder::<Slot>::new());
    /// index.insert(Slot { id: 1 }).ok();
    /// assert_eq!(index.get(&1).map(|s| s.id), Some(1));
    /// assert!(index.get(&2).is_none());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn get(&self, key: &C::Key) -> Option<&C::Record> {
        let handle = self.raw.search(key)?;
        Some(self.raw.record(handle))
    }

    /// Returns the record whose key equals `key`, for in-place updates.
    ///
    /// The record's key must not be changed.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn get_mut(&mut self, key: &C::Key) -> Option<&mut C::Record> {
        let handle = self.raw.search(key)?;
        Some(self.raw.record_mut(handle))
    }

    /// Returns `true` if a record with this key is indexed.
    #[must_use]
    pub fn contains_key(&self, key: &C::Key) -> bool {
        self.raw.search(key).is_some()
    }

    /// Returns the record with the smallest key.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn first(&self) -> Option<&C::Record> {
        self.iter().next()
    }

    /// Returns the record with the largest key.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn last(&self) -> Option<&C::Record> {
        let handle = self.raw.rightmost_record()?;
        Some(self.raw.record(handle))
    }

    /// Returns the first record, in key order, whose key lies in `range` and
    /// that satisfies `predicate`.
    ///
    /// The scan starts at the leaf covering the lower bound and walks the leaf
    /// chain until a match is found or the upper bound is passed.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{BPlusIndex, Keyed, NaturalOrder};
    ///
    /// struct Slot { id: u32, vacant: bool }
    /// impl Keyed for Slot {
    ///     type Key = u32;
    ///     fn key(&self) -> &u32 { &self.id }
    /// }
    ///
    /// let mut index = BPlusIndex::new(NaturalOrder::<Slot>::new());
    /// for id in 1..=10 {
    ///     index.insert(Slot { id, vacant: id > 7 }).ok();
    /// }
    /// assert_eq!(index.first_match(1..=10, |s| s.vacant).map(|s| s.id), Some(8));
    /// assert!(index.first_match(1..=7, |s| s.vacant).is_none());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n + m), where m is the number of records inspected.
    pub fn first_match<R, P>(&self, range: R, mut predicate: P) -> Option<&C::Record>
    where
        R: RangeBounds<C::Key>,
        P: FnMut(&C::Record) -> bool,
    {
        self.range(range).find(|record| predicate(*record))
    }

    /// Like [`first_match`](BPlusIndex::first_match), but returns the record
    /// for in-place updates.
    ///
    /// The record's key must not be changed.
    pub fn first_match_mut<R, P>(&mut self, range: R, mut predicate: P) -> Option<&mut C::Record>
    where
        R: RangeBounds<C::Key>,
        P: FnMut(&C::Record) -> bool,
    {
        let handle = self.raw.range_cursor(&range).find(|&handle| predicate(self.raw.record(handle)))?;
        Some(self.raw.record_mut(handle))
    }

    /// Gets an iterator over the records whose keys lie in `range`, in
    /// ascending key order.
    ///
    /// A range whose start lies above its end yields nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{BPlusIndex, Keyed, NaturalOrder};
    ///
    /// struct Slot { id: u32 }
    /// impl Keyed for Slot {
    ///     type Key = u32;
    ///     fn key(&self) -> &u32 { &self.id }
    /// }
    ///
    /// let mut index = BPlusIndex::new(NaturalOrder::<Slot>::new());
    /// index.try_extend((0..100).map(|id| Slot { id })).unwrap();
    ///
    /// let ids: Vec<u32> = index.range(40..45).map(|s| s.id).collect();
    /// assert_eq!(ids, [40, 41, 42, 43, 44]);
    /// assert_eq!(index.range(60..=50).count(), 0);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) to create the iterator; amortized O(1) per step.
    pub fn range<R>(&self, range: R) -> Range<'_, C>
    where
        R: RangeBounds<C::Key>,
    {
        Range::new(&self.raw, self.raw.range_cursor(&range))
    }

    /// Gets an iterator over every record in ascending key order.
    ///
    /// The iterator starts from the root each time it is created.
    ///
    /// # Complexity
    ///
    /// O(log n) to create the iterator; amortized O(1) per step via the leaf chain.
    pub fn iter(&self) -> Iter<'_, C> {
        Iter::new(&self.raw, self.raw.cursor())
    }

    /// Calls `visit` on every record in ascending key order.
    pub fn traverse<F>(&self, visit: F)
    where
        F: FnMut(&C::Record),
    {
        self.iter().for_each(visit);
    }

    /// Calls `visit` on every record in ascending key order, allowing in-place
    /// updates.
    ///
    /// Records' keys must not be changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{BPlusIndex, Keyed, NaturalOrder};
    ///
    /// struct Slot { id: u32, revenue: u32 }
    /// impl Keyed for Slot {
    ///     type Key = u32;
    ///     fn key(&self) -> &u32 { &self.id }
    /// }
    ///
    /// let mut index = BPlusIndex::new(NaturalOrder::<Slot>::new());
    /// index.try_extend((1..=3).map(|id| Slot { id, revenue: 10 })).unwrap();
    /// index.traverse_mut(|s| s.revenue *= 2);
    /// assert_eq!(index.iter().map(|s| s.revenue).sum::<u32>(), 60);
    /// ```
    pub fn traverse_mut<F>(&mut self, visit: F)
    where
        F: FnMut(&mut C::Record),
    {
        self.raw.for_each_mut(visit);
    }

    /// Releases every record and every internal key copy through the
    /// capability set, leaving an empty index that can be filled again.
    ///
    /// Dropping the index does the same.
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn destroy(&mut self) {
        self.raw.destroy();
    }
}

impl<C: Capabilities> Drop for BPlusIndex<C> {
    fn drop(&mut self) {
        self.raw.destroy();
    }
}

impl<C: Capabilities + Default> Default for BPlusIndex<C> {
    /// Creates an empty index with the default capability set.
    fn default() -> Self {
        BPlusIndex::new(C::default())
    }
}

impl<C> fmt::Debug for BPlusIndex<C>
where
    C: Capabilities,
    C::Record: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, C: Capabilities> IntoIterator for &'a BPlusIndex<C> {
    type Item = &'a C::Record;
    type IntoIter = Iter<'a, C>;

    fn into_iter(self) -> Iter<'a, C> {
        self.iter()
    }
}
