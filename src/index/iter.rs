use core::fmt;
use core::iter::FusedIterator;

use crate::capability::Capabilities;
use crate::raw::{Cursor, RawIndex};

/// An iterator over every record of a [`BPlusIndex`](crate::BPlusIndex), in
/// ascending key order.
///
/// This `struct` is created by the [`iter`] method on
/// [`BPlusIndex`](crate::BPlusIndex). See its documentation for more.
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
/// index.try_extend([3, 1, 2].map(|id| Slot { id })).unwrap();
///
/// let mut iter = index.iter();
/// assert_eq!(iter.next().map(|s| s.id), Some(1));
/// assert_eq!(iter.next().map(|s| s.id), Some(2));
/// assert_eq!(iter.next().map(|s| s.id), Some(3));
/// assert!(iter.next().is_none());
/// ```
///
/// [`iter`]: crate::BPlusIndex::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, C: Capabilities> {
    raw: &'a RawIndex<C>,
    cursor: Cursor<'a, C::Key>,
    remaining: usize,
}

/// An iterator over the records of a [`BPlusIndex`](crate::BPlusIndex) whose
/// keys lie in a range, in ascending key order.
///
/// This `struct` is created by the [`range`] method on
/// [`BPlusIndex`](crate::BPlusIndex). See its documentation for more.
///
/// [`range`]: crate::BPlusIndex::range
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, C: Capabilities> {
    raw: &'a RawIndex<C>,
    cursor: Cursor<'a, C::Key>,
}

impl<'a, C: Capabilities> Iter<'a, C> {
    pub(crate) fn new(raw: &'a RawIndex<C>, cursor: Cursor<'a, C::Key>) -> Self {
        Iter {
            raw,
            cursor,
            remaining: raw.len(),
        }
    }
}

impl<'a, C: Capabilities> Range<'a, C> {
    pub(crate) fn new(raw: &'a RawIndex<C>, cursor: Cursor<'a, C::Key>) -> Self {
        Range { raw, cursor }
    }
}

impl<'a, C: Capabilities> Iterator for Iter<'a, C> {
    type Item = &'a C::Record;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor.next()?;
        self.remaining -= 1;
        Some(self.raw.record(handle))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<C: Capabilities> ExactSizeIterator for Iter<'_, C> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<C: Capabilities> FusedIterator for Iter<'_, C> {}

impl<C: Capabilities> Clone for Iter<'_, C> {
    fn clone(&self) -> Self {
        Iter {
            raw: self.raw,
            cursor: self.cursor.clone(),
            remaining: self.remaining,
        }
    }
}

impl<C: Capabilities> fmt::Debug for Iter<'_, C>
where
    C::Record: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, C: Capabilities> Iterator for Range<'a, C> {
    type Item = &'a C::Record;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor.next()?;
        Some(self.raw.record(handle))
    }
}

impl<C: Capabilities> FusedIterator for Range<'_, C> {}

impl<C: Capabilities> Clone for Range<'_, C> {
    fn clone(&self) -> Self {
        Range {
            raw: self.raw,
            cursor: self.cursor.clone(),
        }
    }
}

impl<C: Capabilities> fmt::Debug for Range<'_, C>
where
    C::Record: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
