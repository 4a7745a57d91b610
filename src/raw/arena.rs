use alloc::vec::Vec;

use super::handle::Handle;
use crate::error::IndexError;

/// Slot storage addressed by [`Handle`]s.
///
/// Growth is fallible: callers [`reserve`](Arena::reserve) before a batch of
/// [`alloc`](Arena::alloc) calls, after which the allocations cannot fail.
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    #[cfg(test)]
    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    #[cfg(test)]
    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes sure the next `additional` calls to [`alloc`](Arena::alloc) succeed
    /// without reallocating.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<(), IndexError> {
        let fresh = additional.saturating_sub(self.free.len());
        if fresh == 0 {
            return Ok(());
        }
        // Total slot count must stay addressable by a `Handle`.
        if self.slots.len().saturating_add(fresh) > Handle::MAX {
            return Err(IndexError::CapacityExceeded { limit: Handle::MAX });
        }
        self.slots.try_reserve(fresh)?;
        Ok(())
    }

    /// Stores `element` in a free slot.
    ///
    /// # Panics
    ///
    /// Panics if the handle space is exhausted; [`reserve`](Arena::reserve)
    /// first to get that condition as an error.
    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(h) = self.free.pop() {
            self.slots[h.to_index()] = Some(element);
            h
        } else {
            assert!(
                self.slots.len() < Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::MAX
            );
            self.slots.push(Some(element));
            Handle::from_index(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    /// Forgets every slot. Elements still stored are dropped in place.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
