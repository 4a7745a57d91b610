use super::BPlusIndex;
use crate::capability::Capabilities;
use crate::error::IndexError;

impl<C: Capabilities> BPlusIndex<C> {
    /// Creates an empty index with room for at least `capacity` records.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::AllocationFailure`] or
    /// [`IndexError::CapacityExceeded`] if the storage cannot be reserved.
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
    /// let index = BPlusIndex::with_capacity(NaturalOrder::<Slot>::new(), 32).unwrap();
    /// assert!(index.is_empty());
    /// assert!(index.capacity() >= 32);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    pub fn with_capacity(capabilities: C, capacity: usize) -> Result<Self, IndexError> {
        let mut index = BPlusIndex::new(capabilities);
        index.try_reserve(capacity)?;
        Ok(index)
    }

    /// Reserves room for at least `additional` more records.
    ///
    /// Inserts still reserve what they need one at a time; this only avoids
    /// repeated growth during bulk loads.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::AllocationFailure`] or
    /// [`IndexError::CapacityExceeded`] if the storage cannot be reserved. The
    /// index is unchanged either way.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), IndexError> {
        self.raw.try_reserve(additional)
    }

    /// Returns how many records the index can hold before its record storage
    /// has to grow.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}
