use alloc::collections::TryReserveError;
use core::fmt;

/// Errors reported by [`BPlusIndex`](crate::BPlusIndex) operations.
///
/// A missing key is not an error; lookups and scans return `None` instead.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum IndexError {
    /// A record with an equal key is already indexed. The index is unchanged.
    #[error("a record with this key is already indexed")]
    DuplicateKey,

    /// Memory for a node, a record slot, or a separator key copy could not be
    /// allocated. The index is unchanged.
    #[error("allocation failed while growing the index: {0}")]
    AllocationFailure(#[from] TryReserveError),

    /// The node or record arena has run out of addressable slots.
    #[error("index arena is full ({limit} slots)")]
    CapacityExceeded {
        /// Maximum number of slots an arena can address.
        limit: usize,
    },
}

/// A failed [`insert`](crate::BPlusIndex::insert), returning the record that was
/// not accepted.
///
/// Ownership of a record only passes to the index when the insert succeeds, so
/// the caller can decide what to do with a rejected record (update the existing
/// entry, retry after freeing memory, or drop it).
///
/// # Examples
///
/// ```
/// use bplus_index::{BPlusIndex, IndexError, Keyed, NaturalOrder};
///
/// #[derive(Debug, PartialEq)]
/// struct Slot { id: u32, vacant: bool }
///
/// impl Keyed for Slot {
///     type Key = u32;
///     fn key(&self) -> &u32 { &self.id }
/// }
///
/// let mut slots = BPlusIndex::new(NaturalOrder::<Slot>::new());
/// slots.insert(Slot { id: 1, vacant: true }).unwrap();
///
/// let err = slots.insert(Slot { id: 1, vacant: false }).unwrap_err();
/// assert_eq!(err.error(), &IndexError::DuplicateKey);
/// assert_eq!(err.into_record(), Slot { id: 1, vacant: false });
/// ```
#[derive(thiserror::Error)]
#[error("record rejected by the index")]
pub struct InsertError<R> {
    #[source]
    error: IndexError,
    record: R,
}

impl<R> InsertError<R> {
    pub(crate) fn new(error: IndexError, record: R) -> Self {
        Self { error, record }
    }

    /// Returns why the insert was rejected.
    #[must_use]
    pub fn error(&self) -> &IndexError {
        &self.error
    }

    /// Returns `true` if the record was rejected because its key is already indexed.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self.error, IndexError::DuplicateKey)
    }

    /// Borrows the rejected record.
    #[must_use]
    pub fn record(&self) -> &R {
        &self.record
    }

    /// Gives the rejected record back to the caller.
    #[must_use]
    pub fn into_record(self) -> R {
        self.record
    }

    /// Splits the error into its cause and the rejected record.
    #[must_use]
    pub fn into_parts(self) -> (IndexError, R) {
        (self.error, self.record)
    }
}

impl<R> From<InsertError<R>> for IndexError {
    fn from(err: InsertError<R>) -> Self {
        err.error
    }
}

impl<R> fmt::Debug for InsertError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertError").field("error", &self.error).finish_non_exhaustive()
    }
}
