use alloc::collections::TryReserveError;
use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;

/// The operations a [`BPlusIndex`](crate::BPlusIndex) needs to work over a
/// particular key and record type.
///
/// The index has no notion of what a key or a record is. Everything it does to
/// them goes through an implementation of this trait, supplied once when the
/// index is created. One index is built per record kind, each with its own
/// capability set.
///
/// # Contract
///
/// - [`compare_keys`](Capabilities::compare_keys) is a total order.
/// - [`compare_key_to_record`](Capabilities::compare_key_to_record) agrees with
///   it: comparing `k` against `r` gives the same answer as comparing `k`
///   against [`key_of(r)`](Capabilities::key_of).
/// - None of the methods may observe or change the index.
///
/// Breaking the contract is a logic error. The index stays memory safe but may
/// return wrong results or panic.
///
/// # Examples
///
/// An index of vehicles keyed by registration number, where lookups ignore
/// ASCII case:
///
/// ```
/// use std::cmp::Ordering;
/// use std::collections::TryReserveError;
///
/// use bplus_index::{BPlusIndex, Capabilities};
///
/// struct Vehicle { plate: String, owner: String }
///
/// struct ByPlate;
///
/// impl Capabilities for ByPlate {
///     type Key = String;
///     type Record = Vehicle;
///
///     fn compare_key_to_record(&self, key: &String, record: &Vehicle) -> Ordering {
///         self.compare_keys(key, &record.plate)
///     }
///
///     fn compare_keys(&self, a: &String, b: &String) -> Ordering {
///         a.bytes().map(|c| c.to_ascii_uppercase()).cmp(b.bytes().map(|c| c.to_ascii_uppercase()))
///     }
///
///     fn key_of<'r>(&self, record: &'r Vehicle) -> &'r String {
///         &record.plate
///     }
///
///     fn duplicate_key(&self, key: &String) -> Result<String, TryReserveError> {
///         let mut copy = String::new();
///         copy.try_reserve_exact(key.len())?;
///         copy.push_str(key);
///         Ok(copy)
///     }
/// }
///
/// let mut vehicles = BPlusIndex::new(ByPlate);
/// vehicles.insert(Vehicle { plate: "MH12AB1234".into(), owner: "Asha".into() }).unwrap();
///
/// let found = vehicles.get(&"mh12ab1234".to_string()).unwrap();
/// assert_eq!(found.owner, "Asha");
/// ```
pub trait Capabilities {
    /// The indexed key.
    type Key;
    /// The stored record. The index owns every record it accepts.
    type Record;

    /// Compares a key against the key of a stored record.
    fn compare_key_to_record(&self, key: &Self::Key, record: &Self::Record) -> Ordering;

    /// Compares two keys.
    fn compare_keys(&self, a: &Self::Key, b: &Self::Key) -> Ordering;

    /// Borrows the key out of a record.
    fn key_of<'r>(&self, record: &'r Self::Record) -> &'r Self::Key;

    /// Makes an independently owned copy of a key, used for separators in
    /// internal nodes.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error if the copy needs memory that is not
    /// available. The insert that asked for the copy then fails without
    /// changing the index.
    fn duplicate_key(&self, key: &Self::Key) -> Result<Self::Key, TryReserveError>;

    /// Disposes of a separator copy when the index is torn down.
    fn release_key(&self, key: Self::Key) {
        drop(key);
    }

    /// Disposes of a record when the index is torn down.
    fn release_record(&self, record: Self::Record) {
        drop(record);
    }
}

/// A record that carries its own ordered key.
///
/// Implementing this is the short way to index a record type: pair it with
/// [`NaturalOrder`] instead of writing a [`Capabilities`] impl.
pub trait Keyed {
    /// The key type, ordered by [`Ord`] and copied by [`Clone`].
    type Key: Ord + Clone;

    /// Borrows the record's key.
    fn key(&self) -> &Self::Key;
}

/// Capability set for [`Keyed`] records: keys compare with [`Ord`], separator
/// copies are made with [`Clone`], and release is a plain drop.
///
/// [`Clone`] has no way to report allocation failure, so a key copy here never
/// returns [`IndexError::AllocationFailure`](crate::IndexError::AllocationFailure);
/// a heap-backed key such as `String` aborts on out-of-memory instead. Keys that
/// allocate and need that failure reported should get their own [`Capabilities`]
/// impl whose [`duplicate_key`](Capabilities::duplicate_key) uses `try_reserve`.
///
/// # Examples
///
/// ```
/// use bplus_index::{BPlusIndex, Keyed, NaturalOrder};
///
/// struct Slot { id: u32, vacant: bool }
///
/// impl Keyed for Slot {
///     type Key = u32;
///     fn key(&self) -> &u32 { &self.id }
/// }
///
/// let mut slots = BPlusIndex::new(NaturalOrder::<Slot>::new());
/// for id in 1..=10 {
///     slots.insert(Slot { id, vacant: id % 3 == 0 }).unwrap();
/// }
/// assert_eq!(slots.first_match(4..=10, |s| s.vacant).map(|s| s.id), Some(6));
/// ```
pub struct NaturalOrder<R>(PhantomData<fn(&R)>);

impl<R> NaturalOrder<R> {
    /// Creates the capability set.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for NaturalOrder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for NaturalOrder<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for NaturalOrder<R> {}

impl<R> fmt::Debug for NaturalOrder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NaturalOrder")
    }
}

impl<R: Keyed> Capabilities for NaturalOrder<R> {
    type Key = R::Key;
    type Record = R;

    #[inline]
    fn compare_key_to_record(&self, key: &R::Key, record: &R) -> Ordering {
        key.cmp(record.key())
    }

    #[inline]
    fn compare_keys(&self, a: &R::Key, b: &R::Key) -> Ordering {
        a.cmp(b)
    }

    #[inline]
    fn key_of<'r>(&self, record: &'r R) -> &'r R::Key {
        record.key()
    }

    fn duplicate_key(&self, key: &R::Key) -> Result<R::Key, TryReserveError> {
        Ok(key.clone())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::String;

    struct Named {
        name: String,
    }

    impl Keyed for Named {
        type Key = String;

        fn key(&self) -> &String {
            &self.name
        }
    }

    #[test]
    fn natural_order_agrees_between_key_and_record() {
        let caps = NaturalOrder::<Named>::new();
        let record = Named { name: "m".into() };

        for probe in ["a", "m", "z"] {
            let probe = String::from(probe);
            assert_eq!(
                caps.compare_key_to_record(&probe, &record),
                caps.compare_keys(&probe, caps.key_of(&record))
            );
        }
    }

    #[test]
    fn natural_order_copies_are_independent() {
        let caps = NaturalOrder::<Named>::new();
        let key = String::from("abc");
        let copy = caps.duplicate_key(&key).unwrap();
        drop(key);
        assert_eq!(copy, "abc");
    }
}
