//! A generic B+ tree index for records that carry their own key.
//!
//! [`BPlusIndex`] stores records by primary key and supports insertion,
//! exact-match lookup, and ordered or bounded scans along a linked chain of
//! leaves. It is parameterized over a [`Capabilities`] implementation that
//! tells it how to compare keys and records, pull a key out of a record, copy
//! a key, and release keys and records, so the same engine can back unrelated
//! record kinds side by side.
//!
//! # Example
//!
//! ```
//! use bplus_index::{BPlusIndex, Keyed, NaturalOrder};
//!
//! #[derive(Debug)]
//! struct Slot {
//!     id: u32,
//!     vacant: bool,
//! }
//!
//! impl Keyed for Slot {
//!     type Key = u32;
//!     fn key(&self) -> &u32 {
//!         &self.id
//!     }
//! }
//!
//! let mut slots = BPlusIndex::new(NaturalOrder::<Slot>::new());
//! for id in [5, 1, 4, 2, 3] {
//!     slots.insert(Slot { id, vacant: true }).unwrap();
//! }
//!
//! // Lookups
//! assert!(slots.get(&4).is_some());
//! assert!(slots.insert(Slot { id: 4, vacant: false }).unwrap_err().is_duplicate());
//!
//! // Ordered traversal
//! let ids: Vec<u32> = slots.iter().map(|s| s.id).collect();
//! assert_eq!(ids, [1, 2, 3, 4, 5]);
//!
//! // Bounded scan with a predicate, then update in place
//! slots.first_match_mut(2..=4, |s| s.vacant).unwrap().vacant = false;
//! assert_eq!(slots.first_match(2..=4, |s| s.vacant).map(|s| s.id), Some(3));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`.
//! - **Fallible growth** - Running out of memory is reported as
//!   [`IndexError::AllocationFailure`], and a failed insert changes nothing.
//! - **`tracing`** (default) - Splits, root growth and rejected inserts are
//!   logged through the `tracing` crate.
//!
//! # Implementation
//!
//! Nodes and records live in two arenas and refer to each other by index, so
//! parent links, sibling links and teardown never involve raw pointers. The
//! fanout is fixed at [`BPlusIndex::ORDER`] = 5: a node holds at most four keys,
//! a full leaf splits 3/2, and a full internal node pushes its middle key up.
//! Records are never removed individually.

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod capability;
mod error;
mod raw;
mod trace;

pub mod index;

pub use capability::{Capabilities, Keyed, NaturalOrder};
pub use error::{IndexError, InsertError};
pub use index::BPlusIndex;
