use core::cmp::Ordering;
use core::ops::{Bound, RangeBounds};

use smallvec::SmallVec;

use super::arena::Arena;
use super::cursor::{Cursor, Position};
use super::handle::Handle;
use super::node::{InternalNode, LEAF_SPLIT_POINT, LeafNode, MAX_CHILDREN, MAX_KEYS, Node, SearchResult};
use crate::capability::Capabilities;
use crate::error::{IndexError, InsertError};
use crate::trace::{debug_log, trace_log, warn_log};

/// The B+ tree engine behind [`BPlusIndex`](crate::BPlusIndex).
pub(crate) struct RawIndex<C: Capabilities> {
    caps: C,
    /// Arena storing all tree nodes.
    nodes: Arena<Node<C::Key>>,
    /// Arena storing all records; leaves refer to them by handle.
    records: Arena<C::Record>,
    root: Option<Handle>,
    len: usize,
}

/// Everything an insert needs, gathered before the tree is touched.
struct InsertPlan<K> {
    leaf: Handle,
    position: usize,
    /// Present when the target leaf is full and must split.
    separator: Option<K>,
}

impl<C: Capabilities> RawIndex<C> {
    pub(crate) const fn new(caps: C) -> Self {
        Self {
            caps,
            nodes: Arena::new(),
            records: Arena::new(),
            root: None,
            len: 0,
        }
    }

    pub(crate) fn capabilities(&self) -> &C {
        &self.caps
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of records that fit without growing the record arena.
    pub(crate) fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// Pre-sizes both arenas for `additional` more records.
    ///
    /// Split leaves keep at least two records and every internal node has at
    /// least two children, so a tree never has more nodes than records.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), IndexError> {
        self.records.reserve(additional)?;
        self.nodes.reserve(additional)
    }

    /// Number of levels from the root to the leaves; 0 when empty.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            height += 1;
            current = match self.nodes.get(handle) {
                Node::Internal(internal) => Some(internal.child(0)),
                Node::Leaf(_) => None,
            };
        }
        height
    }

    pub(crate) fn record(&self, handle: Handle) -> &C::Record {
        self.records.get(handle)
    }

    pub(crate) fn record_mut(&mut self, handle: Handle) -> &mut C::Record {
        self.records.get_mut(handle)
    }

    /// Descends from the root to the leaf whose key range covers `key`.
    ///
    /// At each internal node the descent follows the child just left of the
    /// first separator greater than `key`.
    pub(crate) fn find_leaf(&self, key: &C::Key) -> Option<Handle> {
        let mut current = self.root?;
        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => {
                    let idx = internal.search_child(|sep| self.caps.compare_keys(key, sep) != Ordering::Less);
                    current = internal.child(idx);
                }
                Node::Leaf(_) => return Some(current),
            }
        }
    }

    /// Leftmost leaf, reached by always following the first child.
    pub(crate) fn leftmost_leaf(&self) -> Option<Handle> {
        let mut current = self.root?;
        while let Node::Internal(internal) = self.nodes.get(current) {
            current = internal.child(0);
        }
        Some(current)
    }

    /// Returns the handle of the record whose key equals `key`.
    pub(crate) fn search(&self, key: &C::Key) -> Option<Handle> {
        let leaf_handle = self.find_leaf(key)?;
        let leaf = self.nodes.get(leaf_handle).as_leaf();
        match leaf.search(|h| self.caps.compare_key_to_record(key, self.records.get(h))) {
            SearchResult::Found(idx) => Some(leaf.record(idx)),
            SearchResult::NotFound(_) => None,
        }
    }

    /// Inserts a record, taking ownership of it on success.
    ///
    /// Every fallible step runs before the tree is modified, so on error the
    /// tree is unchanged and the record is handed back.
    pub(crate) fn insert(&mut self, record: C::Record) -> Result<(), InsertError<C::Record>> {
        if self.root.is_none() {
            if let Err(err) = self.records.reserve(1).and_then(|()| self.nodes.reserve(1)) {
                warn_log!(error = %err, "insert into empty index failed");
                return Err(InsertError::new(err, record));
            }
            let record_handle = self.records.alloc(record);
            let leaf_handle = self.nodes.alloc(Node::Leaf(LeafNode::with_record(record_handle)));
            self.root = Some(leaf_handle);
            self.len = 1;
            return Ok(());
        }

        let plan = match self.plan_insert(&record) {
            Ok(plan) => plan,
            Err(err) => return Err(InsertError::new(err, record)),
        };

        let record_handle = self.records.alloc(record);
        self.nodes.get_mut(plan.leaf).as_leaf_mut().insert(plan.position, record_handle);
        self.len += 1;

        if let Some(separator) = plan.separator {
            self.split_leaf(plan.leaf, separator);
        }
        Ok(())
    }

    /// Locates the target leaf, rejects duplicates, and reserves whatever the
    /// insert will allocate.
    fn plan_insert(&mut self, record: &C::Record) -> Result<InsertPlan<C::Key>, IndexError> {
        let key = self.caps.key_of(record);
        let leaf_handle = self.find_leaf(key).expect("non-empty index has a leaf");
        let leaf = self.nodes.get(leaf_handle).as_leaf();

        let position = match leaf.search(|h| self.caps.compare_key_to_record(key, self.records.get(h))) {
            SearchResult::Found(_) => {
                warn_log!("duplicate key insertion rejected");
                return Err(IndexError::DuplicateKey);
            }
            SearchResult::NotFound(idx) => idx,
        };

        if leaf.has_room() {
            self.records.reserve(1)?;
            return Ok(InsertPlan {
                leaf: leaf_handle,
                position,
                separator: None,
            });
        }

        // After merging the new record in, slot LEAF_SPLIT_POINT opens the new
        // right leaf. Work out which record lands there.
        let first_right = match position.cmp(&LEAF_SPLIT_POINT) {
            Ordering::Less => Some(leaf.record(LEAF_SPLIT_POINT - 1)),
            Ordering::Equal => None,
            Ordering::Greater => Some(leaf.record(LEAF_SPLIT_POINT)),
        };

        // One new leaf, at most one new internal node per ancestor, and a new root.
        let new_nodes = self.height() + 1;
        if let Err(err) = self.records.reserve(1).and_then(|()| self.nodes.reserve(new_nodes)) {
            warn_log!(error = %err, "could not reserve nodes for a leaf split");
            return Err(err);
        }

        let separator_source = match first_right {
            Some(handle) => self.caps.key_of(self.records.get(handle)),
            None => key,
        };
        let separator = self.caps.duplicate_key(separator_source).map_err(|err| {
            warn_log!(error = %err, "could not copy separator key");
            IndexError::from(err)
        })?;

        Ok(InsertPlan {
            leaf: leaf_handle,
            position,
            separator: Some(separator),
        })
    }

    /// Splits an overflowed leaf and hands the separator to its parent.
    ///
    /// `separator` must be a copy of the key that ends up first in the new leaf.
    fn split_leaf(&mut self, leaf_handle: Handle, separator: C::Key) {
        let right = self.nodes.get_mut(leaf_handle).as_leaf_mut().split();
        debug_assert_eq!(
            self.caps.compare_key_to_record(&separator, self.records.get(right.record(0))),
            Ordering::Equal,
            "separator must copy the first key of the new leaf"
        );

        let right_handle = self.nodes.alloc(Node::Leaf(right));
        self.nodes.get_mut(leaf_handle).as_leaf_mut().set_next(Some(right_handle));
        debug_log!(left = ?leaf_handle, right = ?right_handle, "leaf split");

        self.insert_into_parent(leaf_handle, separator, right_handle);
    }

    /// Links `right` into the tree as the successor of `left`, separated by
    /// `separator`.
    ///
    /// Splits full ancestors on the way up, pushing their median key to the
    /// next level; reaching the root grows the tree by one level.
    fn insert_into_parent(&mut self, mut left: Handle, mut separator: C::Key, mut right: Handle) {
        loop {
            let Some(parent_handle) = self.nodes.get(left).parent() else {
                let root = self.nodes.alloc(Node::Internal(InternalNode::new_root(left, separator, right)));
                self.nodes.get_mut(left).set_parent(Some(root));
                self.nodes.get_mut(right).set_parent(Some(root));
                self.root = Some(root);
                debug_log!(root = ?root, height = self.height(), "index grew a level");
                return;
            };

            let caps = &self.caps;
            let parent = self.nodes.get_mut(parent_handle).as_internal_mut();
            let index = parent.search_child(|sep| caps.compare_keys(&separator, sep) != Ordering::Less);
            debug_assert_eq!(parent.child(index), left, "separator must land right after its left child");
            parent.insert_child(index, separator, right);
            let overflowed = parent.key_count() > MAX_KEYS;
            self.nodes.get_mut(right).set_parent(Some(parent_handle));

            if !overflowed {
                return;
            }

            let (median, right_half) = self.nodes.get_mut(parent_handle).as_internal_mut().split();
            let moved: SmallVec<[Handle; MAX_CHILDREN]> = right_half.children().iter().copied().collect();
            let right_half_handle = self.nodes.alloc(Node::Internal(right_half));
            for child in moved {
                self.nodes.get_mut(child).set_parent(Some(right_half_handle));
            }
            debug_log!(left = ?parent_handle, right = ?right_half_handle, "internal node split");

            left = parent_handle;
            separator = median;
            right = right_half_handle;
        }
    }

    /// Releases every record and separator through the capability set and
    /// leaves the index empty and reusable.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub(crate) fn destroy(&mut self) {
        if let Some(root) = self.root.take() {
            let (records, keys) = self.destroy_node(root);
            trace_log!(records, keys, "index torn down");
            debug_assert_eq!(records, self.len, "teardown must release every record once");
        }
        self.nodes.clear();
        self.records.clear();
        self.len = 0;
    }

    /// Post-order teardown. Returns the number of records and keys released.
    fn destroy_node(&mut self, handle: Handle) -> (usize, usize) {
        match self.nodes.take(handle) {
            Node::Internal(mut internal) => {
                let mut released = (0, 0);
                for &child in internal.children() {
                    let (records, keys) = self.destroy_node(child);
                    released.0 += records;
                    released.1 += keys;
                }
                for key in internal.take_keys() {
                    self.caps.release_key(key);
                    released.1 += 1;
                }
                released
            }
            Node::Leaf(mut leaf) => {
                let records = leaf.take_records();
                for &record in &records {
                    let record = self.records.take(record);
                    self.caps.release_record(record);
                }
                (records.len(), 0)
            }
        }
    }

    /// Cursor over every record in key order.
    pub(crate) fn cursor(&self) -> Cursor<'_, C::Key> {
        Cursor::new(&self.nodes, self.leftmost_leaf().map(|leaf| (leaf, 0)), None)
    }

    /// Cursor over the records whose keys fall inside `range`.
    pub(crate) fn range_cursor<R: RangeBounds<C::Key>>(&self, range: &R) -> Cursor<'_, C::Key> {
        let front = match range.start_bound() {
            Bound::Unbounded => self.leftmost_leaf().map(|leaf| (leaf, 0)),
            Bound::Included(low) => self.first_position(low, false),
            Bound::Excluded(low) => self.first_position(low, true),
        };
        let stop = match range.end_bound() {
            Bound::Unbounded => None,
            Bound::Included(high) => self.first_position(high, true),
            Bound::Excluded(high) => self.first_position(high, false),
        };

        // An empty range can put `front` past `stop`; the chain walk would then
        // never meet `stop`.
        if let Some((leaf, index)) = front {
            let first = self.records.get(self.nodes.get(leaf).as_leaf().record(index));
            let past_end = match range.end_bound() {
                Bound::Unbounded => false,
                Bound::Included(high) => self.caps.compare_key_to_record(high, first) == Ordering::Less,
                Bound::Excluded(high) => self.caps.compare_key_to_record(high, first) != Ordering::Greater,
            };
            if past_end {
                return Cursor::empty(&self.nodes);
            }
        }
        Cursor::new(&self.nodes, front, stop)
    }

    /// First position whose key is `>= key`, or `> key` when `strict`.
    fn first_position(&self, key: &C::Key, strict: bool) -> Option<Position> {
        let leaf_handle = self.find_leaf(key)?;
        let leaf = self.nodes.get(leaf_handle).as_leaf();
        let found = leaf.records().iter().position(|&h| {
            let ord = self.caps.compare_key_to_record(key, self.records.get(h));
            if strict { ord == Ordering::Less } else { ord != Ordering::Greater }
        });
        match found {
            Some(index) => Some((leaf_handle, index)),
            // Everything in later leaves is at or above this leaf's upper separator.
            None => leaf.next().map(|next| (next, 0)),
        }
    }

    /// Visits every record in key order with mutable access.
    pub(crate) fn for_each_mut(&mut self, mut visit: impl FnMut(&mut C::Record)) {
        let mut current = self.leftmost_leaf();
        while let Some(handle) = current {
            let leaf = self.nodes.get(handle).as_leaf();
            for &record in leaf.records() {
                visit(self.records.get_mut(record));
            }
            current = leaf.next();
        }
    }

    /// Record with the largest key.
    pub(crate) fn rightmost_record(&self) -> Option<Handle> {
        let mut current = self.root?;
        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => current = internal.child(internal.child_count() - 1),
                Node::Leaf(leaf) => return Some(leaf.record(leaf.len() - 1)),
            }
        }
    }
}
