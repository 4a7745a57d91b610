use smallvec::SmallVec;

use super::handle::Handle;

/// Maximum fanout F: an internal node has at most `ORDER` children.
pub(crate) const ORDER: usize = 5;

pub(crate) const MAX_CHILDREN: usize = ORDER;
pub(crate) const MAX_KEYS: usize = MAX_CHILDREN - 1;
/// Records kept by the original leaf when an overflowing leaf splits.
pub(crate) const LEAF_SPLIT_POINT: usize = ORDER.div_ceil(2);
/// Index of the key pushed up when an overflowing internal node splits.
pub(crate) const INTERNAL_MEDIAN: usize = (ORDER - 1) / 2;

#[allow(clippy::large_enum_variant)]
pub(crate) enum Node<K> {
    Internal(InternalNode<K>),
    Leaf(LeafNode),
}

// Separator i is a copy of the first key reachable under children[i + 1].
pub(crate) struct InternalNode<K> {
    parent: Option<Handle>,
    // +1 leaves room for the overflow entry before a split.
    keys: SmallVec<[K; MAX_KEYS + 1]>,
    children: SmallVec<[Handle; MAX_CHILDREN + 1]>,
}

// Leaves hold record handles only; keys are read out of the records.
pub(crate) struct LeafNode {
    parent: Option<Handle>,
    next: Option<Handle>,
    records: SmallVec<[Handle; MAX_KEYS + 1]>,
}

/// Result of searching for a key in a leaf.
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted.
    NotFound(usize),
}

impl<K> Node<K> {
    /// Returns the leaf node, panicking if this is not a leaf.
    pub(crate) fn as_leaf(&self) -> &LeafNode {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the leaf node mutably, panicking if this is not a leaf.
    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the internal node, panicking if this is not internal.
    #[cfg(test)]
    pub(crate) fn as_internal(&self) -> &InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    /// Returns the internal node mutably, panicking if this is not internal.
    pub(crate) fn as_internal_mut(&mut self) -> &mut InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        match self {
            Node::Internal(internal) => internal.parent,
            Node::Leaf(leaf) => leaf.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        match self {
            Node::Internal(internal) => internal.parent = parent,
            Node::Leaf(leaf) => leaf.parent = parent,
        }
    }
}

impl<K> InternalNode<K> {
    /// Creates a root holding one separator between two children.
    pub(crate) fn new_root(left: Handle, separator: K, right: Handle) -> Self {
        let mut keys = SmallVec::new();
        keys.push(separator);
        let mut children = SmallVec::new();
        children.push(left);
        children.push(right);
        Self {
            parent: None,
            keys,
            children,
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Index of the child whose subtree covers a key.
    ///
    /// `is_at_or_after(sep)` must say whether the key is `>=` that separator;
    /// the result is the first separator the key is below, i.e. the number of
    /// separators it is at or after.
    #[inline]
    pub(crate) fn search_child(&self, is_at_or_after: impl FnMut(&K) -> bool) -> usize {
        self.keys.partition_point(is_at_or_after)
    }

    /// Inserts `key` at `index` with `child` directly to its right.
    pub(crate) fn insert_child(&mut self, index: usize, key: K, child: Handle) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, child);
    }

    /// Splits an overflowed node around [`INTERNAL_MEDIAN`].
    ///
    /// Returns the median key, which belongs to neither half, and the right half.
    /// The right half has no parent yet and its children still point here.
    pub(crate) fn split(&mut self) -> (K, InternalNode<K>) {
        debug_assert_eq!(self.keys.len(), MAX_KEYS + 1, "split of a node that has not overflowed");

        let right = InternalNode {
            parent: self.parent,
            keys: self.keys.drain(INTERNAL_MEDIAN + 1..).collect(),
            children: self.children.drain(INTERNAL_MEDIAN + 1..).collect(),
        };
        let median = self.keys.pop().expect("overflowed internal node has a median");
        (median, right)
    }

    /// Removes every separator, leaving the children in place.
    pub(crate) fn take_keys(&mut self) -> SmallVec<[K; MAX_KEYS + 1]> {
        core::mem::take(&mut self.keys)
    }
}

impl LeafNode {
    /// Creates a parentless leaf holding a single record.
    pub(crate) fn with_record(record: Handle) -> Self {
        let mut records = SmallVec::new();
        records.push(record);
        Self {
            parent: None,
            next: None,
            records,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn has_room(&self) -> bool {
        self.records.len() < MAX_KEYS
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    #[inline]
    pub(crate) fn record(&self, index: usize) -> Handle {
        self.records[index]
    }

    pub(crate) fn records(&self) -> &[Handle] {
        &self.records
    }

    /// Linear search in ascending order.
    ///
    /// `cmp(record)` compares the searched key against the record's key.
    #[inline]
    pub(crate) fn search(&self, mut cmp: impl FnMut(Handle) -> core::cmp::Ordering) -> SearchResult {
        for (idx, &record) in self.records.iter().enumerate() {
            match cmp(record) {
                core::cmp::Ordering::Greater => {}
                core::cmp::Ordering::Equal => return SearchResult::Found(idx),
                core::cmp::Ordering::Less => return SearchResult::NotFound(idx),
            }
        }
        SearchResult::NotFound(self.records.len())
    }

    pub(crate) fn insert(&mut self, index: usize, record: Handle) {
        self.records.insert(index, record);
    }

    /// Splits an overflowed leaf at [`LEAF_SPLIT_POINT`].
    ///
    /// The right half takes over this leaf's `next` link and parent; linking this
    /// leaf to the right half is left to the caller, who knows its handle.
    pub(crate) fn split(&mut self) -> LeafNode {
        debug_assert_eq!(self.records.len(), MAX_KEYS + 1, "split of a leaf that has not overflowed");

        LeafNode {
            parent: self.parent,
            next: self.next.take(),
            records: self.records.drain(LEAF_SPLIT_POINT..).collect(),
        }
    }

    /// Removes every record handle.
    pub(crate) fn take_records(&mut self) -> SmallVec<[Handle; MAX_KEYS + 1]> {
        core::mem::take(&mut self.records)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use core::cmp::Ordering;

    fn h(i: usize) -> Handle {
        Handle::from_index(i)
    }

    fn full_leaf() -> LeafNode {
        let mut leaf = LeafNode::with_record(h(0));
        for i in 1..=MAX_KEYS {
            leaf.insert(i, h(i));
        }
        leaf
    }

    #[test]
    fn split_arithmetic_for_order_five() {
        assert_eq!(MAX_KEYS, 4);
        assert_eq!(LEAF_SPLIT_POINT, 3);
        assert_eq!(INTERNAL_MEDIAN, 2);
    }

    #[test]
    fn leaf_split_keeps_first_three() {
        let mut leaf = full_leaf();
        leaf.set_next(Some(h(99)));

        let right = leaf.split();

        assert_eq!(leaf.records(), &[h(0), h(1), h(2)]);
        assert_eq!(right.records(), &[h(3), h(4)]);
        assert_eq!(leaf.next(), None);
        assert_eq!(right.next(), Some(h(99)));
    }

    #[test]
    fn leaf_search_reports_insert_position() {
        let mut leaf = LeafNode::with_record(h(10));
        leaf.insert(1, h(20));
        leaf.insert(2, h(30));

        let probe = |target: usize| move |r: Handle| target.cmp(&r.to_index());
        assert!(matches!(leaf.search(probe(20)), SearchResult::Found(1)));
        assert!(matches!(leaf.search(probe(5)), SearchResult::NotFound(0)));
        assert!(matches!(leaf.search(probe(25)), SearchResult::NotFound(2)));
        assert!(matches!(leaf.search(probe(35)), SearchResult::NotFound(3)));
    }

    #[test]
    fn internal_split_pushes_median_up() {
        // keys 10..=50, children c0..c5
        let mut node = InternalNode::new_root(h(0), 10, h(1));
        for (i, key) in [20, 30, 40, 50].into_iter().enumerate() {
            node.insert_child(i + 1, key, h(i + 2));
        }

        let (median, right) = node.split();

        assert_eq!(median, 30);
        assert_eq!(node.keys(), &[10, 20]);
        assert_eq!(node.children(), &[h(0), h(1), h(2)]);
        assert_eq!(right.keys(), &[40, 50]);
        assert_eq!(right.children(), &[h(3), h(4), h(5)]);
    }

    #[test]
    fn search_child_picks_first_separator_above_key() {
        let mut node = InternalNode::new_root(h(0), 10, h(1));
        node.insert_child(1, 20, h(2));

        let route = |key: i32| node.search_child(|sep| key.cmp(sep) != Ordering::Less);
        assert_eq!(route(5), 0);
        assert_eq!(route(10), 1);
        assert_eq!(route(15), 1);
        assert_eq!(route(20), 2);
        assert_eq!(route(99), 2);
    }

    #[test]
    fn parent_links_are_per_variant() {
        let mut leaf: Node<i32> = Node::Leaf(LeafNode::with_record(h(0)));
        assert_eq!(leaf.parent(), None);
        leaf.set_parent(Some(h(3)));
        assert_eq!(leaf.parent(), Some(h(3)));

        let mut internal = Node::Internal(InternalNode::new_root(h(0), 1, h(1)));
        internal.set_parent(Some(h(4)));
        assert_eq!(internal.parent(), Some(h(4)));
        assert_eq!(internal.as_internal().child_count(), 2);
    }
}
