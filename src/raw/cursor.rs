use core::iter::FusedIterator;

use super::arena::Arena;
use super::handle::Handle;
use super::node::Node;

/// A slot in the leaf chain: leaf handle plus record index inside it.
pub(crate) type Position = (Handle, usize);

/// Walks the leaf chain yielding record handles in ascending key order.
///
/// Runs from `front` up to, but not including, `stop`. A `None` stop means the
/// end of the chain.
pub(crate) struct Cursor<'a, K> {
    nodes: &'a Arena<Node<K>>,
    front: Option<Position>,
    stop: Option<Position>,
}

impl<'a, K> Cursor<'a, K> {
    pub(crate) fn new(nodes: &'a Arena<Node<K>>, front: Option<Position>, stop: Option<Position>) -> Self {
        Self { nodes, front, stop }
    }

    pub(crate) fn empty(nodes: &'a Arena<Node<K>>) -> Self {
        Self::new(nodes, None, None)
    }

    /// Position following `pos` in the chain.
    pub(crate) fn step(nodes: &Arena<Node<K>>, (leaf, index): Position) -> Option<Position> {
        let node = nodes.get(leaf).as_leaf();
        if index + 1 < node.len() {
            Some((leaf, index + 1))
        } else {
            // Leaves are never empty, so the next leaf starts at slot 0.
            node.next().map(|next| (next, 0))
        }
    }
}

impl<K> Iterator for Cursor<'_, K> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        if self.front == self.stop {
            return None;
        }
        let pos = self.front?;
        let record = self.nodes.get(pos.0).as_leaf().record(pos.1);
        self.front = Self::step(self.nodes, pos);
        Some(record)
    }
}

impl<K> FusedIterator for Cursor<'_, K> {}

impl<K> Clone for Cursor<'_, K> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            front: self.front,
            stop: self.stop,
        }
    }
}
