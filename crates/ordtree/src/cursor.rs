use crate::rb_base::{Node, NodeRef, RbSlab, LEFT, RIGHT};
use slab::Slab;
use std::fmt;
use std::iter::FusedIterator;
use std::ptr;

/// A position in a [Tree](crate::Tree) that can move in both directions
///
/// Moving right past the last item lands on the end position; moving left
/// from the end lands on the last item. Two cursors are equal only if they
/// belong to the same tree and sit on the same node.
pub struct Cursor<'a, T> {
    nodes: &'a RbSlab<T>,
    node: NodeRef,
}

impl<'a, T> Cursor<'a, T> {
    pub(crate) fn new(nodes: &'a RbSlab<T>, node: NodeRef) -> Self {
        Self { nodes, node }
    }

    /// The node under the cursor
    pub fn node(&self) -> NodeRef {
        self.node
    }

    /// The item under the cursor; `None` at the end
    pub fn get(&self) -> Option<&'a T> {
        self.nodes.get(self.node)
    }

    /// Check if the cursor is at the end position
    pub fn is_end(&self) -> bool {
        self.node.is_sentinel()
    }

    /// Moves to the in-order successor
    pub fn move_next(&mut self) {
        self.node = self.nodes.step(self.node, RIGHT);
    }

    /// Moves to the in-order predecessor
    pub fn move_prev(&mut self) {
        self.node = self.nodes.step(self.node, LEFT);
    }
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Cursor<'_, T> {}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.nodes, other.nodes) && self.node == other.node
    }
}
impl<T> Eq for Cursor<'_, T> {}

impl<T> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").field("node", &self.node).finish()
    }
}

/// In-order iterator over the items of a [Tree](crate::Tree)
pub struct Iter<'a, T> {
    nodes: &'a RbSlab<T>,
    front: NodeRef,
    back: NodeRef,
    len: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(nodes: &'a RbSlab<T>) -> Self {
        Self {
            nodes,
            front: nodes.edge(nodes.root, LEFT),
            back: nodes.edge(nodes.root, RIGHT),
            len: nodes.len(),
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        let nodes = self.nodes;
        let node = self.front;
        self.front = nodes.step(node, RIGHT);
        self.len -= 1;
        Some(nodes.item(node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        let nodes = self.nodes;
        let node = self.back;
        self.back = nodes.step(node, LEFT);
        self.len -= 1;
        Some(nodes.item(node))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Owning in-order iterator, see [Tree::into_iter](crate::Tree::into_iter)
pub struct IntoIter<T> {
    slab: Slab<Node<T>>,
    order: std::vec::IntoIter<usize>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(nodes: RbSlab<T>) -> Self {
        let (slab, order) = nodes.into_ordered();
        Self {
            slab,
            order: order.into_iter(),
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let slot = self.order.next()?;
        Some(self.slab.remove(slot).into_item())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        let slot = self.order.next_back()?;
        Some(self.slab.remove(slot).into_item())
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

#[cfg(test)]
mod tests {
    use crate::Tree;

    #[test]
    fn test_cursor_walk() {
        let tree: Tree<i32> = [2, 1, 3].into_iter().collect();
        let mut cursor = tree.cursor_front();
        assert_eq!(cursor.get(), Some(&1));
        cursor.move_next();
        cursor.move_next();
        assert_eq!(cursor.get(), Some(&3));
        cursor.move_next();
        assert!(cursor.is_end());
        assert_eq!(cursor, tree.cursor_end());
        cursor.move_next();
        assert!(cursor.is_end());
        cursor.move_prev();
        assert_eq!(cursor.get(), Some(&3));
    }

    #[test]
    fn test_cursor_equality_needs_same_tree() {
        let a: Tree<i32> = [1].into_iter().collect();
        let b: Tree<i32> = [1].into_iter().collect();
        assert_eq!(a.cursor_front().node(), b.cursor_front().node());
        assert_ne!(a.cursor_front(), b.cursor_front());
        assert_ne!(a.cursor_end(), b.cursor_end());
        assert_eq!(a.cursor_end(), a.cursor(a.sentinel_node()));
    }

    #[test]
    fn test_iter_both_ends() {
        let tree: Tree<i32> = (1..=6).collect();
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 6);
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&6));
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.clone().collect::<Vec<_>>(), [&2, &3, &4]);
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn test_into_iter_both_ends() {
        let tree: Tree<String> = ["b", "d", "a", "c"].into_iter().map(String::from).collect();
        let mut iter = tree.into_iter();
        assert_eq!(iter.next().as_deref(), Some("a"));
        assert_eq!(iter.next_back().as_deref(), Some("d"));
        assert_eq!(iter.collect::<Vec<_>>(), ["b", "c"]);
    }
}
