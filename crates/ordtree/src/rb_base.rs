// Copyright (c) 2025 gudzpoz
// Copyright (c) 2019 Sevag Hanssian
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use crate::error::InvariantError;
use slab::Slab;
use std::ops::{Index, IndexMut};

/// A handle to a node stored in a [Tree](crate::Tree)
///
/// Handles are plain indices. They stay valid across insertions and
/// removals of *other* nodes, and become stale once their own node is
/// removed (a later insertion may reuse the slot).
// Slot `k` of the slab is addressed as `NodeRef(k + 1)`, which leaves
// `NodeRef(0)` free for the sentinel without storing a dummy item.
#[derive(Eq, PartialEq, Copy, Clone, Hash, Debug)]
pub struct NodeRef(pub(crate) usize);
impl NodeRef {
    /// Whether this handle is the "no node" marker (the end position)
    pub fn is_sentinel(&self) -> bool {
        self.0 == 0
    }
    fn slot(self) -> usize {
        self.0 - 1
    }
}
pub(crate) const SENTINEL: NodeRef = NodeRef(0);

pub(crate) const LEFT: usize = 0;
pub(crate) const RIGHT: usize = 1;

/// Node colour as reported by [Tree::color](crate::Tree::color)
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Color {
    /// A red node
    Red,
    /// A black node (the sentinel is always black)
    Black,
}

#[derive(Copy, Clone)]
pub(crate) struct Links {
    pub parent: NodeRef,
    pub children: [NodeRef; 2],
    pub red: bool,
}
impl Links {
    const fn nil() -> Self {
        Self {
            parent: SENTINEL,
            children: [SENTINEL, SENTINEL],
            red: false,
        }
    }
}

#[derive(Clone)]
pub(crate) struct Node<T> {
    links: Links,
    item: T,
}
impl<T> Node<T> {
    pub fn into_item(self) -> T {
        self.item
    }
}

/// The node arena: structural links, colours and items
///
/// Everything here is comparator-agnostic. Ordering decisions are made by
/// [Tree](crate::Tree), which then calls [RbSlab::attach] or [RbSlab::delete].
#[derive(Clone)]
pub(crate) struct RbSlab<T> {
    slab: Slab<Node<T>>,
    nil: Links,
    pub root: NodeRef,
}

impl<T> Index<NodeRef> for RbSlab<T> {
    type Output = Links;

    fn index(&self, index: NodeRef) -> &Self::Output {
        if index.is_sentinel() {
            &self.nil
        } else {
            &self.slab[index.slot()].links
        }
    }
}
impl<T> IndexMut<NodeRef> for RbSlab<T> {
    fn index_mut(&mut self, index: NodeRef) -> &mut Self::Output {
        if index.is_sentinel() {
            &mut self.nil
        } else {
            &mut self.slab[index.slot()].links
        }
    }
}

impl<T> RbSlab<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slab: Slab::with_capacity(capacity),
            nil: Links::nil(),
            root: SENTINEL,
        }
    }

    pub fn len(&self) -> usize {
        self.slab.len()
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        !node.is_sentinel() && self.slab.contains(node.slot())
    }

    /// The item of a live node; panics on the sentinel
    pub fn item(&self, node: NodeRef) -> &T {
        &self.slab[node.slot()].item
    }

    pub fn item_mut(&mut self, node: NodeRef) -> &mut T {
        &mut self.slab[node.slot()].item
    }

    pub fn get(&self, node: NodeRef) -> Option<&T> {
        if node.is_sentinel() {
            return None;
        }
        self.slab.get(node.slot()).map(|n| &n.item)
    }

    pub fn get_mut(&mut self, node: NodeRef) -> Option<&mut T> {
        if node.is_sentinel() {
            return None;
        }
        self.slab.get_mut(node.slot()).map(|n| &mut n.item)
    }

    /// Drops every node at once
    pub fn clear(&mut self) {
        self.slab.clear();
        self.root = SENTINEL;
        self.reset_sentinel();
    }

    /// Moves the items out in order, leaving the links behind
    pub fn into_ordered(self) -> (Slab<Node<T>>, Vec<usize>) {
        let mut order = Vec::with_capacity(self.len());
        let mut node = self.edge(self.root, LEFT);
        while !node.is_sentinel() {
            order.push(node.slot());
            node = self.next(node, RIGHT);
        }
        (self.slab, order)
    }

    /// In-order neighbour in direction `dir`
    ///
    /// Stepping left from the sentinel lands on the maximum so that the end
    /// position can be walked backwards; stepping right from it stays put.
    pub fn step(&self, this: NodeRef, dir: usize) -> NodeRef {
        if this.is_sentinel() {
            return if dir == LEFT {
                self.edge(self.root, RIGHT)
            } else {
                SENTINEL
            };
        }
        self.next(this, dir)
    }

    fn next(&self, mut this: NodeRef, dir: usize) -> NodeRef {
        let child = self[this].children[dir];
        if !child.is_sentinel() {
            return self.edge(child, dir ^ 1);
        }
        let mut y = self[this].parent;
        while !y.is_sentinel() && this == self[y].children[dir] {
            this = y;
            y = self[y].parent;
        }
        y
    }

    /// The extreme node of the subtree at `this` in direction `dir`
    pub fn edge(&self, mut this: NodeRef, dir: usize) -> NodeRef {
        if this.is_sentinel() {
            return SENTINEL;
        }
        let mut node = self[this].children[dir];
        while !node.is_sentinel() {
            this = node;
            node = self[this].children[dir];
        }
        this
    }

    fn reset_sentinel(&mut self) {
        self.nil = Links::nil();
    }

    fn rotate(&mut self, x: NodeRef, dir: usize) {
        debug_assert!(dir == 0 || dir == 1);
        let dir = dir & 1;
        let y = self[x].children[dir ^ 1];
        self[x].children[dir ^ 1] = self[y].children[dir];
        let y_child = self[y].children[dir];
        if !y_child.is_sentinel() {
            self[y_child].parent = x;
        }
        self.replace(x, y);
        self[y].children[dir] = x;
        self[x].parent = y;
    }

    /// Puts `with` where `node` hangs from its parent
    ///
    /// `with` may be the sentinel, whose parent is then recorded for
    /// [Self::delete_fixup].
    fn replace(&mut self, node: NodeRef, with: NodeRef) {
        let parent = self[node].parent;
        self[with].parent = parent;
        if parent.is_sentinel() {
            self.root = with;
        } else {
            let parent = &mut self[parent];
            let dir = if parent.children[0] == node { 0 } else { 1 };
            parent.children[dir] = with;
        }
    }

    /// Links a new red node as child `dir` of `parent` and rebalances
    ///
    /// `parent.children[dir]` must be the sentinel. A sentinel `parent`
    /// means the tree is empty and the node becomes the root.
    pub fn attach(&mut self, parent: NodeRef, dir: usize, item: T) -> NodeRef {
        let z = NodeRef(
            self.slab.insert(Node {
                links: Links {
                    parent,
                    children: [SENTINEL, SENTINEL],
                    red: true,
                },
                item,
            }) + 1,
        );
        if parent.is_sentinel() {
            self.root = z;
        } else {
            debug_assert!(self[parent].children[dir].is_sentinel());
            self[parent].children[dir] = z;
        }
        self.insert_fixup(z);
        z
    }

    /// Unlinks `z`, rebalances and hands back its item
    ///
    /// When `z` has two children its in-order successor is moved into
    /// `z`'s position, so no item changes node and every other handle
    /// keeps pointing at the same item.
    pub fn delete(&mut self, z: NodeRef) -> T {
        let zl = self[z].children[LEFT];
        let zr = self[z].children[RIGHT];
        let (x, removed_red) = if zl.is_sentinel() || zr.is_sentinel() {
            let x = if zl.is_sentinel() { zr } else { zl };
            let red = self[z].red;
            self.replace(z, x);
            (x, red)
        } else {
            let y = self.edge(zr, LEFT);
            let red = self[y].red;
            let x = self[y].children[RIGHT];
            if self[y].parent == z {
                self[x].parent = y;
            } else {
                self.replace(y, x);
                self[y].children[RIGHT] = zr;
                self[zr].parent = y;
            }
            self.replace(z, y);
            self[y].children[LEFT] = zl;
            self[zl].parent = y;
            self[y].red = self[z].red;
            (x, red)
        };

        if !removed_red {
            self.delete_fixup(x);
        }
        self.reset_sentinel();
        self.slab.remove(z.slot()).item
    }

    fn insert_fixup(&mut self, mut z: NodeRef) {
        let mut p = self[z].parent;
        let mut pp: NodeRef;

        while self[p].red {
            p = self[z].parent;
            pp = self[p].parent;

            let dir = if self[pp].children[0] == p { 1 } else { 0 };

            let y = self[pp].children[dir];

            if self[y].red {
                self[p].red = false;
                self[y].red = false;
                self[pp].red = true;
                z = pp;

                // recompute parent and grandparent after changing z
                p = self[z].parent;
            } else {
                // y is black, or nil sentinel
                if z == self[p].children[dir] {
                    z = p;

                    self.rotate(z, dir ^ 1);

                    // recompute parent and grandparent after rotation
                    p = self[z].parent;
                    pp = self[p].parent;
                }
                self[p].red = false;
                self[pp].red = true;
                self.rotate(pp, dir);
            }
        }

        // blacken the root
        let root = self.root;
        self[root].red = false;
    }

    fn delete_fixup(&mut self, mut x: NodeRef) {
        let mut p: NodeRef;
        while x != self.root && !self[x].red {
            p = self[x].parent;
            let dir = if x == self[p].children[0] { 1 } else { 0 };
            let mut w = self[p].children[dir];
            if self[w].red {
                self[w].red = false;
                self[p].red = true;
                self.rotate(p, dir ^ 1);

                // recompute w after the rotation of p
                w = self[p].children[dir];
            }
            let wl = self[w].children[0];
            let wr = self[w].children[1];
            if !self[wl].red && !self[wr].red {
                self[w].red = true;
                x = p;
            } else {
                let mut wc = self[w].children[dir]; // far child
                let wo = self[w].children[dir ^ 1]; // near child
                if !self[wc].red {
                    self[wo].red = false;
                    self[w].red = true;
                    self.rotate(w, dir);
                    w = self[p].children[dir];

                    // recompute wc after the rotation of w
                    wc = self[w].children[dir];
                }
                self[w].red = self[p].red;
                self[p].red = false;
                self[wc].red = false;
                self.rotate(p, dir ^ 1);
                x = self.root
            }
        }

        // blacken x
        self[x].red = false;
    }

    /// Checks the structural red-black properties and returns the black-height
    ///
    /// Walks with an explicit stack so a corrupted, degenerate tree cannot
    /// overflow the call stack.
    pub fn check(&self) -> Result<usize, InvariantError> {
        if self.nil.red {
            return Err(InvariantError::RedSentinel);
        }
        if self[self.root].red {
            return Err(InvariantError::RedRoot);
        }
        if !self[self.root].parent.is_sentinel() {
            return Err(InvariantError::BrokenParentLink(self.root));
        }

        let mut black_height = None;
        let mut reachable = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((node, blacks)) = stack.pop() {
            if node.is_sentinel() {
                match black_height {
                    None => black_height = Some(blacks),
                    Some(expected) if expected != blacks => {
                        return Err(InvariantError::BlackHeightMismatch {
                            expected,
                            found: blacks,
                        });
                    }
                    Some(_) => {}
                }
                continue;
            }
            reachable += 1;
            let links = &self[node];
            let blacks = blacks + usize::from(!links.red);
            for child in links.children {
                if !child.is_sentinel() {
                    if self[child].parent != node {
                        return Err(InvariantError::BrokenParentLink(child));
                    }
                    // red node must not have red children
                    if links.red && self[child].red {
                        return Err(InvariantError::RedChildOfRed(child));
                    }
                }
                stack.push((child, blacks));
            }
        }

        if reachable != self.len() {
            return Err(InvariantError::SizeMismatch {
                recorded: self.len(),
                reachable,
            });
        }
        Ok(black_height.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(rb: &mut RbSlab<i32>, key: i32) -> NodeRef {
        let mut parent = SENTINEL;
        let mut dir = LEFT;
        let mut x = rb.root;
        while !x.is_sentinel() {
            parent = x;
            dir = if key < *rb.item(x) { LEFT } else { RIGHT };
            x = rb[x].children[dir];
        }
        rb.attach(parent, dir, key)
    }

    fn in_order(rb: &RbSlab<i32>) -> Vec<i32> {
        let mut keys = vec![];
        let mut node = rb.edge(rb.root, LEFT);
        while !node.is_sentinel() {
            keys.push(*rb.item(node));
            node = rb.step(node, RIGHT);
        }
        keys
    }

    #[test]
    fn test_basic_insert() {
        let mut rb = RbSlab::with_capacity(0);

        insert(&mut rb, 5);
        insert(&mut rb, 6);
        insert(&mut rb, 7);

        // a straight line gets rotated into a balanced triple
        assert_eq!(*rb.item(rb.root), 6);
        assert_eq!(in_order(&rb), [5, 6, 7]);
        assert_eq!(rb.check(), Ok(1));
    }

    #[test]
    fn test_basic_rotation() {
        let mut rb = RbSlab::with_capacity(0);

        insert(&mut rb, 5); // x
        insert(&mut rb, 1); // alpha
        insert(&mut rb, 8); // y
        insert(&mut rb, 7); // beta
        insert(&mut rb, 9); // gamma

        /*
         *      x
         *     / \
         *    /   y
         *   a   / \
         *      b   g
         */

        let (x, a, y, b, g) = (NodeRef(1), NodeRef(2), NodeRef(3), NodeRef(4), NodeRef(5));
        assert_eq!(*rb.item(x), 5);
        assert_eq!(rb[x].parent, SENTINEL);
        assert_eq!(rb[x].children, [a, y]);
        assert_eq!(rb[a].children, [SENTINEL, SENTINEL]);
        assert_eq!(rb[y].parent, x);
        assert_eq!(rb[y].children, [b, g]);
        assert_eq!(rb[b].parent, y);
        assert_eq!(rb[g].parent, y);

        rb.rotate(x, LEFT);

        /*
         *      y
         *     / \
         *    x   g
         *   / \
         *  a   b
         */

        // slab entries should be the same, but their links should reflect the new tree topology
        assert_eq!(rb.root, y);
        assert_eq!(rb[y].parent, SENTINEL);
        assert_eq!(rb[y].children, [x, g]);
        assert_eq!(rb[x].parent, y);
        assert_eq!(rb[x].children, [a, b]);
        assert_eq!(rb[a].parent, x);
        assert_eq!(rb[b].parent, x);
        assert_eq!(in_order(&rb), [1, 5, 7, 8, 9]);

        rb.rotate(y, RIGHT); // brings our tree back to the original

        assert_eq!(rb.root, x);
        assert_eq!(rb[x].children, [a, y]);
        assert_eq!(rb[y].children, [b, g]);
        assert_eq!(rb[b].parent, y);
        assert_eq!(in_order(&rb), [1, 5, 7, 8, 9]);
    }

    #[test]
    fn test_delete_relinks_successor() {
        let mut rb = RbSlab::with_capacity(0);
        let refs: Vec<_> = [4, 2, 6, 1, 3, 5, 7].into_iter().map(|k| insert(&mut rb, k)).collect();

        let root = rb.root;
        assert_eq!(*rb.item(root), 4);
        assert_eq!(rb.delete(root), 4);

        // the successor node moved up, every other handle still sees its own key
        for (r, key) in refs.iter().zip([4, 2, 6, 1, 3, 5, 7]) {
            if *r != root {
                assert_eq!(rb.get(*r), Some(&key));
            }
        }
        assert_eq!(*rb.item(rb.root), 5);
        assert_eq!(in_order(&rb), [1, 2, 3, 5, 6, 7]);
        assert!(rb.check().is_ok());
        assert!(rb.nil.parent.is_sentinel());
    }

    #[test]
    fn test_delete_down_to_empty() {
        let mut rb = RbSlab::with_capacity(0);
        let refs: Vec<_> = (0..64).map(|k| insert(&mut rb, k)).collect();
        for r in refs.into_iter().rev() {
            rb.delete(r);
            assert!(rb.check().is_ok());
        }
        assert!(rb.root.is_sentinel());
        assert_eq!(rb.len(), 0);
    }

    #[test]
    fn test_step_from_sentinel() {
        let mut rb = RbSlab::with_capacity(4);
        assert!(rb.step(SENTINEL, LEFT).is_sentinel());
        for k in [3, 1, 2] {
            insert(&mut rb, k);
        }
        assert_eq!(rb.get(rb.step(SENTINEL, LEFT)), Some(&3));
        assert!(rb.step(SENTINEL, RIGHT).is_sentinel());
    }

    #[test]
    fn test_check_reports_violations() {
        let mut rb = RbSlab::with_capacity(0);
        for k in [2, 1, 3] {
            insert(&mut rb, k);
        }
        let root = rb.root;
        rb[root].red = true;
        assert_eq!(rb.check(), Err(InvariantError::RedRoot));
        rb[root].red = false;

        let left = rb[root].children[LEFT];
        rb[left].red = false;
        assert_eq!(
            rb.check(),
            Err(InvariantError::BlackHeightMismatch { expected: 1, found: 2 })
        );
    }
}
