use crate::alloc::{Global, NodeAllocator};
use crate::config::TreeConfig;
use crate::cursor::{Cursor, IntoIter, Iter};
use crate::error::InvariantError;
use crate::rb_base::{Color, NodeRef, RbSlab, LEFT, RIGHT, SENTINEL};
use compare::{Compare, Natural};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;

/// A red-black tree keeping its items sorted by a comparator
///
/// This is the engine behind [Set](crate::Set), [MultiSet](crate::MultiSet)
/// and [Map](crate::Map). Nodes are addressed by [NodeRef] handles, and the
/// end position is the sentinel handle ([Tree::sentinel_node]).
///
/// Changing how two stored items compare while they are in the tree is a
/// logic error. The tree stays memory safe, but the order of its items and
/// the results of lookups become unspecified.
#[derive(Clone)]
pub struct Tree<T, C = Natural<T>, A = Global> {
    nodes: RbSlab<T>,
    cmp: C,
    alloc: A,
    config: TreeConfig,
}

impl<T: Ord> Tree<T> {
    /// Creates an empty tree of unique items in their natural order
    pub fn new() -> Self {
        Tree::with_cmp(compare::natural())
    }

    /// Creates an empty tree of items in their natural order, duplicates allowed
    pub fn multi() -> Self {
        Tree::with_config(compare::natural(), TreeConfig::multi())
    }
}

impl<T: Ord> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Compare<T>> Tree<T, C> {
    /// Creates an empty tree of unique items ordered by `cmp`
    pub fn with_cmp(cmp: C) -> Self {
        Self::with_config(cmp, TreeConfig::unique())
    }

    /// Creates an empty tree with explicit settings
    pub fn with_config(cmp: C, config: TreeConfig) -> Self {
        Self::with_allocator(cmp, config, Global)
    }
}

impl<T, C: Compare<T>, A: NodeAllocator> Tree<T, C, A> {
    /// Creates an empty tree whose node budget is governed by `alloc`
    pub fn with_allocator(cmp: C, config: TreeConfig, alloc: A) -> Self {
        Self {
            nodes: RbSlab::with_capacity(config.capacity),
            cmp,
            alloc,
            config,
        }
    }

    /// The comparator ordering the items
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// The settings the tree was created with
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The node allocator
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Inserts `item` without consulting the duplicate policy
    ///
    /// An item equal to stored ones goes after all of them, so equal items
    /// keep their insertion order. Fails only if the allocator refuses, in
    /// which case the tree is unchanged.
    pub fn insert_node(&mut self, item: T) -> Result<NodeRef, A::Error> {
        let (parent, dir) = self.leaf_slot(&item);
        self.alloc.allocate()?;
        Ok(self.link(parent, dir, item))
    }

    /// Inserts `item` following the configured [Duplicates](crate::Duplicates) policy
    ///
    /// Returns the node holding the item and whether it was newly inserted.
    /// When duplicates are rejected and an equal item exists, that item's
    /// node is returned with `false` and `item` is dropped.
    pub fn insert(&mut self, item: T) -> Result<(NodeRef, bool), A::Error> {
        match self.locate(&item) {
            Err(existing) => Ok((existing, false)),
            Ok((parent, dir)) => {
                self.alloc.allocate()?;
                Ok((self.link(parent, dir, item), true))
            }
        }
    }

    /// Reserves a node, then builds the item with `make` and inserts it
    ///
    /// If `make` fails or panics the reservation is released; the tree is
    /// never touched before the item exists.
    pub fn try_insert_with<E, F>(&mut self, make: F) -> Result<(NodeRef, bool), E>
    where
        E: From<A::Error>,
        F: FnOnce() -> Result<T, E>,
    {
        self.reserve()?;
        let reservation = Reservation(Some(&mut self.alloc));
        let item = make()?;
        reservation.keep();
        Ok(self.insert_reserved(item))
    }

    pub(crate) fn reserve(&mut self) -> Result<(), A::Error> {
        self.alloc.allocate()
    }

    /// Inserts into a slot obtained from [Self::reserve]
    pub(crate) fn insert_reserved(&mut self, item: T) -> (NodeRef, bool) {
        match self.locate(&item) {
            Err(existing) => {
                self.alloc.deallocate(1);
                (existing, false)
            }
            Ok((parent, dir)) => (self.link(parent, dir, item), true),
        }
    }

    fn link(&mut self, parent: NodeRef, dir: usize, item: T) -> NodeRef {
        let node = self.nodes.attach(parent, dir, item);
        log::trace!("linked {node:?}, {} nodes", self.len());
        node
    }

    /// Leaf position for `item`, equal items going right
    fn leaf_slot(&self, item: &T) -> (NodeRef, usize) {
        let mut parent = SENTINEL;
        let mut dir = LEFT;
        let mut curr = self.nodes.root;
        while !curr.is_sentinel() {
            parent = curr;
            dir = if self.cmp.compares_lt(item, self.nodes.item(curr)) {
                LEFT
            } else {
                RIGHT
            };
            curr = self.nodes[curr].children[dir];
        }
        (parent, dir)
    }

    /// Leaf position for `item`, or the equal node if duplicates are rejected
    fn locate(&self, item: &T) -> Result<(NodeRef, usize), NodeRef> {
        if self.config.allows_duplicates() {
            return Ok(self.leaf_slot(item));
        }
        let mut parent = SENTINEL;
        let mut dir = LEFT;
        let mut curr = self.nodes.root;
        while !curr.is_sentinel() {
            dir = match self.cmp.compare(item, self.nodes.item(curr)) {
                Ordering::Equal => return Err(curr),
                Ordering::Less => LEFT,
                Ordering::Greater => RIGHT,
            };
            parent = curr;
            curr = self.nodes[curr].children[dir];
        }
        Ok((parent, dir))
    }

    /// Finds a node equal to `item`, or the sentinel
    ///
    /// With duplicates allowed this is the first of the equal nodes.
    pub fn find_node(&self, item: &T) -> NodeRef {
        self.find_node_by(|probe| self.cmp.compare(probe, item))
    }

    /// Like [Self::find_node] with a custom probe
    ///
    /// `f` reports how a stored item compares to the one searched for, the
    /// way [slice::binary_search_by] does. It must agree with the tree's
    /// comparator.
    pub fn find_node_by<F: FnMut(&T) -> Ordering>(&self, mut f: F) -> NodeRef {
        let mut curr = self.nodes.root;
        let mut found = SENTINEL;
        while !curr.is_sentinel() {
            match f(self.nodes.item(curr)) {
                Ordering::Less => curr = self.nodes[curr].children[RIGHT],
                Ordering::Greater => curr = self.nodes[curr].children[LEFT],
                Ordering::Equal => {
                    if !self.config.allows_duplicates() {
                        return curr;
                    }
                    found = curr;
                    curr = self.nodes[curr].children[LEFT];
                }
            }
        }
        found
    }

    /// Removes an item equal to `item`
    ///
    /// Does nothing and returns `None` if no such item exists.
    pub fn remove_node(&mut self, item: &T) -> Option<T> {
        let node = self.find_node(item);
        self.remove_at(node)
    }

    /// Removes the item at `node`
    ///
    /// Returns `None` for the sentinel or a handle whose node is gone.
    /// Handles to every other node stay valid.
    pub fn remove_at(&mut self, node: NodeRef) -> Option<T> {
        if !self.nodes.contains(node) {
            return None;
        }
        let item = self.nodes.delete(node);
        self.alloc.deallocate(1);
        log::trace!("unlinked {node:?}, {} nodes", self.len());
        Some(item)
    }

    /// Removes everything
    pub fn clear(&mut self) {
        let released = self.len();
        self.nodes.clear();
        self.alloc.deallocate(released);
        log::trace!("cleared {released} nodes");
    }

    /// Number of items equal to `item`
    pub fn count(&self, item: &T) -> usize {
        let mut node = self.lower_bound(item);
        let mut count = 0;
        while let Some(probe) = self.nodes.get(node)
            && self.cmp.compare(probe, item) == Ordering::Equal
        {
            count += 1;
            node = self.next_node(node);
        }
        count
    }

    /// Check if an item equal to `item` is stored
    pub fn contains(&self, item: &T) -> bool {
        !self.find_node(item).is_sentinel()
    }

    /// First node whose item is not less than `item`, or the sentinel
    pub fn lower_bound(&self, item: &T) -> NodeRef {
        self.lower_bound_by(|probe| self.cmp.compare(probe, item))
    }

    /// First node whose item is greater than `item`, or the sentinel
    pub fn upper_bound(&self, item: &T) -> NodeRef {
        self.upper_bound_by(|probe| self.cmp.compare(probe, item))
    }

    /// [Self::lower_bound] with a probe as in [Self::find_node_by]
    pub fn lower_bound_by<F: FnMut(&T) -> Ordering>(&self, mut f: F) -> NodeRef {
        let mut curr = self.nodes.root;
        let mut candidate = SENTINEL;
        while !curr.is_sentinel() {
            if f(self.nodes.item(curr)) == Ordering::Less {
                curr = self.nodes[curr].children[RIGHT];
            } else {
                candidate = curr;
                curr = self.nodes[curr].children[LEFT];
            }
        }
        candidate
    }

    /// [Self::upper_bound] with a probe as in [Self::find_node_by]
    pub fn upper_bound_by<F: FnMut(&T) -> Ordering>(&self, mut f: F) -> NodeRef {
        let mut curr = self.nodes.root;
        let mut candidate = SENTINEL;
        while !curr.is_sentinel() {
            if f(self.nodes.item(curr)) == Ordering::Greater {
                candidate = curr;
                curr = self.nodes[curr].children[LEFT];
            } else {
                curr = self.nodes[curr].children[RIGHT];
            }
        }
        candidate
    }

    /// Checks every red-black and ordering invariant
    ///
    /// Returns the black-height of the tree (the sentinel not counted).
    pub fn validate(&self) -> Result<usize, InvariantError> {
        let black_height = self.nodes.check()?;
        let allow = self.config.allows_duplicates();
        let mut prev = self.first_node();
        let mut node = self.next_node(prev);
        while !node.is_sentinel() {
            match self.cmp.compare(self.nodes.item(prev), self.nodes.item(node)) {
                Ordering::Greater => return Err(InvariantError::OutOfOrder(node)),
                Ordering::Equal if !allow => return Err(InvariantError::DuplicateItem(node)),
                _ => {}
            }
            prev = node;
            node = self.next_node(node);
        }
        Ok(black_height)
    }
}

impl<T, C, A> Tree<T, C, A> {
    /// Number of items stored
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree contains nothing
    pub fn is_empty(&self) -> bool {
        self.nodes.root.is_sentinel()
    }

    /// The leftmost node, or the sentinel if empty
    pub fn first_node(&self) -> NodeRef {
        self.nodes.edge(self.nodes.root, LEFT)
    }

    /// The rightmost node, or the sentinel if empty
    pub fn last_node(&self) -> NodeRef {
        self.nodes.edge(self.nodes.root, RIGHT)
    }

    /// The end position
    pub fn sentinel_node(&self) -> NodeRef {
        SENTINEL
    }

    /// Check if `node` is the sentinel
    pub fn is_nil(&self, node: NodeRef) -> bool {
        node.is_sentinel()
    }

    /// In-order successor; the sentinel after the last node
    pub fn next_node(&self, node: NodeRef) -> NodeRef {
        self.nodes.step(node, RIGHT)
    }

    /// In-order predecessor; the sentinel before the first node
    ///
    /// The predecessor of the sentinel is the last node.
    pub fn prev_node(&self, node: NodeRef) -> NodeRef {
        self.nodes.step(node, LEFT)
    }

    /// The item at `node`
    pub fn get(&self, node: NodeRef) -> Option<&T> {
        self.nodes.get(node)
    }

    /// The item at `node`, mutably
    ///
    /// The change must not alter how the item compares to the others.
    pub fn get_mut(&mut self, node: NodeRef) -> Option<&mut T> {
        self.nodes.get_mut(node)
    }

    /// Panics on the sentinel or a stale handle
    pub(crate) fn item_mut(&mut self, node: NodeRef) -> &mut T {
        self.nodes.item_mut(node)
    }

    /// Colour of `node`; `None` for a handle whose node is gone
    pub fn color(&self, node: NodeRef) -> Option<Color> {
        if !node.is_sentinel() && !self.nodes.contains(node) {
            return None;
        }
        Some(if self.nodes[node].red {
            Color::Red
        } else {
            Color::Black
        })
    }

    /// Iterates over the items in order
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.nodes)
    }

    /// A cursor at `node`
    pub fn cursor(&self, node: NodeRef) -> Cursor<'_, T> {
        Cursor::new(&self.nodes, node)
    }

    /// A cursor at the first item (the end if empty)
    pub fn cursor_front(&self) -> Cursor<'_, T> {
        self.cursor(self.first_node())
    }

    /// A cursor at the end position
    pub fn cursor_end(&self) -> Cursor<'_, T> {
        self.cursor(SENTINEL)
    }
}

/// A node reserved from an allocator, released on drop unless kept
struct Reservation<'a, A: NodeAllocator>(Option<&'a mut A>);

impl<A: NodeAllocator> Reservation<'_, A> {
    fn keep(mut self) {
        self.0 = None;
    }
}

impl<A: NodeAllocator> Drop for Reservation<'_, A> {
    fn drop(&mut self) {
        if let Some(alloc) = self.0.take() {
            alloc.deallocate(1);
        }
    }
}

impl<T, C, A> Index<NodeRef> for Tree<T, C, A> {
    type Output = T;

    /// Panics on the sentinel or a stale handle
    fn index(&self, node: NodeRef) -> &T {
        self.nodes.item(node)
    }
}

impl<T: fmt::Debug, C, A> fmt::Debug for Tree<T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, C, A> PartialEq for Tree<T, C, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, C, A> Eq for Tree<T, C, A> {}

impl<T, C: Compare<T>> Extend<T> for Tree<T, C, Global> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            let Ok(_) = self.insert(item);
        }
    }
}

impl<T: Ord> FromIterator<T> for Tree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Tree::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, T, C, A> IntoIterator for &'a Tree<T, C, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, C, A> IntoIterator for Tree<T, C, A> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.nodes)
    }
}
