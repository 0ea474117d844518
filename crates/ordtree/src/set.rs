use crate::alloc::{Global, NodeAllocator};
use crate::config::TreeConfig;
use crate::cursor::{IntoIter, Iter};
use crate::rb_base::NodeRef;
use crate::tree::Tree;
use compare::{Compare, Natural};
use std::fmt;

/// An ordered set of unique items
#[derive(Clone)]
pub struct Set<T, C = Natural<T>, A = Global> {
    tree: Tree<T, C, A>,
}

/// An ordered collection allowing equal items
///
/// Equal items are kept in insertion order.
#[derive(Clone)]
pub struct MultiSet<T, C = Natural<T>, A = Global> {
    tree: Tree<T, C, A>,
}

impl<T: Ord> Set<T> {
    /// Creates an empty set in natural order
    pub fn new() -> Self {
        Self::with_cmp(compare::natural())
    }
}

impl<T: Ord> Default for Set<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Compare<T>> Set<T, C> {
    /// Creates an empty set ordered by `cmp`
    pub fn with_cmp(cmp: C) -> Self {
        Self::with_allocator(cmp, Global)
    }

    /// Adds `value`; returns `false` if an equal item was already present
    pub fn insert(&mut self, value: T) -> bool {
        let Ok(inserted) = self.try_insert(value);
        inserted
    }

    /// Like [Self::insert], also returning the node holding the item
    pub fn insert_full(&mut self, value: T) -> (NodeRef, bool) {
        let Ok(result) = self.tree.insert(value);
        result
    }

    /// Builds the item in place and inserts it
    pub fn emplace<F: FnOnce() -> T>(&mut self, make: F) -> (NodeRef, bool) {
        let Ok(result) = self.tree.try_insert_with(|| Ok::<_, std::convert::Infallible>(make()));
        result
    }

    /// Moves over every item of `other` not already present here
    ///
    /// Items that were already present stay in `other`.
    pub fn merge(&mut self, other: &mut Self) {
        let Ok(()) = self.try_merge(other);
    }
}

impl<T, C: Compare<T>, A: NodeAllocator> Set<T, C, A> {
    /// Creates an empty set with a node allocator
    pub fn with_allocator(cmp: C, alloc: A) -> Self {
        Self {
            tree: Tree::with_allocator(cmp, TreeConfig::unique(), alloc),
        }
    }

    /// Fallible [Set::insert]
    pub fn try_insert(&mut self, value: T) -> Result<bool, A::Error> {
        self.tree.insert(value).map(|(_, inserted)| inserted)
    }

    /// Fallible [Set::insert_full]
    pub fn try_insert_full(&mut self, value: T) -> Result<(NodeRef, bool), A::Error> {
        self.tree.insert(value)
    }

    /// Fallible [Set::emplace]; see [Tree::try_insert_with]
    pub fn try_emplace<E, F>(&mut self, make: F) -> Result<(NodeRef, bool), E>
    where
        E: From<A::Error>,
        F: FnOnce() -> Result<T, E>,
    {
        self.tree.try_insert_with(make)
    }

    /// Fallible [Set::merge]
    ///
    /// Stops at the first refused allocation; items moved so far stay moved.
    pub fn try_merge(&mut self, other: &mut Self) -> Result<(), A::Error> {
        let mut movable = vec![];
        let mut node = other.tree.first_node();
        while !other.tree.is_nil(node) {
            if !self.tree.contains(&other.tree[node]) {
                movable.push(node);
            }
            node = other.tree.next_node(node);
        }
        for node in movable {
            self.tree.reserve()?;
            if let Some(item) = other.tree.remove_at(node) {
                self.tree.insert_reserved(item);
            }
        }
        Ok(())
    }

    /// Removes the item equal to `value`
    pub fn remove(&mut self, value: &T) -> Option<T> {
        self.tree.remove_node(value)
    }

    /// Removes the item at `node`
    pub fn erase(&mut self, node: NodeRef) -> Option<T> {
        self.tree.remove_at(node)
    }

    /// The stored item equal to `value`
    pub fn find(&self, value: &T) -> Option<&T> {
        self.tree.get(self.tree.find_node(value))
    }

    /// The node holding the item equal to `value`, or the sentinel
    pub fn find_node(&self, value: &T) -> NodeRef {
        self.tree.find_node(value)
    }

    /// Check if an item equal to `value` is stored
    pub fn contains(&self, value: &T) -> bool {
        self.tree.contains(value)
    }

    /// 1 if `value` is stored, 0 otherwise
    pub fn count(&self, value: &T) -> usize {
        self.tree.count(value)
    }

    /// The first item not less than `value`
    pub fn lower_bound(&self, value: &T) -> Option<&T> {
        self.tree.get(self.tree.lower_bound(value))
    }

    /// The first item greater than `value`
    pub fn upper_bound(&self, value: &T) -> Option<&T> {
        self.tree.get(self.tree.upper_bound(value))
    }

    /// Removes everything
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<T, C, A> Set<T, C, A> {
    /// Number of items
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if the set contains nothing
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// The smallest item
    pub fn first(&self) -> Option<&T> {
        self.tree.get(self.tree.first_node())
    }

    /// The largest item
    pub fn last(&self) -> Option<&T> {
        self.tree.get(self.tree.last_node())
    }

    /// Exchanges contents with `other`
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Iterates over the items in order
    pub fn iter(&self) -> Iter<'_, T> {
        self.tree.iter()
    }

    /// The underlying tree
    pub fn tree(&self) -> &Tree<T, C, A> {
        &self.tree
    }
}

impl<T: Ord> MultiSet<T> {
    /// Creates an empty multi-set in natural order
    pub fn new() -> Self {
        Self::with_cmp(compare::natural())
    }
}

impl<T: Ord> Default for MultiSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Compare<T>> MultiSet<T, C> {
    /// Creates an empty multi-set ordered by `cmp`
    pub fn with_cmp(cmp: C) -> Self {
        Self::with_allocator(cmp, Global)
    }

    /// Adds `value` after every equal item and returns its node
    pub fn insert(&mut self, value: T) -> NodeRef {
        let Ok(node) = self.try_insert(value);
        node
    }

    /// Builds the item in place and inserts it
    pub fn emplace<F: FnOnce() -> T>(&mut self, make: F) -> NodeRef {
        self.insert(make())
    }

    /// Moves every item of `other` over, leaving it empty
    pub fn merge(&mut self, other: &mut Self) {
        let Ok(()) = self.try_merge(other);
    }
}

impl<T, C: Compare<T>, A: NodeAllocator> MultiSet<T, C, A> {
    /// Creates an empty multi-set with a node allocator
    pub fn with_allocator(cmp: C, alloc: A) -> Self {
        Self {
            tree: Tree::with_allocator(cmp, TreeConfig::multi(), alloc),
        }
    }

    /// Fallible [MultiSet::insert]
    pub fn try_insert(&mut self, value: T) -> Result<NodeRef, A::Error> {
        self.tree.insert(value).map(|(node, _)| node)
    }

    /// Fallible [MultiSet::emplace]; see [Tree::try_insert_with]
    pub fn try_emplace<E, F>(&mut self, make: F) -> Result<NodeRef, E>
    where
        E: From<A::Error>,
        F: FnOnce() -> Result<T, E>,
    {
        self.tree.try_insert_with(make).map(|(node, _)| node)
    }

    /// Fallible [MultiSet::merge]
    ///
    /// Stops at the first refused allocation; items moved so far stay moved.
    pub fn try_merge(&mut self, other: &mut Self) -> Result<(), A::Error> {
        while !other.is_empty() {
            self.tree.reserve()?;
            let first = other.tree.first_node();
            if let Some(item) = other.tree.remove_at(first) {
                self.tree.insert_reserved(item);
            }
        }
        Ok(())
    }

    /// Removes one item equal to `value` (the first inserted)
    pub fn remove(&mut self, value: &T) -> Option<T> {
        self.tree.remove_node(value)
    }

    /// Removes the item at `node`
    pub fn erase(&mut self, node: NodeRef) -> Option<T> {
        self.tree.remove_at(node)
    }

    /// The first stored item equal to `value`
    pub fn find(&self, value: &T) -> Option<&T> {
        self.tree.get(self.tree.find_node(value))
    }

    /// The node of the first item equal to `value`, or the sentinel
    pub fn find_node(&self, value: &T) -> NodeRef {
        self.tree.find_node(value)
    }

    /// Check if an item equal to `value` is stored
    pub fn contains(&self, value: &T) -> bool {
        self.tree.contains(value)
    }

    /// Multiplicity of `value`
    pub fn count(&self, value: &T) -> usize {
        self.tree.count(value)
    }

    /// The first item not less than `value`
    pub fn lower_bound(&self, value: &T) -> Option<&T> {
        self.tree.get(self.tree.lower_bound(value))
    }

    /// The first item greater than `value`
    pub fn upper_bound(&self, value: &T) -> Option<&T> {
        self.tree.get(self.tree.upper_bound(value))
    }

    /// All items equal to `value`, in insertion order
    pub fn equal_range(&self, value: &T) -> impl Iterator<Item = &T> + '_ {
        let end = self.tree.upper_bound(value);
        let mut node = self.tree.lower_bound(value);
        std::iter::from_fn(move || {
            if node == end {
                return None;
            }
            let item = self.tree.get(node);
            node = self.tree.next_node(node);
            item
        })
    }

    /// Removes everything
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<T, C, A> MultiSet<T, C, A> {
    /// Number of items, counting duplicates
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if the multi-set contains nothing
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// The smallest item
    pub fn first(&self) -> Option<&T> {
        self.tree.get(self.tree.first_node())
    }

    /// The largest item
    pub fn last(&self) -> Option<&T> {
        self.tree.get(self.tree.last_node())
    }

    /// Exchanges contents with `other`
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Iterates over the items in order
    pub fn iter(&self) -> Iter<'_, T> {
        self.tree.iter()
    }

    /// The underlying tree
    pub fn tree(&self) -> &Tree<T, C, A> {
        &self.tree
    }
}

impl<T: fmt::Debug, C, A> fmt::Debug for Set<T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: fmt::Debug, C, A> fmt::Debug for MultiSet<T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, C, A> PartialEq for Set<T, C, A> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<T: PartialEq, C, A> PartialEq for MultiSet<T, C, A> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<T, C: Compare<T>> Extend<T> for Set<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.tree.extend(iter);
    }
}

impl<T, C: Compare<T>> Extend<T> for MultiSet<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.tree.extend(iter);
    }
}

impl<T: Ord> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Set::new();
        set.extend(iter);
        set
    }
}

impl<T: Ord> FromIterator<T> for MultiSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = MultiSet::new();
        set.extend(iter);
        set
    }
}

impl<'a, T, C, A> IntoIterator for &'a Set<T, C, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, C, A> IntoIterator for &'a MultiSet<T, C, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, C, A> IntoIterator for Set<T, C, A> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}

impl<T, C, A> IntoIterator for MultiSet<T, C, A> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::Bounded;
    use crate::error::AllocError;

    fn items<T: Clone>(iter: Iter<'_, T>) -> Vec<T> {
        iter.cloned().collect()
    }

    #[test]
    fn test_set_from_list() {
        let set: Set<i32> = [1, 3, 6, 7, 8].into_iter().collect();
        assert_eq!(set.len(), 5);
        assert!(!set.is_empty());
        assert_eq!(items(set.iter()), [1, 3, 6, 7, 8]);
        assert_eq!(set.first(), Some(&1));
        assert_eq!(set.last(), Some(&8));
    }

    #[test]
    fn test_set_insert_twice() {
        let mut set = Set::new();
        let (first, inserted) = set.insert_full(1);
        assert!(inserted);
        let (again, inserted) = set.insert_full(1);
        assert!(!inserted);
        assert_eq!(first, again);
        assert!(!set.insert(1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_set_erase() {
        let mut set: Set<i32> = [1, 3, 6, 7, 8].into_iter().collect();
        let node = set.find_node(&3);
        assert_eq!(set.erase(node), Some(3));
        assert_eq!(items(set.iter()), [1, 6, 7, 8]);
        assert_eq!(set.find(&3), None);
        assert_eq!(set.remove(&3), None);
    }

    #[test]
    fn test_set_swap() {
        let mut one: Set<i32> = [1, 2, 3].into_iter().collect();
        let mut two: Set<i32> = [4, 5, 6].into_iter().collect();
        one.swap(&mut two);
        assert_eq!(items(two.iter()), [1, 2, 3]);
        assert_eq!(items(one.iter()), [4, 5, 6]);
    }

    #[test]
    fn test_set_merge() {
        let mut ma: Set<i32> = [1, 3, 6].into_iter().collect();
        let mut mb: Set<i32> = [3, 7, 8].into_iter().collect();
        let mut u = Set::new();
        u.merge(&mut ma);
        assert!(ma.is_empty());
        u.merge(&mut mb);
        assert_eq!(items(mb.iter()), [3]);
        assert_eq!(items(u.iter()), [1, 3, 6, 7, 8]);
        u.tree().validate().unwrap();
        mb.tree().validate().unwrap();
    }

    #[test]
    fn test_set_emplace() {
        let mut set = Set::new();
        set.emplace(|| "first".to_string());
        set.emplace(|| "second".to_string());
        let (_, inserted) = set.emplace(|| "second".to_string());
        assert!(!inserted);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_set_custom_order() {
        let mut set = Set::with_cmp(|l: &&str, r: &&str| l.len().cmp(&r.len()));
        set.extend(["ccc", "a", "bb", "dd"]);
        // "dd" has the same length as "bb" and is rejected
        assert_eq!(items(set.iter()), ["a", "bb", "ccc"]);
        assert!(set.contains(&"zz"));
    }

    #[test]
    fn test_set_bounded_merge_stops() {
        let mut small = Set::with_allocator(compare::natural(), Bounded::new(2));
        let mut other = Set::with_allocator(compare::natural(), Bounded::new(8));
        for v in [1, 2, 3] {
            other.try_insert(v).unwrap();
        }
        assert_eq!(small.try_merge(&mut other), Err(AllocError { limit: 2 }));
        assert_eq!(items(small.iter()), [1, 2]);
        assert_eq!(items(other.iter()), [3]);
        assert_eq!(other.tree().allocator().in_use(), 1);
    }

    #[test]
    fn test_multiset_from_list() {
        let set: MultiSet<i32> = [1, 3, 6, 6, 7, 8, 8].into_iter().collect();
        assert_eq!(set.len(), 7);
        assert_eq!(items(set.iter()), [1, 3, 6, 6, 7, 8, 8]);
    }

    #[test]
    fn test_multiset_insert_twice() {
        let mut set = MultiSet::new();
        let a = set.insert(1);
        let b = set.insert(1);
        assert_ne!(a, b);
        assert_eq!(set.count(&1), 2);
        // the later insertion sorts after the earlier one
        assert_eq!(set.tree().next_node(a), b);
    }

    #[test]
    fn test_multiset_erase_one() {
        let mut set: MultiSet<i32> = [1, 3, 6, 6, 7, 8, 8].into_iter().collect();
        assert_eq!(set.remove(&8), Some(8));
        assert_eq!(set.erase(set.find_node(&3)), Some(3));
        assert_eq!(items(set.iter()), [1, 6, 6, 7, 8]);
        set.tree().validate().unwrap();
    }

    #[test]
    fn test_multiset_merge_moves_everything() {
        let mut ma: MultiSet<i32> = [1, 3, 6].into_iter().collect();
        let mut mb: MultiSet<i32> = [3, 7, 8].into_iter().collect();
        let mut u = MultiSet::new();
        u.merge(&mut ma);
        u.merge(&mut mb);
        assert!(ma.is_empty());
        assert!(mb.is_empty());
        assert_eq!(items(u.iter()), [1, 3, 3, 6, 7, 8]);
    }

    #[test]
    fn test_multiset_count_and_bounds() {
        let set: MultiSet<i32> = [1, 3, 3, 6, 7, 8].into_iter().collect();
        assert_eq!(set.count(&3), 2);
        assert_eq!(set.count(&1), 1);
        assert_eq!(set.count(&0), 0);
        assert_eq!(set.lower_bound(&4), Some(&6));
        assert_eq!(set.upper_bound(&7), Some(&8));
        assert_eq!(set.lower_bound(&1), Some(&1));
        assert_eq!(set.upper_bound(&-1), Some(&1));
        assert_eq!(set.upper_bound(&8), None);
        assert_eq!(set.equal_range(&3).count(), 2);
        assert_eq!(set.equal_range(&4).count(), 0);
    }

    #[test]
    fn test_multiset_keeps_insertion_order_of_equals() {
        let mut set = MultiSet::with_cmp(|l: &(char, u8), r: &(char, u8)| l.0.cmp(&r.0));
        for item in [('b', 0), ('a', 1), ('b', 2), ('b', 3), ('a', 4)] {
            set.insert(item);
        }
        let tags: Vec<_> = set.equal_range(&('b', 9)).map(|(_, tag)| *tag).collect();
        assert_eq!(tags, [0, 2, 3]);
        assert_eq!(set.remove(&('b', 9)), Some(('b', 0)));
        assert_eq!(set.find(&('a', 9)), Some(&('a', 1)));
    }

    #[test]
    fn test_debug_and_eq() {
        let a: Set<i32> = [2, 1].into_iter().collect();
        let b: Set<i32> = [1, 2].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(format!("{a:?}"), "{1, 2}");
        let m: MultiSet<i32> = [2, 2].into_iter().collect();
        assert_eq!(format!("{m:?}"), "{2, 2}");
        assert_eq!(m.clone().into_iter().collect::<Vec<_>>(), [2, 2]);
    }
}
