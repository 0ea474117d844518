use crate::alloc::{Global, NodeAllocator};
use crate::config::TreeConfig;
use crate::cursor::{self, IntoIter};
use crate::error::Error;
use crate::rb_base::NodeRef;
use crate::tree::Tree;
use compare::{Compare, Natural};
use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;

/// Orders `(key, value)` pairs by key alone
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyCompare<C>(pub C);

impl<K, V, C: Compare<K>> Compare<(K, V)> for KeyCompare<C> {
    fn compare(&self, l: &(K, V), r: &(K, V)) -> Ordering {
        self.0.compare(&l.0, &r.0)
    }
}

/// An ordered map with unique keys
///
/// Entries live in a [Tree] of `(K, V)` pairs. Inserting an existing key
/// keeps the stored value unless [Map::insert_or_assign] is used.
#[derive(Clone)]
pub struct Map<K, V, C = Natural<K>, A = Global> {
    tree: Tree<(K, V), KeyCompare<C>, A>,
}

impl<K: Ord, V> Map<K, V> {
    /// Creates an empty map ordered by the natural key order
    pub fn new() -> Self {
        Self::with_cmp(compare::natural())
    }
}

impl<K: Ord, V> Default for Map<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C: Compare<K>> Map<K, V, C> {
    /// Creates an empty map ordered by `cmp`
    pub fn with_cmp(cmp: C) -> Self {
        Self::with_allocator(cmp, Global)
    }

    /// Adds `key` with `value` unless the key is present
    ///
    /// Returns `false`, dropping `value`, if the key was already there.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let Ok(inserted) = self.try_insert(key, value);
        inserted
    }

    /// Adds `key` or overwrites its value; returns `true` if the key is new
    pub fn insert_or_assign(&mut self, key: K, value: V) -> bool {
        let Ok(inserted) = self.try_insert_or_assign(key, value);
        inserted
    }

    /// The value of `key`, inserting `V::default()` first if needed
    pub fn entry_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let Ok(value) = self.try_entry_or_default(key);
        value
    }

    /// Builds the entry in place and inserts it unless its key is present
    pub fn emplace<F: FnOnce() -> (K, V)>(&mut self, make: F) -> (NodeRef, bool) {
        let Ok(result) = self.tree.try_insert_with(|| Ok::<_, std::convert::Infallible>(make()));
        result
    }

    /// Moves over every entry of `other` whose key is not present here
    ///
    /// Entries with keys already present stay in `other`.
    pub fn merge(&mut self, other: &mut Self) {
        let Ok(()) = self.try_merge(other);
    }
}

impl<K, V, C: Compare<K>, A: NodeAllocator> Map<K, V, C, A> {
    /// Creates an empty map with a node allocator
    pub fn with_allocator(cmp: C, alloc: A) -> Self {
        Self {
            tree: Tree::with_allocator(KeyCompare(cmp), TreeConfig::unique(), alloc),
        }
    }

    fn find_key(&self, key: &K) -> NodeRef {
        let cmp = &self.tree.comparator().0;
        self.tree.find_node_by(|(k, _)| cmp.compare(k, key))
    }

    /// Fallible [Map::insert]
    pub fn try_insert(&mut self, key: K, value: V) -> Result<bool, A::Error> {
        self.tree.insert((key, value)).map(|(_, inserted)| inserted)
    }

    /// Fallible [Map::insert_or_assign]
    pub fn try_insert_or_assign(&mut self, key: K, value: V) -> Result<bool, A::Error> {
        let node = self.find_key(&key);
        if node.is_sentinel() {
            return self.try_insert(key, value);
        }
        self.tree.item_mut(node).1 = value;
        Ok(false)
    }

    /// Fallible [Map::entry_or_default]
    pub fn try_entry_or_default(&mut self, key: K) -> Result<&mut V, A::Error>
    where
        V: Default,
    {
        let mut node = self.find_key(&key);
        if node.is_sentinel() {
            node = self.tree.insert((key, V::default()))?.0;
        }
        Ok(&mut self.tree.item_mut(node).1)
    }

    /// Fallible [Map::emplace]; see [Tree::try_insert_with]
    pub fn try_emplace<E, F>(&mut self, make: F) -> Result<(NodeRef, bool), E>
    where
        E: From<A::Error>,
        F: FnOnce() -> Result<(K, V), E>,
    {
        self.tree.try_insert_with(make)
    }

    /// Fallible [Map::merge]
    ///
    /// Stops at the first refused allocation; entries moved so far stay moved.
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
            if let Some(entry) = other.tree.remove_at(node) {
                self.tree.insert_reserved(entry);
            }
        }
        Ok(())
    }

    /// The value of `key`
    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.get(self.find_key(key)).map(|(_, v)| v)
    }

    /// The value of `key`, mutably
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let node = self.find_key(key);
        self.tree.get_mut(node).map(|(_, v)| v)
    }

    /// The stored key and value of `key`
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.tree.get(self.find_key(key)).map(|(k, v)| (k, v))
    }

    /// The value of `key`, or [Error::KeyNotFound]
    pub fn at(&self, key: &K) -> Result<&V, Error> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// The value of `key` mutably, or [Error::KeyNotFound]
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V, Error> {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Check if `key` is present
    pub fn contains_key(&self, key: &K) -> bool {
        !self.find_key(key).is_sentinel()
    }

    /// The node holding `key`, or the sentinel
    pub fn find_node(&self, key: &K) -> NodeRef {
        self.find_key(key)
    }

    /// Removes `key` and returns its value
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key` and returns the stored entry
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let node = self.find_key(key);
        self.tree.remove_at(node)
    }

    /// Removes the entry at `node`
    pub fn erase(&mut self, node: NodeRef) -> Option<(K, V)> {
        self.tree.remove_at(node)
    }

    /// The first entry whose key is not less than `key`
    pub fn lower_bound(&self, key: &K) -> Option<(&K, &V)> {
        let cmp = &self.tree.comparator().0;
        let node = self.tree.lower_bound_by(|(k, _)| cmp.compare(k, key));
        self.tree.get(node).map(|(k, v)| (k, v))
    }

    /// The first entry whose key is greater than `key`
    pub fn upper_bound(&self, key: &K) -> Option<(&K, &V)> {
        let cmp = &self.tree.comparator().0;
        let node = self.tree.upper_bound_by(|(k, _)| cmp.compare(k, key));
        self.tree.get(node).map(|(k, v)| (k, v))
    }

    /// Removes everything
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<K, V, C, A> Map<K, V, C, A> {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if the map contains nothing
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// The entry with the smallest key
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.get(self.tree.first_node()).map(|(k, v)| (k, v))
    }

    /// The entry with the largest key
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.get(self.tree.last_node()).map(|(k, v)| (k, v))
    }

    /// Exchanges contents with `other`
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Iterates over the entries in key order
    pub fn iter(&self) -> Entries<'_, K, V> {
        Entries(self.tree.iter())
    }

    /// Iterates over the keys in order
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Iterates over the values in key order
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// The underlying tree of entries
    pub fn tree(&self) -> &Tree<(K, V), KeyCompare<C>, A> {
        &self.tree
    }
}

/// Iterator over the entries of a [Map]
pub struct Entries<'a, K, V>(cursor::Iter<'a, (K, V)>);

impl<K, V> Clone for Entries<'_, K, V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Entries<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(k, v)| (k, v))
    }
}

impl<K, V> ExactSizeIterator for Entries<'_, K, V> {}
impl<K, V> FusedIterator for Entries<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug, C, A> fmt::Debug for Map<K, V, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, C, A> PartialEq for Map<K, V, C, A> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<K: Eq, V: Eq, C, A> Eq for Map<K, V, C, A> {}

/// Entries whose key is already present are dropped, as with [Map::insert]
impl<K, V, C: Compare<K>> Extend<(K, V)> for Map<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.tree.extend(iter);
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Map<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Map::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, C, A> IntoIterator for &'a Map<K, V, C, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Entries<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, C, A> IntoIterator for Map<K, V, C, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::Bounded;
    use crate::error::AllocError;

    fn fruit() -> Map<i32, &'static str> {
        [(1, "apple"), (2, "zorro"), (4, "batman"), (5, "pear")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_from_list_in_order() {
        let map: Map<i32, &str> = [(5, "pear"), (1, "apple"), (4, "batman"), (2, "zorro")]
            .into_iter()
            .collect();
        assert_eq!(map.len(), 4);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 2, 4, 5]);
        assert_eq!(map.values().next_back(), Some(&"pear"));
        assert_eq!(map, fruit());
    }

    #[test]
    fn test_insert_keeps_value() {
        let mut map = Map::new();
        assert!(map.insert(1, "first"));
        assert!(!map.insert(1, "second"));
        assert_eq!(map.get(&1), Some(&"first"));
    }

    #[test]
    fn test_insert_or_assign() {
        let mut map = Map::new();
        assert!(map.insert_or_assign(1, "first"));
        assert!(!map.insert_or_assign(1, "second"));
        assert_eq!(map.at(&1), Ok(&"second"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_at_missing_key() {
        let mut map = fruit();
        assert_eq!(map.at(&3), Err(Error::KeyNotFound));
        assert_eq!(map.at_mut(&3), Err(Error::KeyNotFound));
        *map.at_mut(&4).unwrap() = "robin";
        assert_eq!(map.get(&4), Some(&"robin"));
    }

    #[test]
    fn test_entry_or_default() {
        let mut counts: Map<&str, usize> = Map::new();
        for word in ["b", "a", "b", "c", "b"] {
            *counts.entry_or_default(word) += 1;
        }
        assert_eq!(counts.iter().collect::<Vec<_>>(), [(&"a", &1), (&"b", &3), (&"c", &1)]);
        counts.tree().validate().unwrap();
    }

    #[test]
    fn test_erase() {
        let mut map = fruit();
        assert_eq!(map.remove(&2), Some("zorro"));
        assert_eq!(map.erase(map.find_node(&4)), Some((4, "batman")));
        assert_eq!(map.remove(&2), None);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 5]);
        map.tree().validate().unwrap();
    }

    #[test]
    fn test_swap() {
        let mut one = fruit();
        let mut two = Map::new();
        two.insert(9, "nine");
        one.swap(&mut two);
        assert_eq!(one.len(), 1);
        assert_eq!(two, fruit());
    }

    #[test]
    fn test_merge_leaves_clashing_keys() {
        let mut ma: Map<i32, &str> = [(1, "apple"), (5, "pear"), (10, "banana")].into_iter().collect();
        let mut mb: Map<i32, &str> = [(2, "zorro"), (4, "batman"), (5, "X"), (8, "alpaca")]
            .into_iter()
            .collect();
        let mut u = Map::new();
        u.merge(&mut ma);
        assert!(ma.is_empty());
        u.merge(&mut mb);
        assert_eq!(mb.len(), 1);
        assert_eq!(mb.at(&5), Ok(&"X"));
        assert_eq!(
            u.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
            [(1, "apple"), (2, "zorro"), (4, "batman"), (5, "pear"), (8, "alpaca"), (10, "banana")]
        );
        u.tree().validate().unwrap();
    }

    #[test]
    fn test_emplace() {
        let mut map = Map::new();
        let (node, inserted) = map.emplace(|| (1, "first".to_string()));
        assert!(inserted);
        let (again, inserted) = map.emplace(|| (1, "second".to_string()));
        assert!(!inserted);
        assert_eq!(node, again);
        assert_eq!(map.get(&1).map(String::as_str), Some("first"));
    }

    #[test]
    fn test_bounds_by_key() {
        let map = fruit();
        assert_eq!(map.lower_bound(&3), Some((&4, &"batman")));
        assert_eq!(map.lower_bound(&4), Some((&4, &"batman")));
        assert_eq!(map.upper_bound(&4), Some((&5, &"pear")));
        assert_eq!(map.upper_bound(&5), None);
        assert_eq!(map.first_key_value(), Some((&1, &"apple")));
        assert_eq!(map.last_key_value(), Some((&5, &"pear")));
    }

    #[test]
    fn test_reverse_order() {
        let mut map = Map::with_cmp(compare::natural().rev());
        map.extend([(1, 'a'), (3, 'c'), (2, 'b')]);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), [3, 2, 1]);
        assert!(map.contains_key(&2));
    }

    #[test]
    fn test_bounded_map() {
        let mut map = Map::with_allocator(compare::natural(), Bounded::new(1));
        assert_eq!(map.try_insert(1, 'a'), Ok(true));
        assert_eq!(map.try_insert(1, 'b'), Ok(false));
        assert_eq!(map.try_insert_or_assign(1, 'c'), Ok(false));
        assert_eq!(map.try_insert(2, 'b'), Err(AllocError { limit: 1 }));
        assert_eq!(map.try_entry_or_default(3).err(), Some(AllocError { limit: 1 }));
        assert_eq!(map.get(&1), Some(&'c'));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_debug_and_into_iter() {
        let map = fruit();
        assert_eq!(
            format!("{map:?}"),
            r#"{1: "apple", 2: "zorro", 4: "batman", 5: "pear"}"#
        );
        let mut owned = map.into_iter();
        assert_eq!(owned.next_back(), Some((5, "pear")));
        assert_eq!(owned.len(), 3);
    }
}
