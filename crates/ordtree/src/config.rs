/// What a tree does when an inserted item compares equal to a stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Duplicates {
    /// Keep the stored item and report the insertion as rejected (sets, maps)
    #[default]
    Reject,
    /// Store the new item after every equal one (multi-sets)
    Allow,
}

/// Construction-time settings of a [Tree](crate::Tree)
///
/// The settings are fixed for the lifetime of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeConfig {
    /// Duplicate policy applied by [Tree::insert](crate::Tree::insert)
    pub duplicates: Duplicates,
    /// Number of nodes the arena is pre-sized for
    pub capacity: usize,
}

impl TreeConfig {
    /// Unique keys, no pre-sizing
    pub const fn unique() -> Self {
        Self {
            duplicates: Duplicates::Reject,
            capacity: 0,
        }
    }

    /// Duplicate keys allowed, no pre-sizing
    pub const fn multi() -> Self {
        Self {
            duplicates: Duplicates::Allow,
            capacity: 0,
        }
    }

    /// Pre-sizes the arena for `capacity` nodes
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub(crate) fn allows_duplicates(&self) -> bool {
        self.duplicates == Duplicates::Allow
    }
}
