use crate::error::AllocError;
use std::convert::Infallible;

/// Grants or refuses node allocations for a [Tree](crate::Tree)
///
/// The tree asks for one node before it touches its structure, and reports
/// every node it lets go of (removal, rejected duplicates, failed
/// construction, [clear](crate::Tree::clear)). Storage itself lives in the
/// tree's arena; an allocator only decides whether another node may exist.
pub trait NodeAllocator {
    /// Why an allocation can be refused
    ///
    /// Use [Infallible] for allocators that never refuse, so callers can
    /// destructure results with `let Ok(..) = ..`.
    type Error;

    /// Reserves room for one more node
    fn allocate(&mut self) -> Result<(), Self::Error>;

    /// Releases `count` previously reserved nodes
    fn deallocate(&mut self, count: usize);
}

/// Never refuses; growth is left to the global allocator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Global;

impl NodeAllocator for Global {
    type Error = Infallible;

    fn allocate(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn deallocate(&mut self, _count: usize) {}
}

/// A fixed node budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bounded {
    limit: usize,
    in_use: usize,
}

impl Bounded {
    /// Allows at most `limit` nodes at a time
    pub fn new(limit: usize) -> Self {
        Self { limit, in_use: 0 }
    }

    /// Nodes currently reserved
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// The configured budget
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl NodeAllocator for Bounded {
    type Error = AllocError;

    fn allocate(&mut self) -> Result<(), AllocError> {
        if self.in_use >= self.limit {
            log::debug!("refusing node allocation: {} of {} in use", self.in_use, self.limit);
            return Err(AllocError { limit: self.limit });
        }
        self.in_use += 1;
        Ok(())
    }

    fn deallocate(&mut self, count: usize) {
        debug_assert!(count <= self.in_use);
        self.in_use = self.in_use.saturating_sub(count);
    }
}
