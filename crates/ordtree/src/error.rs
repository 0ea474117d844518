use crate::rb_base::NodeRef;
use std::convert::Infallible;
use std::fmt;

/// Returned when a [NodeAllocator](crate::NodeAllocator) refuses to hand out
/// another node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    /// The node budget that was exhausted
    pub limit: usize,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node budget of {} exhausted", self.limit)
    }
}

impl std::error::Error for AllocError {}

/// Errors surfaced by the container adapters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A node could not be allocated; the container is unchanged
    Alloc(AllocError),
    /// A checked lookup such as [Map::at](crate::Map::at) found nothing
    KeyNotFound,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Alloc(e) => write!(f, "allocation failed: {e}"),
            Error::KeyNotFound => f.write_str("key not found"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Alloc(e) => Some(e),
            Error::KeyNotFound => None,
        }
    }
}

impl From<AllocError> for Error {
    fn from(e: AllocError) -> Self {
        Error::Alloc(e)
    }
}

impl From<Infallible> for Error {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}

/// The first red-black or ordering property found broken by
/// [Tree::validate](crate::Tree::validate)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    /// The sentinel was left red
    RedSentinel,
    /// The root is red
    RedRoot,
    /// A red node has a red child
    RedChildOfRed(NodeRef),
    /// Two root-to-sentinel paths hold different numbers of black nodes
    BlackHeightMismatch {
        /// Black nodes on the first path seen
        expected: usize,
        /// Black nodes on the offending path
        found: usize,
    },
    /// A child does not point back at its parent
    BrokenParentLink(NodeRef),
    /// The stored size differs from the number of reachable nodes
    SizeMismatch {
        /// Size kept by the arena
        recorded: usize,
        /// Nodes reached from the root
        reachable: usize,
    },
    /// In-order traversal went backwards at this node
    OutOfOrder(NodeRef),
    /// A tree rejecting duplicates holds two equal items
    DuplicateItem(NodeRef),
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantError::RedSentinel => f.write_str("sentinel is red"),
            InvariantError::RedRoot => f.write_str("root is red"),
            InvariantError::RedChildOfRed(n) => write!(f, "red node {n:?} has a red parent"),
            InvariantError::BlackHeightMismatch { expected, found } => {
                write!(f, "black-height {found} differs from {expected}")
            }
            InvariantError::BrokenParentLink(n) => write!(f, "parent link of {n:?} is broken"),
            InvariantError::SizeMismatch { recorded, reachable } => {
                write!(f, "size is {recorded} but {reachable} nodes are reachable")
            }
            InvariantError::OutOfOrder(n) => write!(f, "{n:?} sorts before its predecessor"),
            InvariantError::DuplicateItem(n) => write!(f, "{n:?} duplicates its predecessor"),
        }
    }
}

impl std::error::Error for InvariantError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = Error::from(AllocError { limit: 3 });
        assert_eq!(e.to_string(), "allocation failed: node budget of 3 exhausted");
        assert!(std::error::Error::source(&e).is_some());
        assert_eq!(Error::KeyNotFound.to_string(), "key not found");
        assert_eq!(
            InvariantError::BlackHeightMismatch { expected: 2, found: 3 }.to_string(),
            "black-height 3 differs from 2"
        );
    }
}
