//! This crate contains ordered containers based on a slab-backed
//! red-black tree.
//!
//! Use [Set], [MultiSet] or [Map] directly, or build on [Tree].
#![doc = include_str!("../README.md")]

#![warn(missing_docs)]

/// The node budget seam between a tree and its storage
pub mod alloc;
/// Construction-time tree settings
pub mod config;
/// Positions and iterators over a tree
pub mod cursor;
/// Error types
pub mod error;
/// The sorted tree engine
pub mod tree;

/// Ordered sets with unique or repeated items
#[cfg(feature = "set")]
pub mod set;
/// Ordered key-value maps
#[cfg(feature = "map")]
pub mod map;

/// Contains the red-black tree internals based on slab.
mod rb_base;


pub use alloc::{Bounded, Global, NodeAllocator};
pub use config::{Duplicates, TreeConfig};
pub use cursor::{Cursor, IntoIter, Iter};
pub use error::{AllocError, Error, InvariantError};
pub use rb_base::{Color, NodeRef};
pub use tree::Tree;

#[cfg(feature = "map")]
pub use map::{KeyCompare, Map};
#[cfg(feature = "set")]
pub use set::{MultiSet, Set};
