//! Generic code-element tree
//!
//! The tree shared by every variant and by the merged result. Nodes live
//! in an arena and are addressed by index, children are index lists and
//! the parent is an optional index, so no reference cycles exist.

mod arena;
mod types;

pub use arena::{similar, CodeTree, ElementNode, NodeId};
pub use types::{NodeKind, Position, VariantPosition};
