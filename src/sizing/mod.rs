//! Graph size accounting
//!
//! This module computes how many bytes an object graph occupies:
//! - [`accumulator`]: the cycle-safe traversal ([`compute_size`], [`shallow_size`])
//! - [`report`]: the same traversal with a per-node breakdown ([`size_report`])
//!
//! # Accounting Rules
//!
//! Every reachable node contributes its intrinsic size exactly once. Identity,
//! not value equality, decides whether a node was already charged: two equal
//! strings at different addresses are two nodes, one node reached along two
//! paths is one node. The identity is recorded in the [`Visited`] set before
//! any child is examined, so a node that reaches itself contributes nothing
//! the second time.
//!
//! # Node Shapes
//!
//! The accumulator does not know about concrete value types. Each graph
//! classifies its nodes through [`ObjectGraph::shape`]:
//!
//! ```text
//! Mapping     → every value, then every key
//! Attributes  → the attribute table node (itself a mapping)
//! Sequence    → every element in order
//! Leaf        → nothing (scalars, text, bytes, types without a field table)
//! ```

pub mod accumulator;
pub mod report;

use std::fmt::Debug;
use std::hash::Hash;

pub use accumulator::{compute_size, shallow_size, Visited};
pub use report::{size_report, Charge, Edge, SizeReport};

/// How a node's children are reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape<Id> {
    /// Key/value pairs, both sides are children
    Mapping(Vec<(Id, Id)>),
    /// An instance whose fields live in a separate table node
    Attributes(Id),
    /// An ordered collection of children
    Sequence(Vec<Id>),
    /// No children are traversed
    Leaf,
}

/// A reference graph the size accumulator can walk
pub trait ObjectGraph {
    /// Node identity; equal ids mean the same underlying storage
    type Id: Copy + Eq + Hash + Debug;

    /// Bytes attributable to the node itself, excluding its children
    fn intrinsic_size(&self, node: Self::Id) -> usize;

    /// Classify the node and list the children to traverse
    fn shape(&self, node: Self::Id) -> Shape<Self::Id>;
}
