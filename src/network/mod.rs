// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Species networks, gene trees, and the evaluation traversal.
//!
//! - [`gene_tree`]: the immutable observed gene tree, and the derivation of
//!   its taxon index map and ordered event list
//! - [`node`]: the species network arena ([`Network`], [`NetNode`],
//!   [`Edge`]) with parameter bookkeeping
//! - [`evaluate`]: the memoized bottom-up traversal producing the root
//!   probability and gradient

pub mod evaluate;
pub mod gene_tree;
pub mod node;

// Re-export for convenience
pub use gene_tree::{GeneNodeId, GeneTree, TaxonIndex};
pub use node::{Edge, EdgeKind, NetNode, Network, NodeId};
