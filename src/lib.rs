// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Gene tree probability under the multispecies network coalescent.
//!
//! Given a phylogenetic network with reticulate (hybridization/introgression)
//! events and an observed gene tree, this crate computes the probability that
//! the gene tree arose under the network, together with the gradient of that
//! probability with respect to every branch length and inheritance
//! probability. The gradient makes the crate usable inside likelihood
//! optimizers that fit network parameters to collections of gene trees.
//!
//! # Architecture
//!
//! The implementation uses a two-tier memory model:
//!
//! ## Tier 1: Precomputed tables (immutable)
//!
//! Closed-form coalescent quantities computed once per process:
//! - `puv` transition coefficients (probability that `u` lineages coalesce
//!   down to `v` over elapsed time `t`)
//! - coalescent path-shape counts used to normalize path multiplicities
//!
//! ## Tier 2: Evaluation state (per query)
//!
//! A bottom-up walk over the species network that propagates sparse
//! probability distributions over coalescent histories:
//! - [`DenseMap`] - a 64-slot distribution over event histories, tagged with
//!   the lineages it covers and the reticulation choices it is conditioned on
//! - combine/update/split algebra in [`densemap`], with a parallel derivative
//!   algebra for forward-mode gradient propagation
//! - a memoizing traversal in [`network::evaluate`] that computes each
//!   network node exactly once, even when several edges share it
//!
//! # Evaluation
//!
//! Leaves seed a unit mass at the empty history. Tree nodes combine their two
//! children's distributions. Reticulation nodes split one child distribution
//! into probability-weighted left/right collections. Every edge crossing
//! applies a continuous-time coalescent update for its branch length. The
//! root, wrapped in a virtual edge of infinite length, aggregates all fully
//! coalesced mass into a scalar probability.
//!
//! # Limits
//!
//! Histories are packed into 6 bits, so a gene tree may have at most 6
//! internal coalescent events (7 taxa). Lineage slots are packed into 16 bits
//! and reticulation choices into 64-bit identifiers; these bounds are enforced
//! at build time, not at each arithmetic step.

pub mod densemap;
pub mod error;
pub mod fixtures;
pub mod model;
pub mod network;
pub mod tables;

// Re-export commonly used types
pub use densemap::DenseMap;
pub use error::ModelError;
pub use model::{Choice, ChoiceVector, Event, History, HistorySet};
pub use network::evaluate::{calc_probability, calc_probability_with_gradient};
pub use network::{Edge, EdgeKind, GeneTree, Network, NodeId};
