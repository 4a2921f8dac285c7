// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Hard limits of the bit-packed state representation.
//!
//! Histories are 6-bit masks over gene-tree coalescent events, so a single
//! evaluation supports at most 6 events (equivalently 7 taxa). Lineage slots
//! live in a 16-bit mask: bits 0..5 double as event indices, bits 6..15 hold
//! the taxa themselves. These widths come from the algorithm, not the input:
//! every distribution is a 64-entry array indexed by history.

/// Maximum number of internal coalescent events in one gene tree.
///
/// Events index the low bits of the 16-bit lineage mask, and a history is a
/// subset of events, so this bounds the history space to `1 << MAX_EVENTS`.
pub const MAX_EVENTS: usize = 6;

/// Number of distinct histories (64 for MAX_EVENTS = 6).
pub const NHISTORIES: usize = 1 << MAX_EVENTS;

/// First lineage-mask bit used for a taxon.
///
/// Bits below this are event/history bits; bits from here up identify taxa.
pub const TAXON_BASE: usize = MAX_EVENTS;

/// Maximum number of taxa in one gene tree (one more than the event limit,
/// since a binary tree on n leaves has n - 1 internal nodes).
pub const MAX_TAXA: usize = MAX_EVENTS + 1;

/// Dimension of the precomputed coalescent tables (lineage counts 0..7).
///
/// One slot of slack above [`MAX_TAXA`] keeps the table indexing uniform.
pub const MAX_LINEAGES: usize = 8;

/// Mask selecting the taxa bits of a 16-bit lineage mask.
pub const TAXA_MASK: u16 = !HISTORY_MASK;

/// Mask selecting the history (event) bits of a 16-bit lineage mask.
pub const HISTORY_MASK: u16 = (1 << MAX_EVENTS) - 1;

/// Compile-time assertion that histories fit one u64 presence bitset.
const _: () = assert!(NHISTORIES <= 64, "history bitset must fit in u64");
