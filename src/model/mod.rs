// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Bit-packed model primitives.
//!
//! This module contains the type-safe representations of the quantities the
//! propagation algebra manipulates:
//! - History: which coalescent events have fired (6-bit mask)
//! - HistorySet: presence bitset over the 64 possible histories
//! - Event: one gene-tree coalescence as a bitmask over lineage slots
//! - Choice / ChoiceVector: reticulation decisions a distribution is
//!   conditioned on

pub mod choice;
pub mod constants;
pub mod event;
pub mod history;

// Re-export for convenience
pub use choice::{Choice, ChoiceVector};
pub use constants::*;
pub use event::Event;
pub use history::{History, HistorySet};
