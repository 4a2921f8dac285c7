// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Sparse distributions over coalescent histories, and their algebra.
//!
//! A [`DenseMap`] is the value type the whole evaluation manipulates: a
//! 64-entry probability-mass array indexed by [`History`], tagged with the
//! lineage slots it covers (`taxa_bits`) and the reticulation choices it is
//! conditioned on. A presence bitset keeps the array sparse in practice: all
//! loops walk only the occupied entries.
//!
//! Collections of DenseMaps (`Vec<DenseMap>`) represent mixtures over
//! mutually exclusive reticulation-choice combinations. The submodules
//! provide the algebra over single maps and collections:
//! - [`algebra`]: combine at tree nodes, continuous-time update along edges,
//!   and the reachability search that counts coalescent paths
//! - [`split`]: the probability-weighted split at reticulation nodes
//!
//! Every algebra operation has a derivative twin that propagates one
//! parameter's gradient through the same enumeration (forward mode), so the
//! primal and derivative collections always stay index-aligned.

pub mod algebra;
pub mod split;

pub use algebra::{
    combine, combine_all, combine_derivatives, combine_derivatives_all, derivative_update,
    derivative_update_all, perform_bfs, update, update_all,
};
pub use split::{split, split_derivative_here, split_derivatives, subsets_of};

use std::fmt;

use crate::model::{ChoiceVector, History, HistorySet, NHISTORIES};

/// A probability distribution over coalescent histories.
///
/// `taxa_bits` marks which lineage slots are represented as present and not
/// yet coalesced away below this point of the traversal. Mass entries are
/// additive: repeated [`add`] calls accumulate.
///
/// Value semantics: algebra operations take maps by reference and return
/// fresh maps; a map handed to a caller is never mutated again.
///
/// [`add`]: DenseMap::add
#[derive(Clone)]
pub struct DenseMap {
    taxa_bits: u16,
    choices: ChoiceVector,
    masses: [f64; NHISTORIES],
    occupied: HistorySet,
}

impl DenseMap {
    /// Create a zero-mass distribution over the given lineage slots.
    pub fn new(taxa_bits: u16, choices: ChoiceVector) -> Self {
        Self {
            taxa_bits,
            choices,
            masses: [0.0; NHISTORIES],
            occupied: HistorySet::empty(),
        }
    }

    /// The lineage slots this distribution covers.
    pub fn taxa_bits(&self) -> u16 {
        self.taxa_bits
    }

    /// The reticulation choices this distribution is conditioned on.
    pub fn choices(&self) -> &ChoiceVector {
        &self.choices
    }

    /// The mass at `history` (0.0 if never set).
    pub fn mass(&self, history: History) -> f64 {
        self.masses[history.index()]
    }

    /// The set of histories that have been written to.
    pub fn occupied(&self) -> HistorySet {
        self.occupied
    }

    /// Overwrite the mass at `history`.
    pub fn set(&mut self, history: History, mass: f64) {
        self.masses[history.index()] = mass;
        self.occupied.insert(history);
    }

    /// Accumulate mass at `history`.
    pub fn add(&mut self, history: History, mass: f64) {
        self.masses[history.index()] += mass;
        self.occupied.insert(history);
    }

    /// Whether this map may be combined with `other`: the choice vectors
    /// agree at every reticulation slot where both are constrained.
    pub fn is_compatible(&self, other: &DenseMap) -> bool {
        self.choices.is_compatible_with(&other.choices)
    }

    /// Number of lineages still present: slots covered minus events fired.
    pub fn lineage_count(&self, history: History) -> usize {
        self.taxa_bits.count_ones() as usize - history.event_count() as usize
    }
}

impl fmt::Debug for DenseMap {
    /// Renders only the occupied entries, which keeps test failure output
    /// readable when a collection of maps disagrees.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DenseMap{{taxa={:#b}", self.taxa_bits)?;
        for history in self.occupied.iter() {
            write!(f, ", {:#08b}: {}", history.bits(), self.mass(history))?;
        }
        write!(f, "}}")
    }
}
