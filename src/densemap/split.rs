// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The probability-weighted split at a reticulation node.
//!
//! A reticulation node has two parents; every lineage alive at the node
//! independently inherits from the left parent with the node's inheritance
//! probability `p`, or from the right parent with `1 - p`. The split
//! therefore enumerates, for every occupied history, all `2^n` subsets of
//! the currently-alive lineages and emits one left piece and one right piece
//! per subset:
//!
//! - left mass: `sqrt(mass) * p^|subset|`
//! - right mass: `sqrt(mass) * (1 - p)^|subset|`
//!
//! The square root appears because the two pieces of the same decision are
//! multiplied back together when the parents' subtrees recombine above the
//! reticulation. Each piece is tagged with a [`Choice`] packing the pre-split
//! state, the subset index, and the splittable mask, so that only pieces of
//! the same decision ever recombine.
//!
//! Two derivative variants share the enumeration: one carries an inherited
//! derivative through the square root (chain rule), the other differentiates
//! with respect to this node's own inheritance probability (power rule).

use crate::densemap::DenseMap;
use crate::model::event::full_state;
use crate::model::{Choice, Event, History, HISTORY_MASK, TAXA_MASK};

/// All subsets of `mask`, in the fixed enumeration order.
///
/// Bit `b` of the subset index selects the `b`-th set bit of `mask` counted
/// from the most significant end, so index 1 is always the singleton of the
/// highest set bit. The reticulation choice identifiers pack these indices,
/// so the order is part of the combine contract, not a free choice.
pub fn subsets_of(mask: u16) -> Vec<u16> {
    let count = mask.count_ones() as usize;
    let mut result = vec![0u16; 1 << count];

    let mut remaining = mask;
    for bit_num in 0..count {
        let next = 15 - remaining.leading_zeros() as u16;
        remaining ^= 1 << next;

        for (index, subset) in result.iter_mut().enumerate() {
            if index & (1 << bit_num) != 0 {
                *subset |= 1 << next;
            }
        }
    }

    result
}

/// One emitted split option: where the chosen lineages end up.
struct SplitOption {
    /// Lineage slots of the emitted piece (after event closure).
    taxa_bits: u16,
    /// History of the emitted piece (after event closure).
    history: History,
    /// Number of lineages assigned to this side before closure.
    num_chosen: u32,
    /// Choice tag for the left piece.
    left_choice: Choice,
    /// Choice tag for the right piece.
    right_choice: Choice,
}

/// Enumerate every split option of every occupied history in `maps`,
/// invoking `emit(map_index, history, option)` for each.
fn for_each_option(
    maps: &[DenseMap],
    events: &[Event],
    mut emit: impl FnMut(usize, History, SplitOption),
) {
    for (map_index, map) in maps.iter().enumerate() {
        for history in map.occupied().iter() {
            let state = full_state(map.taxa_bits(), history);

            // Lineages consumed by an already-fired event are not alive at
            // this node and cannot be split.
            let mut splittable = state;
            for (i, event) in events.iter().enumerate() {
                if history.has_fired(i) {
                    splittable &= !event.bits();
                }
            }

            let subsets = subsets_of(splittable);
            let full_index = (subsets.len() - 1) as u16;

            for (index, &subset) in subsets.iter().enumerate() {
                let num_chosen = subset.count_ones();

                // Close the subset over events: a chosen event product drags
                // in the whole event, possibly cascading through nested
                // events, so iterate to a fixed point.
                let mut closed = subset;
                for _ in 0..events.len() {
                    for (i, event) in events.iter().enumerate() {
                        if closed & (1 << i) != 0 {
                            closed |= event.bits();
                        }
                    }
                }

                let left_choice = Choice::pack(state, index as u16, splittable);
                let right_choice = Choice::pack(state, index as u16 ^ full_index, splittable);

                emit(
                    map_index,
                    history,
                    SplitOption {
                        taxa_bits: closed & TAXA_MASK,
                        history: History::from_bits((closed & HISTORY_MASK) as u8),
                        num_chosen,
                        left_choice,
                        right_choice,
                    },
                );
            }
        }
    }
}

/// Emit one piece of a split decision into `results`.
fn push_piece(
    source: &DenseMap,
    results: &mut Vec<DenseMap>,
    node_index: usize,
    option_taxa: u16,
    option_history: History,
    choice: Choice,
    mass: f64,
) {
    let mut choices = source.choices().clone();
    choices.set(node_index, choice);

    let mut piece = DenseMap::new(option_taxa, choices);
    piece.set(option_history, mass);
    results.push(piece);
}

/// Split a collection at reticulation node `node_index`.
///
/// Returns the (left, right) collections the node's two parents will read
/// through their `Left`/`Right` edges.
pub fn split(
    current: &[DenseMap],
    node_index: usize,
    events: &[Event],
    left_probability: f64,
) -> (Vec<DenseMap>, Vec<DenseMap>) {
    let mut left_results = Vec::new();
    let mut right_results = Vec::new();

    for_each_option(current, events, |map_index, history, option| {
        let map = &current[map_index];
        let root = map.mass(history).sqrt();
        let n = option.num_chosen as i32;

        push_piece(
            map,
            &mut left_results,
            node_index,
            option.taxa_bits,
            option.history,
            option.left_choice,
            root * left_probability.powi(n),
        );
        push_piece(
            map,
            &mut right_results,
            node_index,
            option.taxa_bits,
            option.history,
            option.right_choice,
            root * (1.0 - left_probability).powi(n),
        );
    });

    (left_results, right_results)
}

/// Split a derivative collection inherited from below the reticulation.
///
/// The node's own inheritance probability is held fixed here, so the only
/// derivative flow is through the mass: chain rule through the square root,
/// `deriv / (2 sqrt(mass)) * p^n`.
pub fn split_derivatives(
    current_derivatives: &[DenseMap],
    current: &[DenseMap],
    node_index: usize,
    events: &[Event],
    left_probability: f64,
) -> (Vec<DenseMap>, Vec<DenseMap>) {
    let mut left_results = Vec::new();
    let mut right_results = Vec::new();

    for_each_option(current, events, |map_index, history, option| {
        let map = &current[map_index];
        let derivative = current_derivatives[map_index].mass(history);
        // A zero-mass occupied entry contributes nothing; dividing by its
        // square root would poison the gradient with NaN.
        let mass = map.mass(history);
        let chain = if mass == 0.0 {
            0.0
        } else {
            derivative / (2.0 * mass.sqrt())
        };
        let n = option.num_chosen as i32;

        push_piece(
            map,
            &mut left_results,
            node_index,
            option.taxa_bits,
            option.history,
            option.left_choice,
            chain * left_probability.powi(n),
        );
        push_piece(
            map,
            &mut right_results,
            node_index,
            option.taxa_bits,
            option.history,
            option.right_choice,
            chain * (1.0 - left_probability).powi(n),
        );
    });

    (left_results, right_results)
}

/// Split differentiated with respect to this node's inheritance probability.
///
/// Power rule on the weights: `sqrt(mass) * n * p^(n-1)` on the left and
/// `sqrt(mass) * (-n) * (1-p)^(n-1)` on the right. The inherited derivative
/// is ignored: this parameter originates here.
pub fn split_derivative_here(
    current: &[DenseMap],
    node_index: usize,
    events: &[Event],
    left_probability: f64,
) -> (Vec<DenseMap>, Vec<DenseMap>) {
    let mut left_results = Vec::new();
    let mut right_results = Vec::new();

    for_each_option(current, events, |map_index, history, option| {
        let map = &current[map_index];
        let root = map.mass(history).sqrt();
        let n = option.num_chosen as i32;

        push_piece(
            map,
            &mut left_results,
            node_index,
            option.taxa_bits,
            option.history,
            option.left_choice,
            root * left_probability.powi(n - 1) * n as f64,
        );
        push_piece(
            map,
            &mut right_results,
            node_index,
            option.taxa_bits,
            option.history,
            option.right_choice,
            root * (1.0 - left_probability).powi(n - 1) * -(n as f64),
        );
    });

    (left_results, right_results)
}
