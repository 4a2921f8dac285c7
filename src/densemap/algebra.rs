// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Combine and time-update operations on history distributions.
//!
//! Two families of operations, each with a derivative twin:
//!
//! - **combine**: merges the distributions of two disjoint subtrees at a
//!   bifurcating branch point. For every occupied pair `(hl, hr)` the product
//!   mass lands at `hl | hr`. Disjointness of the underlying bit meanings is
//!   guaranteed by construction (the two subtrees own different taxa and
//!   different event indices), so it is not re-checked here.
//!
//! - **update**: evolves a distribution along one network edge of a given
//!   branch length. A breadth-first reachability search over the history
//!   space counts how many event orderings lead from each occupied history
//!   to each reachable one; that multiplicity, normalized by the number of
//!   coalescent path shapes, weights the closed-form transition probability.
//!
//! Collection overloads apply the scalar operation across `Vec<DenseMap>`,
//! filtering combine pairs on choice compatibility. The per-element update is
//! embarrassingly parallel, so the collection overloads fan out with rayon.

use rayon::prelude::*;

use crate::densemap::DenseMap;
use crate::model::event::full_state;
use crate::model::{Event, History, HistorySet, NHISTORIES};
use crate::tables::{derivative_puv, number_of_options, puv};

/// Combine the distributions of two disjoint subtrees.
///
/// The result covers the union of the lineage slots, carries the merged
/// choice vector, and accumulates `mass(hl) * mass(hr)` at `hl | hr` for
/// every occupied pair. Callers must have checked [`DenseMap::is_compatible`].
pub fn combine(left: &DenseMap, right: &DenseMap) -> DenseMap {
    let mut result = DenseMap::new(
        left.taxa_bits() | right.taxa_bits(),
        left.choices().merged_with(right.choices()),
    );

    for hl in left.occupied().iter() {
        for hr in right.occupied().iter() {
            result.add(hl | hr, left.mass(hl) * right.mass(hr));
        }
    }

    result
}

/// Combine two subtree distributions' derivatives by the product rule.
///
/// Same enumeration as [`combine`], accumulating
/// `left'(hl) * right(hr) + left(hl) * right'(hr)`.
pub fn combine_derivatives(
    left: &DenseMap,
    left_derivative: &DenseMap,
    right: &DenseMap,
    right_derivative: &DenseMap,
) -> DenseMap {
    let mut result = DenseMap::new(
        left.taxa_bits() | right.taxa_bits(),
        left.choices().merged_with(right.choices()),
    );

    for hl in left.occupied().iter() {
        for hr in right.occupied().iter() {
            let mass = left_derivative.mass(hl) * right.mass(hr)
                + left.mass(hl) * right_derivative.mass(hr);
            result.add(hl | hr, mass);
        }
    }

    result
}

/// Cross-product combine over two collections.
///
/// Pairs whose choice vectors disagree are dropped, not merged; they belong
/// to mutually exclusive reticulation decisions.
pub fn combine_all(left: &[DenseMap], right: &[DenseMap]) -> Vec<DenseMap> {
    let mut result = Vec::new();
    for l in left {
        for r in right {
            if l.is_compatible(r) {
                result.push(combine(l, r));
            }
        }
    }
    result
}

/// Cross-product derivative combine over two collections.
///
/// Enumerates exactly the pairs [`combine_all`] does, in the same order, so
/// the derivative collection stays index-aligned with the primal one.
pub fn combine_derivatives_all(
    left: &[DenseMap],
    left_derivatives: &[DenseMap],
    right: &[DenseMap],
    right_derivatives: &[DenseMap],
) -> Vec<DenseMap> {
    let mut result = Vec::new();
    for (l, ld) in left.iter().zip(left_derivatives) {
        for (r, rd) in right.iter().zip(right_derivatives) {
            if l.is_compatible(r) {
                result.push(combine_derivatives(l, ld, r, rd));
            }
        }
    }
    result
}

/// Count the event orderings that lead from `start` to each reachable
/// history.
///
/// A transition from history `h` fires event `i` when every lineage the
/// event consumes is present (`taxa_bits | h` covers the event mask) and the
/// event has not already fired. Multiple incoming orderings add, matching
/// the unordered-event-order path counting of the coalescent; accumulation
/// is commutative, so the result is independent of frontier order.
///
/// Returns the per-history way counts and the set of reachable histories
/// (including `start` itself, with one way).
pub fn perform_bfs(
    start: History,
    taxa_bits: u16,
    events: &[Event],
) -> ([u64; NHISTORIES], HistorySet) {
    let mut ways = [0u64; NHISTORIES];
    let mut reachable = HistorySet::empty();

    let mut queue = [History::EMPTY; NHISTORIES];
    let mut queue_len = 0;

    queue[queue_len] = start;
    queue_len += 1;
    ways[start.index()] = 1;
    reachable.insert(start);

    let mut next = 0;
    while next < queue_len {
        let current = queue[next];
        next += 1;

        let present = full_state(taxa_bits, current);

        for (i, event) in events.iter().enumerate() {
            if event.is_enabled_by(present) && !current.has_fired(i) {
                let fired = current.with_event(i);

                if ways[fired.index()] == 0 {
                    queue[queue_len] = fired;
                    queue_len += 1;
                }
                ways[fired.index()] += ways[current.index()];
                reachable.insert(fired);
            }
        }
    }

    (ways, reachable)
}

/// Evolve a distribution along one edge for continuous time `length`.
///
/// For every occupied history `h` and every history `h2` reachable from it,
/// the mass moved is
///
/// ```text
/// mass(h) * ways(h2) / number_of_options(n, m) * puv(n, m, length)
/// ```
///
/// where `n` and `m` are the lineage counts before and after (`taxa` minus
/// fired events). Zero contributions are skipped to preserve sparsity. An
/// infinite `length` forces complete coalescence.
pub fn update(current: &DenseMap, events: &[Event], length: f64) -> DenseMap {
    propagate(current, events, length, puv)
}

/// Derivative of [`update`] with respect to this edge's branch length.
///
/// Identical structure with the transition probability replaced by its
/// analytic time-derivative; this is the chain-rule step for the parameter
/// that originates on this edge.
pub fn derivative_update(current: &DenseMap, events: &[Event], length: f64) -> DenseMap {
    propagate(current, events, length, derivative_puv)
}

/// Shared body of [`update`] and [`derivative_update`].
fn propagate(
    current: &DenseMap,
    events: &[Event],
    length: f64,
    transition: fn(usize, usize, f64) -> f64,
) -> DenseMap {
    let mut result = DenseMap::new(current.taxa_bits(), current.choices().clone());

    for history in current.occupied().iter() {
        let (ways, reachable) = perform_bfs(history, current.taxa_bits(), events);

        let starting = current.lineage_count(history);

        for target in reachable.iter() {
            let ending = current.lineage_count(target);

            let weight = ways[target.index()] as f64 / number_of_options(starting, ending);
            let total = current.mass(history) * weight * transition(starting, ending, length);

            if total != 0.0 {
                result.add(target, total);
            }
        }
    }

    result
}

/// Element-wise [`update`] across a collection.
pub fn update_all(current: &[DenseMap], events: &[Event], length: f64) -> Vec<DenseMap> {
    current
        .par_iter()
        .map(|map| update(map, events, length))
        .collect()
}

/// Element-wise [`derivative_update`] across a collection.
pub fn derivative_update_all(current: &[DenseMap], events: &[Event], length: f64) -> Vec<DenseMap> {
    current
        .par_iter()
        .map(|map| derivative_update(map, events, length))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChoiceVector;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-6 * expected.abs().max(1.0),
            "expected {} to be close to {}",
            actual,
            expected
        );
    }

    fn unit_map(taxa_bits: u16) -> DenseMap {
        let mut map = DenseMap::new(taxa_bits, ChoiceVector::unconstrained(0));
        map.set(History::EMPTY, 1.0);
        map
    }

    #[test]
    fn test_combine_disjoint_taxa() {
        let mut left = unit_map(0b0100_0000);
        left.set(History::EMPTY, 0.5);
        let right = unit_map(0b1000_0000);

        let result = combine(&left, &right);
        assert_eq!(result.taxa_bits(), 0b1100_0000);
        assert_eq!(result.mass(History::EMPTY), 0.5);
        assert_eq!(result.occupied().len(), 1);
    }

    #[test]
    fn test_combine_mass_commutes() {
        let mut left = DenseMap::new(0b0100_0000, ChoiceVector::unconstrained(0));
        left.set(History::from_bits(0b01), 0.3);
        left.set(History::EMPTY, 0.7);
        let mut right = DenseMap::new(0b1000_0000, ChoiceVector::unconstrained(0));
        right.set(History::from_bits(0b10), 0.2);

        let ab = combine(&left, &right);
        let ba = combine(&right, &left);
        for h in ab.occupied().iter() {
            assert_close(ba.mass(h), ab.mass(h));
        }
        assert_eq!(ab.occupied(), ba.occupied());
    }

    #[test]
    fn test_combine_all_filters_incompatible() {
        use crate::model::Choice;

        let mut unconstrained = DenseMap::new(0b0100_0000, ChoiceVector::unconstrained(1));
        unconstrained.set(History::EMPTY, 1.0);

        let mut choices = ChoiceVector::unconstrained(1);
        choices.set(0, Choice::pack(1, 0, 1));
        let mut constrained_left = DenseMap::new(0b0100_0000, choices);
        constrained_left.set(History::EMPTY, 1.0);

        let mut other = ChoiceVector::unconstrained(1);
        other.set(0, Choice::pack(2, 0, 2));
        let mut constrained_right = DenseMap::new(0b1000_0000, other);
        constrained_right.set(History::EMPTY, 1.0);

        // Compatible: unconstrained x constrained.
        assert_eq!(
            combine_all(&[unconstrained], &[constrained_right.clone()]).len(),
            1
        );
        // Incompatible: different constrained choices are dropped.
        assert_eq!(
            combine_all(&[constrained_left], &[constrained_right]).len(),
            0
        );
    }

    #[test]
    fn test_bfs_single_event() {
        let events = [Event::from_bits(0b1100_0000)];
        let (ways, reachable) = perform_bfs(History::EMPTY, 0b1100_0000, &events);

        assert_eq!(reachable.len(), 2);
        assert_eq!(ways[0], 1);
        assert_eq!(ways[1], 1);
    }

    #[test]
    fn test_bfs_counts_orderings() {
        // Two independent events over taxa 6..9: both orders reach {0,1}.
        let events = [Event::joining(6, 7), Event::joining(8, 9)];
        let taxa = 0b11_1100_0000;
        let (ways, reachable) = perform_bfs(History::EMPTY, taxa, &events);

        assert_eq!(reachable.len(), 4);
        assert_eq!(ways[0b00], 1);
        assert_eq!(ways[0b01], 1);
        assert_eq!(ways[0b10], 1);
        assert_eq!(ways[0b11], 2);
    }

    #[test]
    fn test_bfs_nested_event_gated() {
        // Event 1 consumes the product of event 0, so it cannot fire first.
        let events = [Event::joining(6, 7), Event::joining(8, 0)];
        let taxa = 0b1_1100_0000;
        let (ways, reachable) = perform_bfs(History::EMPTY, taxa, &events);

        assert!(reachable.contains(History::from_bits(0b01)));
        assert!(reachable.contains(History::from_bits(0b11)));
        assert!(!reachable.contains(History::from_bits(0b10)));
        assert_eq!(ways[0b11], 1);
    }

    #[test]
    fn test_update_two_lineages() {
        let source = unit_map(0b1100_0000);
        let events = [Event::from_bits(0b1100_0000)];

        let result = update(&source, &events, 1.0);
        assert_close(result.mass(History::EMPTY), (-1.0f64).exp());
        assert_close(result.mass(History::from_bits(1)), 1.0 - (-1.0f64).exp());
    }

    #[test]
    fn test_update_infinite_length_coalesces_fully() {
        let source = unit_map(0b1100_0000);
        let events = [Event::from_bits(0b1100_0000)];

        let result = update(&source, &events, f64::INFINITY);
        assert_eq!(result.mass(History::EMPTY), 0.0);
        assert_close(result.mass(History::from_bits(1)), 1.0);
    }

    #[test]
    fn test_derivative_update_matches_central_difference() {
        let source = unit_map(0b1100_0000);
        let events = [Event::from_bits(0b1100_0000)];
        let dx = 1e-6;

        let plus = update(&source, &events, 1.0 + dx);
        let minus = update(&source, &events, 1.0 - dx);
        let derivative = derivative_update(&source, &events, 1.0);

        let h = History::from_bits(1);
        let manual = (plus.mass(h) - minus.mass(h)) / (2.0 * dx);
        assert!((derivative.mass(h) - manual).abs() < 1e-6);
    }

    #[test]
    fn test_update_all_preserves_length_and_order() {
        let a = unit_map(0b0100_0000);
        let b = unit_map(0b1000_0000);
        let out = update_all(&[a, b], &[], 1.0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].taxa_bits(), 0b0100_0000);
        assert_eq!(out[1].taxa_bits(), 0b1000_0000);
    }
}
