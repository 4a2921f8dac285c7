// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Closed-form coalescent transition probabilities.
//!
//! Under the standard coalescent, the probability that `u` independent
//! lineages have merged down to `v` lineages after continuous time `t` is a
//! finite sum over an intermediate count `k`:
//!
//! ```text
//! puv(u, v, t) = sum over k in v..=u of exp(-k(k-1) t / 2) * c[u][v][k]
//! ```
//!
//! where the coefficients `c` come from a falling-factorial product divided
//! by pairwise sums (Tavare's formula). The coefficients depend only on the
//! lineage counts, so they are built once per process, together with the
//! count of distinct coalescent path shapes used to turn a path multiplicity
//! into a per-path probability.
//!
//! Lineage counts are limited to 0..7 by the table dimension; the taxa limit
//! enforced at gene-tree construction keeps every evaluation inside that
//! range.

use crate::model::constants::MAX_LINEAGES;
use std::sync::OnceLock;

/// Precomputed coefficient tables for the coalescent transition formulas.
struct CoalescentTables {
    /// `puv_coefficients[u][v][k]`: weight of the `exp(-k(k-1)t/2)` term.
    puv_coefficients: [[[f64; MAX_LINEAGES]; MAX_LINEAGES]; MAX_LINEAGES],

    /// `path_shapes[u][v]`: number of distinct coalescent-path shapes from
    /// `u` down to `v` lineages.
    path_shapes: [[f64; MAX_LINEAGES]; MAX_LINEAGES],
}

/// n! as a float-friendly integer; 1 for n < 2.
fn factorial(n: i64) -> i64 {
    (2..=n).product()
}

fn build_tables() -> CoalescentTables {
    let mut puv_coefficients = [[[0.0; MAX_LINEAGES]; MAX_LINEAGES]; MAX_LINEAGES];

    for u in 1..MAX_LINEAGES {
        for v in 1..=u {
            for k in v..=u {
                let sign = if (k - v) % 2 == 0 { 1.0 } else { -1.0 };
                let numerator = (2 * k - 1) as f64 * sign;
                let denominator =
                    (factorial(v as i64) * factorial((k - v) as i64)) as f64 * (v + k - 1) as f64;

                let mut product = 1.0;
                for y in 0..k {
                    product *= ((v + y) * (u - y)) as f64 / (u + y) as f64;
                }

                puv_coefficients[u][v][k] = numerator / denominator * product;
            }
        }
    }

    let mut path_shapes = [[0.0; MAX_LINEAGES]; MAX_LINEAGES];
    for starting in 0..MAX_LINEAGES {
        for ending in 0..MAX_LINEAGES {
            // Falling product of pair counts: C(s,2) * C(s-1,2) * ...
            let mut product = 1.0;
            for i in 0..starting.saturating_sub(ending) {
                let s = (starting - i) as i64;
                product *= factorial(s) as f64 / (2.0 * factorial(s - 2) as f64);
            }
            path_shapes[starting][ending] = product;
        }
    }

    CoalescentTables {
        puv_coefficients,
        path_shapes,
    }
}

fn tables() -> &'static CoalescentTables {
    static TABLES: OnceLock<CoalescentTables> = OnceLock::new();
    TABLES.get_or_init(build_tables)
}

/// Probability that `u` lineages have coalesced down to `v` after time `t`.
///
/// `t = infinity` collapses to an indicator: 1 if `v == 1`, else 0, which is
/// what guarantees complete coalescence on the virtual root edge. The empty
/// case `u == v == 0` returns 1 (no lineages, nothing to do).
///
/// # Panics
///
/// Panics if either lineage count is 8 or more; gene-tree construction
/// rejects such models before evaluation can reach this point.
pub fn puv(u: usize, v: usize, t: f64) -> f64 {
    assert!(
        u < MAX_LINEAGES && v < MAX_LINEAGES,
        "lineage count out of table range: {} -> {}",
        u,
        v
    );

    if t.is_infinite() {
        return if v == 1 { 1.0 } else { 0.0 };
    }
    if u == 0 && v == 0 {
        return 1.0;
    }

    let coefficients = &tables().puv_coefficients[u];
    let mut sum = 0.0;
    for k in v..=u {
        let rate = k as f64 * (k as f64 - 1.0);
        sum += (-rate * t / 2.0).exp() * coefficients[v][k];
    }
    sum
}

/// Analytic time-derivative of [`puv`].
///
/// Same summation with each term scaled by `-k(k-1)/2`. Returns 0 for
/// infinite time and for the empty `u == v == 0` case.
///
/// # Panics
///
/// Panics if either lineage count is 8 or more.
pub fn derivative_puv(u: usize, v: usize, t: f64) -> f64 {
    assert!(
        u < MAX_LINEAGES && v < MAX_LINEAGES,
        "lineage count out of table range: {} -> {}",
        u,
        v
    );

    if t.is_infinite() || (u == 0 && v == 0) {
        return 0.0;
    }

    let coefficients = &tables().puv_coefficients[u];
    let mut sum = 0.0;
    for k in v..=u {
        let rate = k as f64 * (k as f64 - 1.0);
        sum += -rate / 2.0 * (-rate * t / 2.0).exp() * coefficients[v][k];
    }
    sum
}

/// Number of distinct coalescent-path shapes from `starting` to `ending`
/// lineages.
///
/// Each coalescence picks one of `C(n, 2)` pairs, so the count is the falling
/// product of pair counts. Dividing a reachability multiplicity by this turns
/// it into a per-path probability.
///
/// # Panics
///
/// Panics if either lineage count is 8 or more.
pub fn number_of_options(starting: usize, ending: usize) -> f64 {
    assert!(
        starting < MAX_LINEAGES && ending < MAX_LINEAGES,
        "lineage count out of table range: {} -> {}",
        starting,
        ending
    );
    tables().path_shapes[starting][ending]
}
