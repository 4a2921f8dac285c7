// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! End-to-end probability checks against independently computed reference
//! values for the seven-taxon fixtures, plus structural properties that must
//! hold for any model: determinism, the unit interval, and the three-taxon
//! topology probabilities summing to one.

mod common;

use common::{assert_close, assert_close_to};
use netcoal::fixtures::{
    introgression_network, seven_taxon_gene_tree, seven_taxon_network, simple_gene_tree,
    simple_gene_tree_three, simple_gene_tree_two, simple_network, trivial_introgression_network,
};
use netcoal::{calc_probability, calc_probability_with_gradient};

#[test]
fn test_seven_taxon_tree() {
    let prob = calc_probability(&seven_taxon_network(0.0), &seven_taxon_gene_tree()).unwrap();
    assert_close(prob, 0.000154474);
}

#[test]
fn test_seven_taxon_tree_with_trivial_introgression() {
    // Sending every lineage to the left parent with probability 1 must not
    // change anything.
    let prob =
        calc_probability(&trivial_introgression_network(), &seven_taxon_gene_tree()).unwrap();
    assert_close(prob, 0.000154474);
}

#[test]
fn test_seven_taxon_tree_with_introgression() {
    let prob = calc_probability(&introgression_network(0.0), &seven_taxon_gene_tree()).unwrap();
    assert_close(prob, 4.25917e-05);
}

#[test]
fn test_gradient_path_agrees_on_probability() {
    let gene = seven_taxon_gene_tree();
    let net = introgression_network(0.0);

    let plain = calc_probability(&net, &gene).unwrap();
    let (with_gradient, gradient) = calc_probability_with_gradient(&net, &gene).unwrap();

    assert_eq!(plain, with_gradient);
    assert_eq!(gradient.len(), 16);
}

#[test]
fn test_evaluation_is_deterministic() {
    let gene = seven_taxon_gene_tree();
    let net = introgression_network(0.0);

    let first = calc_probability(&net, &gene).unwrap();
    let second = calc_probability(&net, &gene).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_three_taxon_topologies_sum_to_one() {
    // The coalescent always produces some topology, so the three rooted
    // triplet probabilities partition the unit interval.
    let params = [1.0, 1.0, 0.5, 0.5, 1.5, 0.8, 0.3, 0.3];
    let net = simple_network(&params);

    let p1 = calc_probability(&net, &simple_gene_tree()).unwrap();
    let p2 = calc_probability(&net, &simple_gene_tree_two()).unwrap();
    let p3 = calc_probability(&net, &simple_gene_tree_three()).unwrap();

    for p in [p1, p2, p3] {
        assert!((0.0..=1.0).contains(&p), "probability {} out of range", p);
    }
    assert_close_to(p1 + p2 + p3, 1.0, 1e-9);
}

#[test]
fn test_set_params_matches_rebuild() {
    let initial = [1.0, 1.0, 0.5, 0.5, 1.5, 0.8, 0.3, 0.3];
    let updated = [0.7, 1.2, 0.4, 0.9, 1.1, 0.6, 0.5, 0.8];

    let mut net = simple_network(&initial);
    net.set_params(&updated).unwrap();

    let gene = simple_gene_tree();
    let moved = calc_probability(&net, &gene).unwrap();
    let fresh = calc_probability(&simple_network(&updated), &gene).unwrap();
    assert_eq!(moved, fresh);
}
