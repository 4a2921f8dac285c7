// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Ready-made model instances shared by the demo binary and the
//! integration tests.
//!
//! The seven-taxon family uses a balanced species tree with unit branch
//! lengths and a gene tree that disagrees with it below `five`, so its
//! probability is small but non-trivial. The introgression variants insert
//! a reticulation over clade `one` (taxa B and C): the trivial variant
//! sends everything to the left parent, which must not change the
//! probability, while the sophisticated variant splits 0.25/0.75.
//!
//! `dx` nudges one parameter and exists for central-difference checks of
//! the analytic gradient.

use crate::network::{Edge, EdgeKind, GeneTree, Network, NodeId};

/// The parameter id of the inheritance probability in the seven-taxon
/// introgression networks.
pub const INTROGRESSION_ID: usize = 15;

/// The parameter id nudged by `dx` in [`seven_taxon_network`].
pub const NUDGED_BRANCH_ID: usize = 6;

fn leaves(net: &mut Network) -> [NodeId; 7] {
    ["A", "B", "C", "D", "E", "F", "G"].map(|name| net.add_leaf(name))
}

/// A balanced seven-taxon species tree with unit branch lengths.
///
/// `dx` is added to the branch above `two` (parameter 6).
pub fn seven_taxon_network(dx: f64) -> Network {
    let mut net = Network::new();
    let [a, b, c, d, e, f, g] = leaves(&mut net);

    let one = net.add_tree("one", Edge::new(b, 1.0, 0), Edge::new(c, 1.0, 1));
    let two = net.add_tree("two", Edge::new(a, 1.0, 2), Edge::new(one, 1.0, 11));
    let three = net.add_tree("three", Edge::new(d, 1.0, 3), Edge::new(e, 1.0, 10));
    let four = net.add_tree("four", Edge::new(f, 1.0, 4), Edge::new(g, 1.0, 9));
    let five = net.add_tree("five", Edge::new(three, 1.0, 5), Edge::new(four, 1.0, 8));
    let six = net.add_tree("six", Edge::new(two, 1.0 + dx, 6), Edge::new(five, 1.0, 7));
    net.set_root(six);
    net
}

/// [`seven_taxon_network`] with a trivial introgression over clade `one`:
/// the left parent inherits with probability 1.
pub fn trivial_introgression_network() -> Network {
    let mut net = Network::new();
    let [a, b, c, d, e, f, g] = leaves(&mut net);

    let one = net.add_tree("one", Edge::new(b, 1.0, 0), Edge::new(c, 1.0, 1));
    let one_introgressed =
        net.add_reticulation("oneIntrogressed", Edge::new(one, 0.0, 2), 1.0, INTROGRESSION_ID);
    let two = net.add_tree(
        "two",
        Edge::new(a, 1.0, 3),
        Edge::to_split(one_introgressed, 0.0, 5, EdgeKind::Left),
    );
    let three = net.add_tree("three", Edge::new(d, 1.0, 4), Edge::new(e, 1.0, 14));
    let super_three = net.add_tree(
        "superThree",
        Edge::new(three, 1.0, 6),
        Edge::to_split(one_introgressed, 0.0, 7, EdgeKind::Right),
    );
    let four = net.add_tree("four", Edge::new(f, 1.0, 8), Edge::new(g, 1.0, 9));
    let five = net.add_tree("five", Edge::new(super_three, 1.0, 10), Edge::new(four, 1.0, 11));
    let six = net.add_tree("six", Edge::new(two, 1.0, 12), Edge::new(five, 1.0, 13));
    net.set_root(six);
    net
}

/// [`seven_taxon_network`] with a 0.25/0.75 introgression over clade `one`.
///
/// `dx` is added to the inheritance probability (parameter 15).
pub fn introgression_network(dx: f64) -> Network {
    let mut net = Network::new();
    let [a, b, c, d, e, f, g] = leaves(&mut net);

    let one = net.add_tree("one", Edge::new(b, 1.0, 0), Edge::new(c, 1.0, 1));
    let one_introgressed = net.add_reticulation(
        "oneIntrogressed",
        Edge::new(one, 0.0, 2),
        0.25 + dx,
        INTROGRESSION_ID,
    );
    let two = net.add_tree(
        "two",
        Edge::new(a, 1.0, 3),
        Edge::to_split(one_introgressed, 0.0, 4, EdgeKind::Left),
    );
    let three = net.add_tree("three", Edge::new(d, 1.0, 5), Edge::new(e, 1.0, 6));
    let super_three = net.add_tree(
        "superThree",
        Edge::new(three, 0.0, 7),
        Edge::to_split(one_introgressed, 0.0, 8, EdgeKind::Right),
    );
    let four = net.add_tree("four", Edge::new(f, 1.0, 9), Edge::new(g, 1.0, 10));
    let five = net.add_tree("five", Edge::new(super_three, 1.0, 11), Edge::new(four, 1.0, 12));
    let six = net.add_tree("six", Edge::new(two, 1.0, 13), Edge::new(five, 1.0, 14));
    net.set_root(six);
    net
}

/// The seven-taxon gene tree `((A,B)one,(C,((D,F)two,(E,G)three)four)five)six`.
pub fn seven_taxon_gene_tree() -> GeneTree {
    let mut gene = GeneTree::new();
    let a = gene.add_leaf("A");
    let b = gene.add_leaf("B");
    let c = gene.add_leaf("C");
    let d = gene.add_leaf("D");
    let e = gene.add_leaf("E");
    let f = gene.add_leaf("F");
    let g = gene.add_leaf("G");

    let one = gene.add_internal("one", a, b);
    let two = gene.add_internal("two", d, f);
    let three = gene.add_internal("three", e, g);
    let four = gene.add_internal("four", two, three);
    let five = gene.add_internal("five", c, four);
    let six = gene.add_internal("six", one, five);
    gene.set_root(six);
    gene
}

/// A three-taxon network with one reticulation over B, fully parameterized:
/// `params[0..=6]` are branch lengths, `params[7]` is the inheritance
/// probability.
pub fn simple_network(params: &[f64; 8]) -> Network {
    let mut net = Network::new();
    let a = net.add_leaf("A");
    let b = net.add_leaf("B");
    let c = net.add_leaf("C");

    let b_introgressed =
        net.add_reticulation("BIntrogressed", Edge::new(b, params[0], 0), params[7], 7);
    let one = net.add_tree(
        "one",
        Edge::new(a, params[1], 1),
        Edge::to_split(b_introgressed, params[2], 2, EdgeKind::Left),
    );
    let two = net.add_tree(
        "two",
        Edge::to_split(b_introgressed, params[3], 3, EdgeKind::Right),
        Edge::new(c, params[4], 4),
    );
    let three = net.add_tree("three", Edge::new(one, params[5], 5), Edge::new(two, params[6], 6));
    net.set_root(three);
    net
}

fn three_taxon_gene(first: &str, second: &str, outgroup: &str) -> GeneTree {
    let mut gene = GeneTree::new();
    let mut id = |name: &str| gene.add_leaf(name);
    let first = id(first);
    let second = id(second);
    let outgroup = id(outgroup);

    let one = gene.add_internal("one", first, second);
    let two = gene.add_internal("two", one, outgroup);
    gene.set_root(two);
    gene
}

/// The gene tree `((A,B)one,C)two`.
pub fn simple_gene_tree() -> GeneTree {
    three_taxon_gene("A", "B", "C")
}

/// The gene tree `((A,C)one,B)two`.
pub fn simple_gene_tree_two() -> GeneTree {
    three_taxon_gene("A", "C", "B")
}

/// The gene tree `((B,C)one,A)two`.
pub fn simple_gene_tree_three() -> GeneTree {
    three_taxon_gene("B", "C", "A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seven_taxon_network_params() {
        assert_eq!(seven_taxon_network(0.0).max_param_id(), Some(11));
        assert_eq!(introgression_network(0.0).max_param_id(), Some(15));
    }

    #[test]
    fn test_gene_tree_shape() {
        assert_eq!(
            format!("{}", seven_taxon_gene_tree()),
            "((A,B)one,(C,((D,F)two,(E,G)three)four)five)six"
        );
        assert_eq!(format!("{}", simple_gene_tree_three()), "((B,C)one,A)two");
    }
}
