// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Memoized bottom-up evaluation of a gene tree against a species network.
//!
//! The evaluator walks the network from its root, computing for every node
//! the collection of history distributions describing the gene lineages
//! alive there, together with one derivative collection per free parameter
//! (forward mode, all parameters in a single pass). Results are cached per
//! node: a reticulation's two parents both read it, but it is computed once.
//!
//! The recursion per node shape:
//! - leaf: unit mass at the empty history for the taxon's lineage slot
//! - tree: flow both children up their edges, then combine
//! - reticulation: flow the child up, then split into left/right views
//!
//! Flowing up an edge is [`update_all`] for the branch length; for the
//! parameter owning that length the primal collection goes through
//! [`derivative_update_all`] instead (the chain-rule origin of that
//! parameter), every other derivative collection just follows the primal
//! update. Above the network root a virtual edge of infinite length forces
//! the remaining lineages to complete coalescence, and the probability is
//! read off the fully-fired history of every map covering all taxa.
//!
//! Cache slots pass through `Computing` while a node's subgraph is being
//! evaluated; re-entering such a slot means the arena encodes a cycle, which
//! is reported as a structured error rather than overflowing the stack.

use std::collections::HashMap;

use crate::densemap::{
    combine_all, combine_derivatives_all, derivative_update_all, split, split_derivative_here,
    split_derivatives, update_all, DenseMap,
};
use crate::error::ModelError;
use crate::model::{ChoiceVector, History};
use crate::network::gene_tree::{GeneTree, TaxonIndex};
use crate::network::node::{Edge, EdgeKind, NetNode, Network, NodeId};

/// Cached evaluation results for one network node.
struct NodeData {
    /// The node's own output (leaves and tree nodes).
    current: Vec<DenseMap>,
    /// Left half of a reticulation split.
    left: Vec<DenseMap>,
    /// Right half of a reticulation split.
    right: Vec<DenseMap>,
    /// Per-parameter derivatives of `current`, index-aligned with it.
    derivatives: Vec<Vec<DenseMap>>,
    /// Per-parameter derivatives of `left`.
    left_derivatives: Vec<Vec<DenseMap>>,
    /// Per-parameter derivatives of `right`.
    right_derivatives: Vec<Vec<DenseMap>>,
}

enum CacheSlot {
    Untouched,
    Computing,
    Ready(NodeData),
}

struct Evaluator<'a> {
    network: &'a Network,
    taxa: &'a TaxonIndex,
    num_params: usize,
    /// Choice-vector slot per reticulation node, in first-visit preorder.
    retic_slots: HashMap<NodeId, usize>,
    cache: Vec<CacheSlot>,
}

impl<'a> Evaluator<'a> {
    fn new(
        network: &'a Network,
        taxa: &'a TaxonIndex,
        num_params: usize,
    ) -> Result<Self, ModelError> {
        let root = network.root().ok_or(ModelError::MissingRoot)?;
        network.check_edges()?;

        let mut retic_slots = HashMap::new();
        let mut visited = vec![false; network.len()];
        collect_reticulations(network, root, &mut visited, &mut retic_slots);

        let mut cache = Vec::with_capacity(network.len());
        cache.resize_with(network.len(), || CacheSlot::Untouched);

        Ok(Self {
            network,
            taxa,
            num_params,
            retic_slots,
            cache,
        })
    }

    /// Evaluate below the root, apply the virtual infinite root edge, and
    /// read the probability (and per-parameter gradient) off the result.
    fn run(&mut self) -> Result<(f64, Vec<f64>), ModelError> {
        let root = self.network.root().ok_or(ModelError::MissingRoot)?;
        self.ensure(root)?;

        let (current, derivatives) = self.flow_along(&Edge::fixed(root, f64::INFINITY));

        let probability = self.aggregate(&current);
        let gradient = derivatives.iter().map(|d| self.aggregate(d)).collect();
        Ok((probability, gradient))
    }

    /// Sum the completed-history mass of every map covering all taxa.
    fn aggregate(&self, maps: &[DenseMap]) -> f64 {
        let target = self.taxa.target_taxa_bits();
        let complete = History::complete(self.taxa.events().len());

        maps.iter()
            .filter(|map| map.taxa_bits() == target)
            .map(|map| map.mass(complete))
            .sum()
    }

    /// Compute and cache the node's data, recursing into its children first.
    fn ensure(&mut self, id: NodeId) -> Result<(), ModelError> {
        match &self.cache[id.index()] {
            CacheSlot::Ready(_) => return Ok(()),
            CacheSlot::Computing => {
                return Err(ModelError::CyclicNetwork {
                    name: self.network.node(id).name().to_string(),
                })
            }
            CacheSlot::Untouched => {}
        }
        self.cache[id.index()] = CacheSlot::Computing;

        let data = match self.network.node(id).clone() {
            NetNode::Leaf { name } => self.evaluate_leaf(&name)?,
            NetNode::Tree { left, right, .. } => {
                self.ensure(left.target)?;
                self.ensure(right.target)?;
                self.evaluate_tree(&left, &right)
            }
            NetNode::Reticulation {
                child,
                left_probability,
                introgression_id,
                ..
            } => {
                self.ensure(child.target)?;
                self.evaluate_reticulation(id, &child, left_probability, introgression_id)
            }
        };

        self.cache[id.index()] = CacheSlot::Ready(data);
        Ok(())
    }

    /// A single lineage for the named taxon, with certainty.
    fn evaluate_leaf(&self, name: &str) -> Result<NodeData, ModelError> {
        let slot = self
            .taxa
            .slot(name)
            .ok_or_else(|| ModelError::UnknownTaxon {
                name: name.to_string(),
            })?;

        let choices = ChoiceVector::unconstrained(self.retic_slots.len());
        let mut map = DenseMap::new(1 << slot, choices.clone());
        map.set(History::EMPTY, 1.0);

        // A leaf does not depend on any parameter.
        let zero = DenseMap::new(1 << slot, choices);
        let derivatives = (0..self.num_params).map(|_| vec![zero.clone()]).collect();

        Ok(NodeData {
            current: vec![map],
            left: Vec::new(),
            right: Vec::new(),
            derivatives,
            left_derivatives: Vec::new(),
            right_derivatives: Vec::new(),
        })
    }

    fn evaluate_tree(&self, left: &Edge, right: &Edge) -> NodeData {
        let (left_in, left_derivs) = self.flow_along(left);
        let (right_in, right_derivs) = self.flow_along(right);

        let current = combine_all(&left_in, &right_in);
        let derivatives = (0..self.num_params)
            .map(|i| {
                combine_derivatives_all(&left_in, &left_derivs[i], &right_in, &right_derivs[i])
            })
            .collect();

        NodeData {
            current,
            left: Vec::new(),
            right: Vec::new(),
            derivatives,
            left_derivatives: Vec::new(),
            right_derivatives: Vec::new(),
        }
    }

    fn evaluate_reticulation(
        &self,
        id: NodeId,
        child: &Edge,
        left_probability: f64,
        introgression_id: usize,
    ) -> NodeData {
        let (child_in, child_derivs) = self.flow_along(child);
        let slot = self.retic_slots[&id];
        let events = self.taxa.events();

        let (left, right) = split(&child_in, slot, events, left_probability);

        let mut left_derivatives = Vec::with_capacity(self.num_params);
        let mut right_derivatives = Vec::with_capacity(self.num_params);
        for i in 0..self.num_params {
            let (dl, dr) = if i == introgression_id {
                // The inheritance probability originates here: power rule,
                // inherited derivative does not flow through.
                split_derivative_here(&child_in, slot, events, left_probability)
            } else {
                split_derivatives(&child_derivs[i], &child_in, slot, events, left_probability)
            };
            left_derivatives.push(dl);
            right_derivatives.push(dr);
        }

        NodeData {
            current: Vec::new(),
            left,
            right,
            derivatives: Vec::new(),
            left_derivatives,
            right_derivatives,
        }
    }

    /// Read the target's output through `edge.kind` and evolve it for the
    /// edge's branch length, primal and all derivative collections.
    fn flow_along(&self, edge: &Edge) -> (Vec<DenseMap>, Vec<Vec<DenseMap>>) {
        let data = match &self.cache[edge.target.index()] {
            CacheSlot::Ready(data) => data,
            _ => unreachable!("child evaluated before its parent"),
        };
        let (primal, derivs) = match edge.kind {
            EdgeKind::Normal => (&data.current, &data.derivatives),
            EdgeKind::Left => (&data.left, &data.left_derivatives),
            EdgeKind::Right => (&data.right, &data.right_derivatives),
        };

        let events = self.taxa.events();
        let out = update_all(primal, events, edge.length);
        let out_derivs = (0..self.num_params)
            .map(|i| {
                if edge.param_id == Some(i) {
                    derivative_update_all(primal, events, edge.length)
                } else {
                    update_all(&derivs[i], events, edge.length)
                }
            })
            .collect();

        (out, out_derivs)
    }
}

/// Assign choice-vector slots to reticulation nodes in first-visit preorder.
fn collect_reticulations(
    network: &Network,
    id: NodeId,
    visited: &mut [bool],
    slots: &mut HashMap<NodeId, usize>,
) {
    if visited[id.index()] {
        return;
    }
    visited[id.index()] = true;

    match network.node(id) {
        NetNode::Leaf { .. } => {}
        NetNode::Tree { left, right, .. } => {
            collect_reticulations(network, left.target, visited, slots);
            collect_reticulations(network, right.target, visited, slots);
        }
        NetNode::Reticulation { child, .. } => {
            let slot = slots.len();
            slots.insert(id, slot);
            collect_reticulations(network, child.target, visited, slots);
        }
    }
}

/// The probability that the gene tree arose under the species network.
pub fn calc_probability(network: &Network, gene_tree: &GeneTree) -> Result<f64, ModelError> {
    let taxa = gene_tree.taxon_index()?;
    let (probability, _) = Evaluator::new(network, &taxa, 0)?.run()?;
    Ok(probability)
}

/// The probability together with its gradient over every free parameter.
///
/// The gradient vector is indexed by parameter id and has length
/// `max_param_id + 1` (empty if the network has no free parameters).
pub fn calc_probability_with_gradient(
    network: &Network,
    gene_tree: &GeneTree,
) -> Result<(f64, Vec<f64>), ModelError> {
    let taxa = gene_tree.taxon_index()?;
    let num_params = network.max_param_id().map_or(0, |max| max + 1);
    Evaluator::new(network, &taxa, num_params)?.run()
}
