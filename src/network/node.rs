// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The species network arena.
//!
//! Network nodes form a DAG: a reticulation node is reachable through two
//! parents, and clades may be shared. Nodes therefore live in an arena and
//! edges store the target's stable [`NodeId`] rather than a reference, which
//! keeps the memoized evaluation free of aliasing hazards.
//!
//! Three node shapes, folded into one tagged union so that every
//! consumption site matches exhaustively:
//! - `Leaf`: a named taxon
//! - `Tree`: a bifurcation with two child edges
//! - `Reticulation`: one child edge plus a left-inheritance probability and
//!   the parameter id of that probability
//!
//! Edges carry a branch length, the parameter id used for gradient
//! bookkeeping (`None` for fixed edges, such as the virtual root edge), and
//! an [`EdgeKind`] selecting which of the target's cached output collections
//! to read: a reticulation's parents read its `Left`/`Right` views, every
//! other edge reads `Normal`.

use crate::error::ModelError;

/// Index of a node in a [`Network`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Which of the target node's output collections an edge reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeKind {
    /// The node's own distribution (leaves and tree nodes).
    #[default]
    Normal,
    /// The left half of a reticulation split.
    Left,
    /// The right half of a reticulation split.
    Right,
}

/// A directed edge from a node to its child.
#[derive(Debug, Clone)]
pub struct Edge {
    /// The child node.
    pub target: NodeId,
    /// Branch length in coalescent units.
    pub length: f64,
    /// Parameter id of the branch length, or `None` if fixed.
    pub param_id: Option<usize>,
    /// Which output collection of the target to read.
    pub kind: EdgeKind,
}

impl Edge {
    /// A normal edge with a fitted branch length.
    pub fn new(target: NodeId, length: f64, param_id: usize) -> Self {
        Self {
            target,
            length,
            param_id: Some(param_id),
            kind: EdgeKind::Normal,
        }
    }

    /// An edge reading one side of a reticulation split.
    pub fn to_split(target: NodeId, length: f64, param_id: usize, kind: EdgeKind) -> Self {
        Self {
            target,
            length,
            param_id: Some(param_id),
            kind,
        }
    }

    /// A fixed-length edge not tied to any parameter.
    pub fn fixed(target: NodeId, length: f64) -> Self {
        Self {
            target,
            length,
            param_id: None,
            kind: EdgeKind::Normal,
        }
    }
}

/// A node of the species network.
#[derive(Debug, Clone)]
pub enum NetNode {
    /// A named taxon.
    Leaf { name: String },
    /// A bifurcation with two child edges.
    Tree {
        name: String,
        left: Edge,
        right: Edge,
    },
    /// A reticulation: one child edge, an inheritance probability, and the
    /// parameter id of that probability.
    Reticulation {
        name: String,
        child: Edge,
        left_probability: f64,
        introgression_id: usize,
    },
}

impl NetNode {
    /// The node's name.
    pub fn name(&self) -> &str {
        match self {
            NetNode::Leaf { name } => name,
            NetNode::Tree { name, .. } => name,
            NetNode::Reticulation { name, .. } => name,
        }
    }
}

/// An arena-backed species network.
///
/// # Examples
///
/// ```
/// use netcoal::{Edge, Network};
///
/// let mut net = Network::new();
/// let a = net.add_leaf("A");
/// let b = net.add_leaf("B");
/// let root = net.add_tree("root", Edge::new(a, 1.0, 0), Edge::new(b, 1.0, 1));
/// net.set_root(root);
///
/// assert_eq!(net.max_param_id(), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: Vec<NetNode>,
    root: Option<NodeId>,
}

impl Network {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf for the named taxon.
    pub fn add_leaf(&mut self, name: &str) -> NodeId {
        self.push(NetNode::Leaf {
            name: name.to_string(),
        })
    }

    /// Add a bifurcating node over two child edges.
    pub fn add_tree(&mut self, name: &str, left: Edge, right: Edge) -> NodeId {
        self.push(NetNode::Tree {
            name: name.to_string(),
            left,
            right,
        })
    }

    /// Add a reticulation node over one child edge.
    pub fn add_reticulation(
        &mut self,
        name: &str,
        child: Edge,
        left_probability: f64,
        introgression_id: usize,
    ) -> NodeId {
        self.push(NetNode::Reticulation {
            name: name.to_string(),
            child,
            left_probability,
            introgression_id,
        })
    }

    fn push(&mut self, node: NetNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Set the root node.
    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// The root node, if set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Access a node by id.
    pub fn node(&self, id: NodeId) -> &NetNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The highest parameter id referenced anywhere, or `None` if the
    /// network has no free parameters.
    pub fn max_param_id(&self) -> Option<usize> {
        let mut max = None;
        for node in &self.nodes {
            let mut note = |id: Option<usize>| {
                if let Some(id) = id {
                    max = Some(max.map_or(id, |m: usize| m.max(id)));
                }
            };
            match node {
                NetNode::Leaf { .. } => {}
                NetNode::Tree { left, right, .. } => {
                    note(left.param_id);
                    note(right.param_id);
                }
                NetNode::Reticulation {
                    child,
                    introgression_id,
                    ..
                } => {
                    note(child.param_id);
                    note(Some(*introgression_id));
                }
            }
        }
        max
    }

    /// Check that every edge reads a view its target actually produces:
    /// `Left`/`Right` only into reticulation nodes, `Normal` everywhere
    /// else. The root must not itself be a reticulation, since the virtual
    /// root edge reads its plain view.
    pub fn check_edges(&self) -> Result<(), ModelError> {
        let check = |edge: &Edge| {
            let target = &self.nodes[edge.target.index()];
            let is_reticulation = matches!(target, NetNode::Reticulation { .. });
            let reads_split = edge.kind != EdgeKind::Normal;
            if is_reticulation != reads_split {
                return Err(ModelError::EdgeKindMismatch {
                    name: target.name().to_string(),
                });
            }
            Ok(())
        };

        for node in &self.nodes {
            match node {
                NetNode::Leaf { .. } => {}
                NetNode::Tree { left, right, .. } => {
                    check(left)?;
                    check(right)?;
                }
                NetNode::Reticulation { child, .. } => check(child)?,
            }
        }

        if let Some(root) = self.root {
            if let NetNode::Reticulation { name, .. } = &self.nodes[root.index()] {
                return Err(ModelError::EdgeKindMismatch { name: name.clone() });
            }
        }
        Ok(())
    }

    /// Overwrite every free parameter from a flat vector indexed by
    /// parameter id. This is the only supported update path: the next
    /// evaluation recomputes everything from scratch.
    pub fn set_params(&mut self, params: &[f64]) -> Result<(), ModelError> {
        let fetch = |id: Option<usize>| -> Result<Option<f64>, ModelError> {
            match id {
                None => Ok(None),
                Some(id) if id < params.len() => Ok(Some(params[id])),
                Some(id) => Err(ModelError::ParamOutOfRange {
                    param_id: id,
                    num_params: params.len(),
                }),
            }
        };

        for node in &mut self.nodes {
            match node {
                NetNode::Leaf { .. } => {}
                NetNode::Tree { left, right, .. } => {
                    if let Some(length) = fetch(left.param_id)? {
                        left.length = length;
                    }
                    if let Some(length) = fetch(right.param_id)? {
                        right.length = length;
                    }
                }
                NetNode::Reticulation {
                    child,
                    left_probability,
                    introgression_id,
                    ..
                } => {
                    if let Some(length) = fetch(child.param_id)? {
                        child.length = length;
                    }
                    if let Some(probability) = fetch(Some(*introgression_id))? {
                        *left_probability = probability;
                    }
                }
            }
        }
        Ok(())
    }
}
