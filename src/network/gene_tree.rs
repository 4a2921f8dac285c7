// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The observed gene tree and its derived indexing.
//!
//! A gene tree is a simple immutable binary tree built once before
//! evaluation. Two structures are derived from it and stay fixed for the
//! whole query:
//!
//! - the **taxon index**: internal nodes take lineage slots 0.. in preorder
//!   (these double as event indices and history bits), leaves take slots
//!   from [`TAXON_BASE`] up, also in preorder;
//! - the **event list**: one [`Event`] per internal node, in the same
//!   preorder, joining the slots of its two children.
//!
//! The 6-bit history limit means at most 6 internal nodes (7 taxa); the
//! derivation rejects larger trees with a structured error.

use std::collections::HashMap;
use std::fmt;

use crate::error::ModelError;
use crate::model::{Event, MAX_EVENTS, TAXON_BASE};

/// Index of a node in a [`GeneTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneNodeId(usize);

impl GeneNodeId {
    /// The arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node of the gene tree.
#[derive(Debug, Clone)]
enum GeneNode {
    Leaf {
        name: String,
    },
    Internal {
        name: String,
        left: GeneNodeId,
        right: GeneNodeId,
    },
}

impl GeneNode {
    fn name(&self) -> &str {
        match self {
            GeneNode::Leaf { name } => name,
            GeneNode::Internal { name, .. } => name,
        }
    }
}

/// An arena-backed immutable binary gene tree.
///
/// # Examples
///
/// ```
/// use netcoal::GeneTree;
///
/// let mut gene = GeneTree::new();
/// let a = gene.add_leaf("A");
/// let b = gene.add_leaf("B");
/// let c = gene.add_leaf("C");
/// let ab = gene.add_internal("one", a, b);
/// let root = gene.add_internal("two", ab, c);
/// gene.set_root(root);
///
/// let taxa = gene.taxon_index().unwrap();
/// assert_eq!(taxa.events().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GeneTree {
    nodes: Vec<GeneNode>,
    root: Option<GeneNodeId>,
}

impl GeneTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf named after its taxon.
    pub fn add_leaf(&mut self, name: &str) -> GeneNodeId {
        self.nodes.push(GeneNode::Leaf {
            name: name.to_string(),
        });
        GeneNodeId(self.nodes.len() - 1)
    }

    /// Add an internal (coalescence) node over two children.
    pub fn add_internal(&mut self, name: &str, left: GeneNodeId, right: GeneNodeId) -> GeneNodeId {
        self.nodes.push(GeneNode::Internal {
            name: name.to_string(),
            left,
            right,
        });
        GeneNodeId(self.nodes.len() - 1)
    }

    /// Set the root node.
    pub fn set_root(&mut self, root: GeneNodeId) {
        self.root = Some(root);
    }

    /// Derive the taxon index map and event list for this tree.
    ///
    /// Fails if no root is set, a name repeats, or the tree has more than
    /// [`MAX_EVENTS`] internal nodes.
    pub fn taxon_index(&self) -> Result<TaxonIndex, ModelError> {
        let root = self.root.ok_or(ModelError::MissingRoot)?;

        let mut internal_names = Vec::new();
        let mut leaf_names = Vec::new();
        self.collect_preorder(root, &mut internal_names, &mut leaf_names);

        if internal_names.len() > MAX_EVENTS {
            return Err(ModelError::TooManyTaxa {
                events: internal_names.len(),
                max_events: MAX_EVENTS,
            });
        }

        let mut slots = HashMap::new();
        for (i, name) in internal_names.iter().enumerate() {
            if slots.insert(name.clone(), i).is_some() {
                return Err(ModelError::DuplicateName { name: name.clone() });
            }
        }
        for (i, name) in leaf_names.iter().enumerate() {
            if slots.insert(name.clone(), TAXON_BASE + i).is_some() {
                return Err(ModelError::DuplicateName { name: name.clone() });
            }
        }

        let max_slot = TAXON_BASE + leaf_names.len() - 1;

        let mut events = Vec::new();
        self.collect_events(root, &slots, &mut events);

        Ok(TaxonIndex {
            slots,
            max_slot,
            events,
        })
    }

    /// Preorder collection of internal and leaf names (root first).
    fn collect_preorder(&self, node: GeneNodeId, internal: &mut Vec<String>, leaves: &mut Vec<String>) {
        match &self.nodes[node.index()] {
            GeneNode::Leaf { name } => leaves.push(name.clone()),
            GeneNode::Internal { name, left, right } => {
                internal.push(name.clone());
                self.collect_preorder(*left, internal, leaves);
                self.collect_preorder(*right, internal, leaves);
            }
        }
    }

    /// Preorder event derivation: one event per internal node, joining the
    /// lineage slots of its two children.
    fn collect_events(&self, node: GeneNodeId, slots: &HashMap<String, usize>, events: &mut Vec<Event>) {
        if let GeneNode::Internal { left, right, .. } = &self.nodes[node.index()] {
            let left_slot = slots[self.nodes[left.index()].name()];
            let right_slot = slots[self.nodes[right.index()].name()];
            events.push(Event::joining(left_slot, right_slot));

            self.collect_events(*left, slots, events);
            self.collect_events(*right, slots, events);
        }
    }

    fn fmt_node(&self, node: GeneNodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.nodes[node.index()] {
            GeneNode::Leaf { name } => write!(f, "{}", name),
            GeneNode::Internal { name, left, right } => {
                write!(f, "(")?;
                self.fmt_node(*left, f)?;
                write!(f, ",")?;
                self.fmt_node(*right, f)?;
                write!(f, "){}", name)
            }
        }
    }
}

impl fmt::Display for GeneTree {
    /// Newick-like rendering: `((A,B)one,C)two`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => self.fmt_node(root, f),
            None => write!(f, "<no root>"),
        }
    }
}

/// The derived lineage-slot assignment and event list of a gene tree.
#[derive(Debug, Clone)]
pub struct TaxonIndex {
    slots: HashMap<String, usize>,
    max_slot: usize,
    events: Vec<Event>,
}

impl TaxonIndex {
    /// The lineage slot for a node name, if the name occurs in the tree.
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    /// The ordered event list.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Mask of every taxon slot in use: the taxa bits a fully combined root
    /// distribution must carry.
    pub fn target_taxa_bits(&self) -> u16 {
        let mut bits = 0u16;
        for slot in TAXON_BASE..=self.max_slot {
            bits |= 1 << slot;
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::History;

    fn three_taxon_tree() -> GeneTree {
        let mut gene = GeneTree::new();
        let a = gene.add_leaf("A");
        let b = gene.add_leaf("B");
        let c = gene.add_leaf("C");
        let one = gene.add_internal("one", a, b);
        let two = gene.add_internal("two", one, c);
        gene.set_root(two);
        gene
    }

    #[test]
    fn test_slot_assignment() {
        let taxa = three_taxon_tree().taxon_index().unwrap();

        // Internal nodes first, in preorder from the root.
        assert_eq!(taxa.slot("two"), Some(0));
        assert_eq!(taxa.slot("one"), Some(1));
        // Leaves from TAXON_BASE, in preorder.
        assert_eq!(taxa.slot("A"), Some(6));
        assert_eq!(taxa.slot("B"), Some(7));
        assert_eq!(taxa.slot("C"), Some(8));
        assert_eq!(taxa.slot("X"), None);
    }

    #[test]
    fn test_event_list() {
        let taxa = three_taxon_tree().taxon_index().unwrap();
        let events = taxa.events();

        assert_eq!(events.len(), 2);
        // Root event joins the product of "one" (slot 1) with C (slot 8).
        assert_eq!(events[0], Event::joining(1, 8));
        // "one" joins A and B.
        assert_eq!(events[1], Event::joining(6, 7));
    }

    #[test]
    fn test_target_taxa_bits() {
        let taxa = three_taxon_tree().taxon_index().unwrap();
        assert_eq!(taxa.target_taxa_bits(), 0b1_1100_0000);
        assert_eq!(History::complete(taxa.events().len()).bits(), 0b11);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", three_taxon_tree()), "((A,B)one,C)two");
    }

    #[test]
    fn test_missing_root() {
        let gene = GeneTree::new();
        assert_eq!(gene.taxon_index().unwrap_err(), ModelError::MissingRoot);
    }

    #[test]
    fn test_duplicate_name() {
        let mut gene = GeneTree::new();
        let a = gene.add_leaf("A");
        let b = gene.add_leaf("A");
        let root = gene.add_internal("one", a, b);
        gene.set_root(root);

        assert!(matches!(
            gene.taxon_index().unwrap_err(),
            ModelError::DuplicateName { .. }
        ));
    }

    #[test]
    fn test_too_many_taxa() {
        // 8 leaves need 7 internal nodes, one past the 6-event limit.
        let mut gene = GeneTree::new();
        let mut current = gene.add_leaf("L0");
        for i in 1..8 {
            let leaf = gene.add_leaf(&format!("L{}", i));
            current = gene.add_internal(&format!("I{}", i), current, leaf);
        }
        gene.set_root(current);

        assert!(matches!(
            gene.taxon_index().unwrap_err(),
            ModelError::TooManyTaxa { events: 7, .. }
        ));
    }
}
