// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types for model construction and evaluation.
//!
//! All configuration problems (bad taxa, bad parameter ids, malformed
//! networks) surface as [`ModelError`] values from the build or query
//! operations. Evaluation itself is a pure deterministic computation, so
//! there are no transient errors and no retries: any error is a bug in how
//! the model was constructed.

use std::fmt;
use strum_macros::EnumCount as EnumCountMacro;

/// Errors reported while building or evaluating a network/gene-tree pair.
#[derive(Debug, Clone, PartialEq, Eq, EnumCountMacro)]
pub enum ModelError {
    /// A network leaf names a taxon that does not appear in the gene tree.
    UnknownTaxon { name: String },

    /// The gene tree has more internal coalescent events than fit in a
    /// 6-bit history (more than 7 taxa).
    TooManyTaxa { events: usize, max_events: usize },

    /// The same name was used for two gene-tree nodes.
    DuplicateName { name: String },

    /// A tree or network was queried before a root was set.
    MissingRoot,

    /// An edge or reticulation references a parameter id outside the
    /// supplied parameter vector.
    ParamOutOfRange { param_id: usize, num_params: usize },

    /// The species network contains a directed cycle.
    CyclicNetwork { name: String },

    /// An edge reads a split view of a node that is not a reticulation, or
    /// the plain view of a node that is.
    EdgeKindMismatch { name: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownTaxon { name } => {
                write!(f, "network leaf '{}' is not a gene tree taxon", name)
            }
            ModelError::TooManyTaxa { events, max_events } => {
                write!(
                    f,
                    "gene tree has {} coalescent events (max {})",
                    events, max_events
                )
            }
            ModelError::DuplicateName { name } => {
                write!(f, "duplicate gene tree node name '{}'", name)
            }
            ModelError::MissingRoot => write!(f, "no root node has been set"),
            ModelError::ParamOutOfRange {
                param_id,
                num_params,
            } => {
                write!(
                    f,
                    "parameter id {} out of range for {} parameters",
                    param_id, num_params
                )
            }
            ModelError::CyclicNetwork { name } => {
                write!(f, "species network has a cycle through node '{}'", name)
            }
            ModelError::EdgeKindMismatch { name } => {
                write!(f, "node '{}' is read through the wrong edge kind", name)
            }
        }
    }
}

impl std::error::Error for ModelError {}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::EnumCount;

    #[test]
    fn test_variant_count() {
        assert_eq!(ModelError::COUNT, 7);
    }

    #[test]
    fn test_display() {
        let err = ModelError::UnknownTaxon {
            name: "X".to_string(),
        };
        assert_eq!(format!("{}", err), "network leaf 'X' is not a gene tree taxon");

        let err = ModelError::TooManyTaxa {
            events: 8,
            max_events: 6,
        };
        assert!(format!("{}", err).contains("8 coalescent events"));
    }
}
