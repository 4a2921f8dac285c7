// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Event type: one internal coalescence of the gene tree.
//!
//! An event is a bitmask over lineage slots naming the two lineages that
//! coalesce. A lineage is either a taxon (bits 6..15) or the product of an
//! earlier event (bits 0..5), so nested coalescences chain through the low
//! bits. The ordered event list is derived once from the gene tree topology
//! and stays immutable during evaluation.

use crate::model::history::History;

/// A gene-tree coalescent event as a mask over lineage slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event(u16);

impl Event {
    /// Create an event joining the two lineage slots `left` and `right`.
    pub fn joining(left: usize, right: usize) -> Self {
        debug_assert!(left < 16 && right < 16);
        Self((1 << left) | (1 << right))
    }

    /// Create an event from a raw lineage mask.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// The raw lineage mask.
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Whether every lineage this event consumes is present in `mask`.
    ///
    /// `mask` is the union of the taxa currently present and the events that
    /// have already fired; an event is only legal once both of its inputs
    /// exist.
    pub fn is_enabled_by(self, mask: u16) -> bool {
        mask & self.0 == self.0
    }
}

/// The union of present taxa and fired events, as one 16-bit lineage mask.
///
/// This is the "full history" the reachability search and the reticulation
/// split operate on.
pub fn full_state(taxa_bits: u16, history: History) -> u16 {
    taxa_bits | history.bits() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joining() {
        let e = Event::joining(6, 7);
        assert_eq!(e.bits(), 0b1100_0000);

        // Nested: event 1 joins taxon 8 with the product of event 0
        let e = Event::joining(8, 0);
        assert_eq!(e.bits(), 0b1_0000_0001);
    }

    #[test]
    fn test_is_enabled_by() {
        let e = Event::joining(6, 7);
        assert!(e.is_enabled_by(0b1100_0000));
        assert!(e.is_enabled_by(0b1110_0001));
        assert!(!e.is_enabled_by(0b0100_0000));
        assert!(!e.is_enabled_by(0));
    }

    #[test]
    fn test_full_state() {
        let h = History::from_bits(0b10);
        assert_eq!(full_state(0b1100_0000, h), 0b1100_0010);
    }
}
