// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! History type and the presence bitset over histories.
//!
//! A History records which of the gene tree's internal coalescent events have
//! already occurred along one probabilistic path, as a mask over event
//! indices. With at most 6 events, a history indexes a 64-slot array.
//!
//! # Examples
//!
//! ```
//! use netcoal::model::{History, HistorySet};
//!
//! let mut set = HistorySet::empty();
//! set.insert(History::EMPTY);
//! set.insert(History::from_bits(0b101));
//!
//! assert_eq!(set.len(), 2);
//! let all: Vec<History> = set.iter().collect();
//! assert_eq!(all[0], History::EMPTY);
//! assert_eq!(all[1].bits(), 0b101);
//! ```

use crate::model::constants::{MAX_EVENTS, NHISTORIES};
use std::ops::BitOr;

/// A set of already-fired coalescent events, packed into the low 6 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct History(u8);

impl History {
    /// The history in which no event has fired yet.
    pub const EMPTY: Self = Self(0);

    /// Create a history from a raw event mask.
    ///
    /// # Panics
    ///
    /// Panics if `bits` uses more than [`MAX_EVENTS`] bits.
    pub fn from_bits(bits: u8) -> Self {
        assert!(
            (bits as usize) < NHISTORIES,
            "history out of range: {:#b}",
            bits
        );
        Self(bits)
    }

    /// The raw event mask.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// The history as an array index (0..64).
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether event `event_index` has fired in this history.
    pub fn has_fired(self, event_index: usize) -> bool {
        (self.0 >> event_index) & 1 != 0
    }

    /// This history with event `event_index` additionally fired.
    pub fn with_event(self, event_index: usize) -> Self {
        debug_assert!(event_index < MAX_EVENTS);
        Self(self.0 | (1 << event_index))
    }

    /// Number of events that have fired.
    pub fn event_count(self) -> u32 {
        self.0.count_ones()
    }

    /// The fully coalesced history for a gene tree with `num_events` events.
    pub fn complete(num_events: usize) -> Self {
        Self(((1u16 << num_events) - 1) as u8)
    }
}

impl BitOr for History {
    type Output = History;

    fn bitor(self, rhs: History) -> History {
        History(self.0 | rhs.0)
    }
}

/// A presence bitset over the 64 possible histories.
///
/// Bit h (counting from LSB) is set if history h carries nonzero mass.
/// This provides O(1) insert and contains, and iteration visits only the
/// occupied histories in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistorySet(u64);

impl HistorySet {
    /// Create an empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Insert a history.
    pub fn insert(&mut self, history: History) {
        self.0 |= 1 << history.index();
    }

    /// Check whether a history is present.
    pub fn contains(self, history: History) -> bool {
        (self.0 >> history.index()) & 1 != 0
    }

    /// Number of histories present.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set is empty.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The raw presence bits.
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Iterate over the histories present, in ascending order.
    pub fn iter(self) -> impl Iterator<Item = History> {
        HistorySetIter { bits: self.0 }
    }
}

/// Iterator over the histories in a HistorySet.
struct HistorySetIter {
    bits: u64,
}

impl Iterator for HistorySetIter {
    type Item = History;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bits == 0 {
            return None;
        }
        let index = self.bits.trailing_zeros() as u8;
        self.bits &= self.bits - 1;
        Some(History(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        assert_eq!(History::EMPTY.bits(), 0);
        assert_eq!(History::EMPTY.event_count(), 0);
        assert!(!History::EMPTY.has_fired(0));
    }

    #[test]
    fn test_with_event() {
        let h = History::EMPTY.with_event(2).with_event(0);
        assert_eq!(h.bits(), 0b101);
        assert!(h.has_fired(0));
        assert!(!h.has_fired(1));
        assert!(h.has_fired(2));
        assert_eq!(h.event_count(), 2);
    }

    #[test]
    fn test_bitor() {
        let h = History::from_bits(0b100) | History::from_bits(0b011);
        assert_eq!(h.bits(), 0b111);
    }

    #[test]
    fn test_complete() {
        assert_eq!(History::complete(0), History::EMPTY);
        assert_eq!(History::complete(3).bits(), 0b111);
        assert_eq!(History::complete(6).bits(), 0b11_1111);
    }

    #[test]
    #[should_panic(expected = "history out of range")]
    fn test_from_bits_out_of_range() {
        History::from_bits(64);
    }

    #[test]
    fn test_set_iteration_order() {
        let mut set = HistorySet::empty();
        set.insert(History::from_bits(5));
        set.insert(History::from_bits(0));
        set.insert(History::from_bits(63));

        let all: Vec<u8> = set.iter().map(History::bits).collect();
        assert_eq!(all, vec![0, 5, 63]);
        assert_eq!(set.len(), 3);
        assert!(set.contains(History::from_bits(5)));
        assert!(!set.contains(History::from_bits(6)));
    }

    #[test]
    fn test_set_insert_idempotent() {
        let mut set = HistorySet::empty();
        set.insert(History::from_bits(7));
        set.insert(History::from_bits(7));
        assert_eq!(set.len(), 1);
    }
}
