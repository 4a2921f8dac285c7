// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Reticulation choices and the per-distribution choice vector.
//!
//! When a reticulation node splits a distribution, each emitted piece is
//! conditioned on which lineages went to the left parent. The [`Choice`]
//! identifier packs that decision so that a later combine only re-merges
//! pieces that made mutually consistent decisions. A [`ChoiceVector`] holds
//! one slot per reticulation node in the network; `None` means the
//! distribution is unconstrained by that node.

/// An opaque identifier for one inheritance decision at a reticulation node.
///
/// Packs the pre-split lineage state, the index of the chosen subset, and the
/// splittable-lineage mask into 64 bits. Two pieces of a distribution combine
/// only if they carry equal identifiers wherever both are constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Choice(u64);

impl Choice {
    /// Pack a split decision.
    ///
    /// `state` is the taxa-and-history mask before the split, `subset_id`
    /// indexes the chosen subset of splittable lineages, and `splittable` is
    /// the mask the subsets were enumerated over.
    pub fn pack(state: u16, subset_id: u16, splittable: u16) -> Self {
        Self(state as u64 | (subset_id as u64) << 16 | (splittable as u64) << 32)
    }

    /// The raw packed value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// One slot per reticulation node; `None` means unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChoiceVector {
    slots: Vec<Option<Choice>>,
}

impl ChoiceVector {
    /// A vector of `len` unconstrained slots.
    pub fn unconstrained(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Number of reticulation slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no reticulation slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The choice at `slot`, if constrained.
    pub fn get(&self, slot: usize) -> Option<Choice> {
        self.slots[slot]
    }

    /// Constrain `slot` to `choice`.
    pub fn set(&mut self, slot: usize, choice: Choice) {
        self.slots[slot] = Some(choice);
    }

    /// Whether two vectors agree at every slot where both are constrained.
    pub fn is_compatible_with(&self, other: &ChoiceVector) -> bool {
        self.slots
            .iter()
            .zip(&other.slots)
            .all(|(a, b)| match (a, b) {
                (Some(x), Some(y)) => x == y,
                _ => true,
            })
    }

    /// Element-wise merge preferring whichever side is constrained.
    ///
    /// Where both sides are constrained the left value is kept. Callers are
    /// expected to have filtered on [`is_compatible_with`], which makes the
    /// two values equal; the precedence is inherited behavior, kept rather
    /// than asserted.
    ///
    /// [`is_compatible_with`]: ChoiceVector::is_compatible_with
    pub fn merged_with(&self, other: &ChoiceVector) -> ChoiceVector {
        let slots = self
            .slots
            .iter()
            .zip(&other.slots)
            .map(|(a, b)| a.or(*b))
            .collect();
        ChoiceVector { slots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_distinct() {
        let a = Choice::pack(0b1100_0000, 1, 0b1100_0000);
        let b = Choice::pack(0b1100_0000, 2, 0b1100_0000);
        assert_ne!(a, b);
        assert_eq!(a.raw() & 0xFFFF, 0b1100_0000);
    }

    #[test]
    fn test_compatibility() {
        let c = Choice::pack(1, 0, 1);
        let d = Choice::pack(2, 0, 2);

        let mut left = ChoiceVector::unconstrained(2);
        let mut right = ChoiceVector::unconstrained(2);
        assert!(left.is_compatible_with(&right));

        left.set(0, c);
        assert!(left.is_compatible_with(&right));

        right.set(0, c);
        right.set(1, d);
        assert!(left.is_compatible_with(&right));

        right.set(0, d);
        assert!(!left.is_compatible_with(&right));
    }

    #[test]
    fn test_merge_prefers_constrained() {
        let c = Choice::pack(1, 0, 1);
        let d = Choice::pack(2, 0, 2);

        let mut left = ChoiceVector::unconstrained(2);
        let mut right = ChoiceVector::unconstrained(2);
        left.set(0, c);
        right.set(1, d);

        let merged = left.merged_with(&right);
        assert_eq!(merged.get(0), Some(c));
        assert_eq!(merged.get(1), Some(d));
    }

    #[test]
    fn test_merge_left_wins() {
        let c = Choice::pack(1, 0, 1);
        let d = Choice::pack(2, 0, 2);

        let mut left = ChoiceVector::unconstrained(1);
        let mut right = ChoiceVector::unconstrained(1);
        left.set(0, c);
        right.set(0, d);

        assert_eq!(left.merged_with(&right).get(0), Some(c));
    }
}
