// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Reference-value test of the reticulation split on a two-lineage
//! distribution, covering every emitted piece of both sides.

mod common;

use common::assert_close;
use netcoal::densemap::{split, update, DenseMap};
use netcoal::{ChoiceVector, Event, History};

#[test]
fn test_split_after_update() {
    // Two lineages (slots 6 and 7) evolve for unit time; with rate 1 they
    // coalesce with probability 1 - e^-1.
    let mut source = DenseMap::new(0b1100_0000, ChoiceVector::unconstrained(1));
    source.set(History::EMPTY, 1.0);
    let events = [Event::from_bits(0b1100_0000)];

    let updated = update(&source, &events, 1.0);
    assert_close(updated.mass(History::EMPTY), 0.367879);
    assert_close(updated.mass(History::from_bits(1)), 0.632121);

    let (left, right) = split(&[updated], 0, &events, 0.25);
    assert_eq!(left.len(), 6);
    assert_eq!(right.len(), 6);

    // Pieces 0..4 come from the uncoalesced history (subsets of the two
    // taxon slots, high bit first), pieces 4..6 from the coalesced one
    // (subsets of the event product). Reference masses are
    // sqrt(mass) * 0.25^n on the left and sqrt(mass) * 0.75^n on the right.
    let h0 = History::EMPTY;
    let h1 = History::from_bits(1);
    let expected = [
        // (taxa_bits, history, left mass, right mass)
        (0b0000_0000, h0, 0.6065306597, 0.6065306597),
        (0b1000_0000, h0, 0.1516326649, 0.4548979948),
        (0b0100_0000, h0, 0.1516326649, 0.4548979948),
        (0b1100_0000, h0, 0.0379081662, 0.3411734961),
        (0b0000_0000, h0, 0.7950600976, 0.7950600976),
        (0b1100_0000, h1, 0.1987650244, 0.5962950732),
    ];

    for (i, (taxa, history, left_mass, right_mass)) in expected.into_iter().enumerate() {
        assert_eq!(left[i].taxa_bits(), taxa, "left taxa at {}", i);
        assert_eq!(right[i].taxa_bits(), taxa, "right taxa at {}", i);
        assert_close(left[i].mass(history), left_mass);
        assert_close(right[i].mass(history), right_mass);
    }
}

#[test]
fn test_split_pieces_carry_complementary_choices() {
    let mut source = DenseMap::new(0b1100_0000, ChoiceVector::unconstrained(1));
    source.set(History::EMPTY, 1.0);

    let (left, right) = split(&[source], 0, &[], 0.5);
    assert_eq!(left.len(), 4);

    // Subset j on the left pairs with its complement on the right; the
    // choice tags must agree exactly for those pairs and only those.
    for j in 0..4 {
        let partner = j ^ 3;
        assert_eq!(left[j].choices().get(0), right[partner].choices().get(0));
        assert!(left[j].is_compatible(&right[partner]));
        assert!(!left[j].is_compatible(&right[j]));
    }
}
