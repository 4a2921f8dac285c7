// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Demo: evaluate the seven-taxon introgression model and spot-check the
//! analytic gradient of the inheritance probability against a central
//! difference.

use netcoal::fixtures::{introgression_network, seven_taxon_gene_tree, INTROGRESSION_ID};
use netcoal::{calc_probability, calc_probability_with_gradient, ModelError};

fn main() -> Result<(), ModelError> {
    let gene = seven_taxon_gene_tree();

    let (probability, gradient) = calc_probability_with_gradient(&introgression_network(0.0), &gene)?;
    println!("gene tree: {}", gene);
    println!("probability: {:.6e}", probability);
    for (param_id, value) in gradient.iter().enumerate() {
        println!("d/d[{:2}]: {:+.6e}", param_id, value);
    }

    let dx = 1e-7;
    let plus = calc_probability(&introgression_network(dx), &gene)?;
    let minus = calc_probability(&introgression_network(-dx), &gene)?;
    let central = (plus - minus) / (2.0 * dx);
    println!(
        "d/d[{:2}] by central difference: {:+.6e}",
        INTROGRESSION_ID, central
    );

    Ok(())
}
