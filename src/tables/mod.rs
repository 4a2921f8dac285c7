// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Tier 1: immutable precomputed tables.
//!
//! Closed-form coalescent quantities built once per process and shared by
//! every evaluation:
//! - `puv` transition coefficients
//! - coalescent path-shape counts

pub mod coalescent;

pub use coalescent::{derivative_puv, number_of_options, puv};
