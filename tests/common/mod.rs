// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

/// Assert that `actual` is within `tolerance` of `expected`, absolutely.
pub fn assert_close_to(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} to be within {} of {}",
        actual,
        tolerance,
        expected
    );
}

/// Assert agreement to roughly single-precision relative accuracy, which is
/// what the published reference values carry.
pub fn assert_close(actual: f64, expected: f64) {
    assert_close_to(actual, expected, 1e-5 * expected.abs().max(1e-12));
}
