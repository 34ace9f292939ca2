// =========================================================================
// FALSIFY-SC: scaler contract (reaccion preprocessing)
//
// A fitted scaler is a pure function of its fitted parameters: applying it
// twice to the same value yields the same output, endpoints of the fitted
// range map to the target range boundaries, and fitting never reads anything
// but the slice it was handed.
//
// References:
//   - Pedregosa et al. (2011) "Scikit-learn: Machine Learning in Python"
// =========================================================================

use super::*;
use proptest::prelude::*;

/// FALSIFY-SC-001: transform is idempotent across calls (no hidden state)
#[test]
fn falsify_sc_001_transform_is_pure() {
    let mut scaler = MinMaxScaler::new();
    scaler.fit(&[1.0, 2.0, 9.0]).expect("fit");
    let first = scaler.transform(4.2);
    let second = scaler.transform(4.2);
    assert_eq!(
        first, second,
        "FALSIFIED SC-001: transform(4.2) changed between calls"
    );
}

/// FALSIFY-SC-002: fitted min maps to 0, fitted max maps to 1
#[test]
fn falsify_sc_002_endpoints_map_to_unit_range() {
    let mut scaler = MinMaxScaler::new();
    scaler.fit(&[-3.5, 0.0, 12.25]).expect("fit");
    assert!(
        scaler.transform(-3.5).abs() < 1e-6,
        "FALSIFIED SC-002: min did not map to 0"
    );
    assert!(
        (scaler.transform(12.25) - 1.0).abs() < 1e-6,
        "FALSIFIED SC-002: max did not map to 1"
    );
}

/// FALSIFY-SC-003: refitting on the same reference reproduces the same scaler
#[test]
fn falsify_sc_003_fit_is_deterministic() {
    let reference = [0.25, 1.5, -2.0, 8.0];
    let mut a = StandardScaler::new();
    let mut b = StandardScaler::new();
    a.fit(&reference).expect("fit a");
    b.fit(&reference).expect("fit b");
    assert_eq!(a, b, "FALSIFIED SC-003: identical reference, different fit");
}

proptest! {
    /// FALSIFY-SC-004: min-max round trip recovers the input
    #[test]
    fn falsify_sc_004_minmax_round_trip(
        lo in -1e3_f32..0.0,
        hi in 1.0_f32..1e3,
        x in -1e3_f32..1e3,
    ) {
        let mut scaler = MinMaxScaler::new();
        scaler.fit(&[lo, hi]).expect("fit");
        let back = scaler.inverse_transform(scaler.transform(x));
        let tol = 1e-2 * x.abs().max(1.0);
        prop_assert!((back - x).abs() < tol);
    }

    /// FALSIFY-SC-005: standardized reference values stay bounded by
    /// (max-min)/std, so transform never explodes on in-range input
    #[test]
    fn falsify_sc_005_standard_output_finite(
        values in proptest::collection::vec(-1e3_f32..1e3, 2..32),
        x in -1e3_f32..1e3,
    ) {
        let mut scaler = StandardScaler::new();
        scaler.fit(&values).expect("fit");
        prop_assert!(scaler.transform(x).is_finite());
    }
}
