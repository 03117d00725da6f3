//! # Stage: Normal Quantile
//!
//! ## Responsibility
//! Inverse standard-normal CDF via Acklam's rational approximation, plus a
//! forward CDF accurate enough to round-trip it.
//!
//! ## Guarantees
//! - Relative error of the quantile is about 1.15e-9 in the central region
//! - No iterative refinement: results are the plain rational approximation
//! - `p` outside the open interval (0, 1) is a [`QuantileDomainError`], never a panic
//!
//! ## NOT Responsible For
//! - Choosing one- or two-sided critical values (see [`crate::engine`])

use crate::error::QuantileDomainError;

// ---------------------------------------------------------------------------
// Acklam coefficients
// ---------------------------------------------------------------------------

/// Central-region numerator.
const A: [f64; 6] = [
    -3.969683028665376e+01,
    2.209460984245205e+02,
    -2.759285104469687e+02,
    1.383577518672690e+02,
    -3.066479806614716e+01,
    2.506628277459239e+00,
];

/// Central-region denominator.
const B: [f64; 5] = [
    -5.447609879822406e+01,
    1.615858368580409e+02,
    -1.556989798598866e+02,
    6.680131188771972e+01,
    -1.328068155288572e+01,
];

/// Tail numerator.
const C: [f64; 6] = [
    -7.784894002430293e-03,
    -3.223964580411365e-01,
    -2.400758277161838e+00,
    -2.549732539343734e+00,
    4.374664141464968e+00,
    2.938163982698783e+00,
];

/// Tail denominator.
const D: [f64; 4] = [
    7.784695709041462e-03,
    3.224671290700398e-01,
    2.445134137142996e+00,
    3.754408661907416e+00,
];

/// Boundary between the tail and central regimes.
pub const P_LOW: f64 = 0.02425;
pub const P_HIGH: f64 = 1.0 - P_LOW;

// ---------------------------------------------------------------------------
// Inverse CDF
// ---------------------------------------------------------------------------

/// Return `z` such that `Φ(z) = p`.
///
/// Fails when `p <= 0`, `p >= 1` or `p` is NaN.
pub fn inverse_normal_cdf(p: f64) -> Result<f64, QuantileDomainError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(QuantileDomainError { p });
    }

    let z = if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        tail(q)
    } else if p > P_HIGH {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -tail(q)
    } else {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    };
    Ok(z)
}

fn tail(q: f64) -> f64 {
    (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
        / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
}

// ---------------------------------------------------------------------------
// Forward CDF
// ---------------------------------------------------------------------------

/// Standard normal CDF `Φ(x)`, absolute error below 1.2e-7.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Complementary error function, Chebyshev fit with fractional error < 1.2e-7.
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.26551223
        + t * (1.00002368
        + t * (0.37409196
        + t * (0.09678418
        + t * (-0.18628806
        + t * (0.27886807
        + t * (-1.13520398
        + t * (1.48851587
        + t * (-0.82215223
        + t * 0.17087277))))))));
    let ans = t * poly.exp();
    if x >= 0.0 { ans } else { 2.0 - ans }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_median_is_exactly_zero() {
        assert_eq!(inverse_normal_cdf(0.5).unwrap(), 0.0);
    }

    #[test]
    fn test_two_sided_five_percent_critical_value() {
        let z = inverse_normal_cdf(0.975).unwrap();
        assert!((z - 1.959964).abs() < 1e-4, "got {z}");
    }

    #[test]
    fn test_eighty_percent_power_quantile() {
        let z = inverse_normal_cdf(0.8).unwrap();
        assert!((z - 0.841621).abs() < 1e-4, "got {z}");
    }

    #[test]
    fn test_low_tail_branch() {
        // Φ⁻¹(0.001) ≈ -3.090232
        let z = inverse_normal_cdf(0.001).unwrap();
        assert!((z + 3.090232).abs() < 1e-5, "got {z}");
    }

    #[test]
    fn test_high_tail_branch_mirrors_low_tail() {
        let lo = inverse_normal_cdf(0.01).unwrap();
        let hi = inverse_normal_cdf(0.99).unwrap();
        assert!((lo + hi).abs() < 1e-9);
        assert!(hi > 2.32 && hi < 2.33);
    }

    #[test]
    fn test_regime_boundaries_are_continuous() {
        let below = inverse_normal_cdf(P_LOW - 1e-12).unwrap();
        let above = inverse_normal_cdf(P_LOW + 1e-12).unwrap();
        assert!((below - above).abs() < 1e-6);
    }

    #[test]
    fn test_domain_errors() {
        assert_eq!(inverse_normal_cdf(0.0), Err(QuantileDomainError { p: 0.0 }));
        assert_eq!(inverse_normal_cdf(1.0), Err(QuantileDomainError { p: 1.0 }));
        assert!(inverse_normal_cdf(-0.2).is_err());
        assert!(inverse_normal_cdf(1.7).is_err());
        assert!(inverse_normal_cdf(f64::NAN).is_err());
    }

    #[test]
    fn test_normal_cdf_known_points() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.959964) - 0.975).abs() < 1e-6);
        assert!((normal_cdf(-1.0) - 0.158655).abs() < 1e-6);
    }

    #[test]
    fn test_normal_cdf_extremes_saturate() {
        assert!(normal_cdf(40.0) > 0.999_999);
        assert!(normal_cdf(-40.0) < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_round_trip_through_cdf(p in 1e-9f64..0.999_999_999f64) {
            let z = inverse_normal_cdf(p).unwrap();
            prop_assert!((normal_cdf(z) - p).abs() < 1e-6);
        }

        #[test]
        fn prop_quantile_is_strictly_increasing(a in 1e-6f64..0.999_99f64, step in 1e-4f64..1e-2f64) {
            let b = a + step;
            prop_assume!(b < 1.0);
            prop_assert!(inverse_normal_cdf(a).unwrap() < inverse_normal_cdf(b).unwrap());
        }
    }
}
