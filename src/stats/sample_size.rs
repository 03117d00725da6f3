//! Two-proportion z-test sample size.
//!
//! Pooled variance under the null drives the alpha term, unpooled variance
//! under the alternative drives the beta term.

/// Expected variant conversion rate `p1 × (1 + u)`.
pub fn expected_variant_rate(baseline: f64, uplift: f64) -> f64 {
    baseline * (1.0 + uplift)
}

/// Required users per arm, rounded up.
///
/// Returns `+∞` when the uplift is too small to separate the two rates
/// numerically; that value is propagated, not clamped.
pub fn sample_size_per_group(baseline: f64, uplift: f64, z_alpha: f64, z_beta: f64) -> f64 {
    let p1 = baseline;
    let p2 = expected_variant_rate(p1, uplift);
    let pooled = (p1 + p2) / 2.0;
    let diff = (p2 - p1).abs();

    let null_term = z_alpha * (2.0 * pooled * (1.0 - pooled)).sqrt();
    let alt_term = z_beta * (p1 * (1.0 - p1) + p2 * (1.0 - p2)).sqrt();
    let numerator = null_term + alt_term;

    (numerator * numerator / (diff * diff)).ceil()
}

#[cfg(test)]
mod tests {
    use super::*;

    const Z_975: f64 = 1.959963984540054;
    const Z_80: f64 = 0.8416212335729143;

    #[test]
    fn test_expected_variant_rate() {
        assert!((expected_variant_rate(0.08, 0.10) - 0.088).abs() < 1e-12);
    }

    #[test]
    fn test_default_scenario_magnitude() {
        let n = sample_size_per_group(0.08, 0.10, Z_975, Z_80);
        assert!(n > 18_000.0 && n < 20_000.0, "got {n}");
        assert_eq!(n, n.trunc());
    }

    #[test]
    fn test_larger_effect_needs_fewer_users() {
        let small = sample_size_per_group(0.10, 0.05, Z_975, Z_80);
        let large = sample_size_per_group(0.10, 0.50, Z_975, Z_80);
        assert!(large < small);
    }

    #[test]
    fn test_vanishing_uplift_propagates_infinity() {
        let n = sample_size_per_group(0.2, 0.0, Z_975, Z_80);
        assert!(n.is_infinite() && n.is_sign_positive());
    }

    #[test]
    fn test_result_is_whole_number() {
        let n = sample_size_per_group(0.33, 0.07, Z_975, Z_80);
        assert_eq!(n.fract(), 0.0);
        assert!(n >= 1.0);
    }
}
