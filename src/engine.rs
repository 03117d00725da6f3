//! # Stage: Sample-Size Engine
//!
//! ## Responsibility
//! The one entry point a host needs: validate the raw inputs, derive the two
//! critical values, size each arm and estimate the duration.
//!
//! ## Guarantees
//! - Pure and deterministic: no shared state, every call returns a fresh record
//! - Validation failures come back as data with `result: None`
//! - Degenerate arithmetic (`∞`, `NaN`) propagates into the result unchanged
//!
//! ## NOT Responsible For
//! - Rendering (see [`crate::report`] and [`crate::web`])
//! - Remembering previous results (the caller owns state)

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::stats::{
    arm_daily_traffic, duration_days, expected_variant_rate, inverse_normal_cdf,
    sample_size_per_group,
};
use crate::validate::{validate, FieldErrors, ParsedInputs, RawInputs};

// ---------------------------------------------------------------------------
// CalculationResult
// ---------------------------------------------------------------------------

/// Output of one successful computation.
///
/// Counts are `f64` so that non-finite outcomes can be carried through;
/// serialized non-finite values become `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub sample_size_per_group: f64,
    pub total_sample_size: f64,
    pub duration_days: f64,
    pub expected_variant_rate: f64,
    /// Two-sided critical value `Φ⁻¹(1 − α/2)`.
    pub z_alpha: f64,
    /// `Φ⁻¹(power)`.
    pub z_beta: f64,
    pub control_daily: f64,
    pub variant_daily: f64,
}

impl CalculationResult {
    /// True when the sample size or duration is not a positive finite number.
    pub fn is_degenerate(&self) -> bool {
        !(self.sample_size_per_group.is_finite()
            && self.sample_size_per_group > 0.0
            && self.duration_days.is_finite()
            && self.duration_days > 0.0)
    }

    /// Users per arm as an integer, if representable.
    pub fn per_group_count(&self) -> Option<u64> {
        as_count(self.sample_size_per_group)
    }

    pub fn total_count(&self) -> Option<u64> {
        as_count(self.total_sample_size)
    }

    pub fn duration_count(&self) -> Option<u64> {
        as_count(self.duration_days)
    }
}

fn as_count(x: f64) -> Option<u64> {
    (x.is_finite() && x >= 0.0 && x <= u64::MAX as f64).then_some(x as u64)
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Everything a host needs to render one interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Computation {
    pub errors: FieldErrors,
    pub global_error: Option<String>,
    pub result: Option<CalculationResult>,
}

impl Computation {
    pub fn is_ok(&self) -> bool {
        self.result.is_some()
    }
}

/// Size an experiment from already-validated inputs.
///
/// Errs only when a probability handed to the quantile function falls
/// outside (0, 1), which validated inputs never produce.
pub fn calculate(parsed: &ParsedInputs) -> Result<CalculationResult> {
    let z_alpha = inverse_normal_cdf(1.0 - parsed.alpha / 2.0)?;
    let z_beta = inverse_normal_cdf(parsed.power)?;

    let per_group = sample_size_per_group(parsed.baseline_rate, parsed.uplift, z_alpha, z_beta);
    let days = duration_days(per_group, parsed.daily_visitors, parsed.variant_traffic);
    let (control_daily, variant_daily) =
        arm_daily_traffic(parsed.daily_visitors, parsed.variant_traffic);

    Ok(CalculationResult {
        sample_size_per_group: per_group,
        total_sample_size: 2.0 * per_group,
        duration_days: days,
        expected_variant_rate: expected_variant_rate(parsed.baseline_rate, parsed.uplift),
        z_alpha,
        z_beta,
        control_daily,
        variant_daily,
    })
}

/// Validate `raw` and, when it passes, compute the result.
pub fn compute(raw: &RawInputs) -> Result<Computation> {
    let validation = validate(raw);
    if !validation.is_valid() {
        debug!(
            field_errors = validation.errors.len(),
            global = validation.global_error.is_some(),
            "validation rejected inputs"
        );
        return Ok(Computation {
            errors: validation.errors,
            global_error: validation.global_error,
            result: None,
        });
    }

    let result = calculate(&validation.parsed)?;
    if result.is_degenerate() {
        warn!(
            per_group = result.sample_size_per_group,
            days = result.duration_days,
            "computation produced a non-finite or non-positive result"
        );
    } else {
        debug!(
            per_group = result.sample_size_per_group,
            days = result.duration_days,
            "computed sample size"
        );
    }

    Ok(Computation {
        errors: validation.errors,
        global_error: None,
        result: Some(result),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SizerError;
    use crate::validate::Field;

    fn parsed(alpha: f64, power: f64) -> ParsedInputs {
        ParsedInputs {
            baseline_rate: 0.08,
            uplift: 0.1,
            alpha,
            power,
            daily_visitors: 12_000.0,
            variant_traffic: 0.5,
        }
    }

    #[test]
    fn test_default_inputs_produce_result() {
        let c = compute(&RawInputs::default()).unwrap();
        assert!(c.is_ok());
        assert!(c.errors.is_empty());
        assert!(c.global_error.is_none());
        let r = c.result.unwrap();
        assert!((r.expected_variant_rate - 0.088).abs() < 1e-12);
        assert_eq!(r.total_sample_size, 2.0 * r.sample_size_per_group);
        assert!(!r.is_degenerate());
    }

    #[test]
    fn test_invalid_inputs_produce_no_result() {
        let raw = RawInputs::default().with(Field::DailyVisitors, "12.5");
        let c = compute(&raw).unwrap();
        assert!(c.result.is_none());
        assert!(!c.errors.get(Field::DailyVisitors).is_empty());
    }

    #[test]
    fn test_calculate_rejects_out_of_domain_power() {
        let err = calculate(&parsed(0.05, 1.0)).unwrap_err();
        assert!(matches!(err, SizerError::Quantile(e) if e.p == 1.0));
    }

    #[test]
    fn test_calculate_rejects_out_of_domain_alpha() {
        assert!(calculate(&parsed(2.0, 0.8)).is_err());
    }

    #[test]
    fn test_degenerate_when_uplift_vanishes() {
        let mut p = parsed(0.05, 0.8);
        p.uplift = 0.0;
        let r = calculate(&p).unwrap();
        assert!(r.is_degenerate());
        assert_eq!(r.per_group_count(), None);
        assert!(r.total_sample_size.is_infinite());
    }

    #[test]
    fn test_counts_for_finite_result() {
        let r = calculate(&parsed(0.05, 0.8)).unwrap();
        let n = r.per_group_count().unwrap();
        assert_eq!(r.total_count(), Some(2 * n));
        assert_eq!(r.duration_count(), Some(r.duration_days as u64));
    }

    #[test]
    fn test_non_finite_serializes_as_null() {
        let mut p = parsed(0.05, 0.8);
        p.uplift = 0.0;
        let r = calculate(&p).unwrap();
        let json = serde_json::to_value(r).unwrap();
        assert!(json["sampleSizePerGroup"].is_null());
        assert!(json["expectedVariantRate"].is_number());
    }
}
