//! # Stage: Input Validator
//!
//! ## Responsibility
//! Turn the six user-entered strings into unit-normalized numbers and report
//! every out-of-range field plus the cross-field variant-rate check.
//!
//! ## Guarantees
//! - Never fails: problems are returned as messages, one per field
//! - [`ParsedInputs`] is always produced; unparseable text becomes `NaN`
//! - The variant-rate check runs even when individual fields are invalid
//!
//! ## NOT Responsible For
//! - Deciding whether to compute (see [`crate::engine::compute`])

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::expected_variant_rate;

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// One of the six calculator inputs. The serialized name doubles as the
/// URL query key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    BaselineRatePct,
    UpliftPct,
    SignificancePct,
    PowerPct,
    DailyVisitors,
    VariantTrafficPct,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::BaselineRatePct,
        Field::UpliftPct,
        Field::SignificancePct,
        Field::PowerPct,
        Field::DailyVisitors,
        Field::VariantTrafficPct,
    ];

    /// Query-string key.
    pub fn key(self) -> &'static str {
        match self {
            Field::BaselineRatePct => "baselineRatePct",
            Field::UpliftPct => "upliftPct",
            Field::SignificancePct => "significancePct",
            Field::PowerPct => "powerPct",
            Field::DailyVisitors => "dailyVisitors",
            Field::VariantTrafficPct => "variantTrafficPct",
        }
    }

    /// Human-readable label used in messages and reports.
    pub fn label(self) -> &'static str {
        match self {
            Field::BaselineRatePct => "Baseline conversion rate",
            Field::UpliftPct => "Minimum detectable uplift",
            Field::SignificancePct => "Significance level",
            Field::PowerPct => "Statistical power",
            Field::DailyVisitors => "Daily visitors",
            Field::VariantTrafficPct => "Variant traffic share",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ---------------------------------------------------------------------------
// RawInputs
// ---------------------------------------------------------------------------

pub const DEFAULT_BASELINE_RATE_PCT: &str = "8";
pub const DEFAULT_UPLIFT_PCT: &str = "10";
pub const DEFAULT_SIGNIFICANCE_PCT: &str = "5";
pub const DEFAULT_POWER_PCT: &str = "80";
pub const DEFAULT_DAILY_VISITORS: &str = "12000";
pub const DEFAULT_VARIANT_TRAFFIC_PCT: &str = "50";

/// The six values exactly as the user typed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInputs {
    pub baseline_rate_pct: String,
    pub uplift_pct: String,
    pub significance_pct: String,
    pub power_pct: String,
    pub daily_visitors: String,
    pub variant_traffic_pct: String,
}

impl Default for RawInputs {
    fn default() -> Self {
        Self {
            baseline_rate_pct: DEFAULT_BASELINE_RATE_PCT.into(),
            uplift_pct: DEFAULT_UPLIFT_PCT.into(),
            significance_pct: DEFAULT_SIGNIFICANCE_PCT.into(),
            power_pct: DEFAULT_POWER_PCT.into(),
            daily_visitors: DEFAULT_DAILY_VISITORS.into(),
            variant_traffic_pct: DEFAULT_VARIANT_TRAFFIC_PCT.into(),
        }
    }
}

impl RawInputs {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::BaselineRatePct => &self.baseline_rate_pct,
            Field::UpliftPct => &self.uplift_pct,
            Field::SignificancePct => &self.significance_pct,
            Field::PowerPct => &self.power_pct,
            Field::DailyVisitors => &self.daily_visitors,
            Field::VariantTrafficPct => &self.variant_traffic_pct,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::BaselineRatePct => self.baseline_rate_pct = value,
            Field::UpliftPct => self.uplift_pct = value,
            Field::SignificancePct => self.significance_pct = value,
            Field::PowerPct => self.power_pct = value,
            Field::DailyVisitors => self.daily_visitors = value,
            Field::VariantTrafficPct => self.variant_traffic_pct = value,
        }
    }

    /// Builder-style [`RawInputs::set`].
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }
}

// ---------------------------------------------------------------------------
// ParsedInputs
// ---------------------------------------------------------------------------

/// Numeric, unit-normalized inputs. Percentages are fractions; daily visitors
/// is a count. Only trustworthy when the accompanying [`Validation`] is valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInputs {
    pub baseline_rate: f64,
    pub uplift: f64,
    pub alpha: f64,
    pub power: f64,
    pub daily_visitors: f64,
    pub variant_traffic: f64,
}

// ---------------------------------------------------------------------------
// Validation result
// ---------------------------------------------------------------------------

/// Per-field messages. A field without an entry is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    /// Message for `field`, or `""` when it is valid.
    pub fn get(&self, field: Field) -> &str {
        self.0.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn insert(&mut self, field: Field, message: String) {
        self.0.insert(field, message);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub errors: FieldErrors,
    pub global_error: Option<String>,
    pub parsed: ParsedInputs,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.global_error.is_none()
    }
}

pub const VARIANT_RATE_TOO_HIGH: &str =
    "Expected variant rate reaches or exceeds 100%. Lower the baseline rate or the uplift.";

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Parse `raw` as a number. Anything unparseable becomes `NaN`.
fn parse_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Range rule for one field, evaluated on the value as typed (percent or count).
fn in_range(field: Field, x: f64) -> bool {
    match field {
        Field::BaselineRatePct => x > 0.0 && x < 100.0,
        Field::UpliftPct => x > 0.0 && x <= 500.0,
        Field::SignificancePct => x > 0.0 && x < 50.0,
        Field::PowerPct => x > 50.0 && x < 99.9,
        Field::DailyVisitors => x.fract() == 0.0 && x >= 1.0,
        Field::VariantTrafficPct => x > 0.0 && x < 100.0,
    }
}

fn range_message(field: Field) -> String {
    let rule = match field {
        Field::BaselineRatePct => "must be greater than 0% and less than 100%",
        Field::UpliftPct => "must be greater than 0% and at most 500%",
        Field::SignificancePct => "must be greater than 0% and less than 50%",
        Field::PowerPct => "must be greater than 50% and less than 99.9%",
        Field::DailyVisitors => "must be a whole number of at least 1",
        Field::VariantTrafficPct => "must be greater than 0% and less than 100%",
    };
    format!("{} {rule}.", field.label())
}

/// Check every field and the derived variant rate.
pub fn validate(raw: &RawInputs) -> Validation {
    let mut errors = FieldErrors::default();
    let mut values = [0.0; 6];

    for (slot, field) in values.iter_mut().zip(Field::ALL) {
        let x = parse_number(raw.get(field));
        *slot = x;
        if !x.is_finite() {
            errors.insert(field, format!("{} must be a number.", field.label()));
        } else if !in_range(field, x) {
            errors.insert(field, range_message(field));
        }
    }

    let [baseline, uplift, significance, power, daily, variant] = values;
    let parsed = ParsedInputs {
        baseline_rate: baseline / 100.0,
        uplift: uplift / 100.0,
        alpha: significance / 100.0,
        power: power / 100.0,
        daily_visitors: daily,
        variant_traffic: variant / 100.0,
    };

    let variant_rate = expected_variant_rate(parsed.baseline_rate, parsed.uplift);
    let global_error = (variant_rate.is_finite() && variant_rate >= 1.0)
        .then(|| VARIANT_RATE_TOO_HIGH.to_string());

    Validation { errors, global_error, parsed }
}
