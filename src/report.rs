//! Terminal rendering of a [`Computation`].

use colored::*;

use crate::engine::{CalculationResult, Computation};
use crate::validate::{Field, RawInputs};

/// Whole number with thousands separators, or `unbounded` when non-finite.
pub fn format_count(x: f64) -> String {
    if !x.is_finite() {
        return "unbounded".to_string();
    }
    let digits = format!("{:.0}", x.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if x < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// Fraction rendered as a percentage with two decimals.
pub fn format_pct(fraction: f64) -> String {
    if fraction.is_finite() {
        format!("{:.2}%", fraction * 100.0)
    } else {
        "n/a".to_string()
    }
}

fn render_inputs(raw: &RawInputs, out: &mut String) {
    out.push_str(&format!("{}\n", "Inputs".bold()));
    for field in Field::ALL {
        out.push_str(&format!("  {:<28} {}\n", field.label(), raw.get(field)));
    }
}

fn render_result(r: &CalculationResult, out: &mut String) {
    out.push_str(&format!("{}\n", "Result".bold()));
    out.push_str(&format!(
        "  {:<28} {}\n",
        "Expected variant rate",
        format_pct(r.expected_variant_rate)
    ));
    out.push_str(&format!(
        "  {:<28} {}\n",
        "Sample size per group",
        format_count(r.sample_size_per_group).bright_cyan().bold()
    ));
    out.push_str(&format!(
        "  {:<28} {}\n",
        "Total sample size",
        format_count(r.total_sample_size)
    ));
    let days = match r.duration_count() {
        Some(1) => "1 day".to_string(),
        Some(_) => format!("{} days", format_count(r.duration_days)),
        None => format_count(r.duration_days),
    };
    out.push_str(&format!("  {:<28} {}\n", "Estimated duration", days.bright_green().bold()));
    out.push_str(&format!(
        "  {:<28} control {} / variant {}\n",
        "Daily users per arm",
        format_count(r.control_daily.floor()),
        format_count(r.variant_daily.floor())
    ));
    out.push_str(&format!(
        "  {:<28} z(1-α/2) = {:.4}, z(power) = {:.4}\n",
        "Critical values", r.z_alpha, r.z_beta
    ));
    if r.is_degenerate() {
        out.push_str(&format!(
            "  {}\n",
            "The effect or traffic split is too small to reach significance in finite time."
                .yellow()
        ));
    }
}

/// Human-readable report for the terminal.
pub fn render(computation: &Computation, raw: &RawInputs) -> String {
    let mut out = String::new();
    render_inputs(raw, &mut out);
    out.push('\n');

    if let Some(r) = &computation.result {
        render_result(r, &mut out);
        return out;
    }

    out.push_str(&format!("{}\n", "Cannot compute".red().bold()));
    for (field, message) in computation.errors.iter() {
        out.push_str(&format!("  {} {}\n", format!("[{}]", field.key()).red(), message));
    }
    if let Some(global) = &computation.global_error {
        out.push_str(&format!("  {} {}\n", "[global]".red(), global));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compute;

    #[test]
    fn test_format_count_separators() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1_000.0), "1,000");
        assert_eq!(format_count(18_872.0), "18,872");
        assert_eq!(format_count(1_234_567.0), "1,234,567");
        assert_eq!(format_count(-4_200.0), "-4,200");
    }

    #[test]
    fn test_format_count_non_finite() {
        assert_eq!(format_count(f64::INFINITY), "unbounded");
        assert_eq!(format_count(f64::NAN), "unbounded");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(0.088), "8.80%");
        assert_eq!(format_pct(f64::NAN), "n/a");
    }

    #[test]
    fn test_render_success_mentions_result_lines() {
        let raw = RawInputs::default();
        let text = render(&compute(&raw).unwrap(), &raw);
        assert!(text.contains("Expected variant rate"));
        assert!(text.contains("8.80%"));
        assert!(text.contains("Sample size per group"));
        assert!(text.contains("days"));
    }

    #[test]
    fn test_render_failure_lists_errors() {
        let raw = RawInputs::default()
            .with(Field::BaselineRatePct, "60")
            .with(Field::UpliftPct, "100")
            .with(Field::DailyVisitors, "12.5");
        let text = render(&compute(&raw).unwrap(), &raw);
        assert!(text.contains("dailyVisitors"));
        assert!(text.contains("Daily visitors must be a whole number of at least 1."));
        assert!(text.contains("Expected variant rate reaches or exceeds 100%"));
        assert!(!text.contains("Sample size per group"));
    }
}
