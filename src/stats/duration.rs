//! Calendar days until both arms reach their sample size.

/// Daily users landing in the control and variant arms.
pub fn arm_daily_traffic(daily_visitors: f64, variant_traffic: f64) -> (f64, f64) {
    let control = daily_visitors * (1.0 - variant_traffic);
    let variant = daily_visitors * variant_traffic;
    (control, variant)
}

/// Whole days for the slower-filling arm to collect `per_group` users.
///
/// No upper cap: a lopsided split yields a very large (or infinite) value.
pub fn duration_days(per_group: f64, daily_visitors: f64, variant_traffic: f64) -> f64 {
    let (control_daily, variant_daily) = arm_daily_traffic(daily_visitors, variant_traffic);
    let control_days = per_group / control_daily;
    let variant_days = per_group / variant_daily;
    control_days.max(variant_days).ceil()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        assert_eq!(duration_days(6_000.0, 12_000.0, 0.5), 1.0);
        assert_eq!(duration_days(6_001.0, 12_000.0, 0.5), 2.0);
    }

    #[test]
    fn test_slower_arm_decides() {
        // 25% to the variant: 250 users/day there, 750 in control
        assert_eq!(duration_days(1_000.0, 1_000.0, 0.25), 4.0);
        assert_eq!(duration_days(1_000.0, 1_000.0, 0.75), 4.0);
    }

    #[test]
    fn test_extreme_split_is_not_capped() {
        let days = duration_days(20_000.0, 1_000.0, 1e-6);
        assert!(days > 1e7);
    }

    #[test]
    fn test_zero_share_is_infinite() {
        assert!(duration_days(10.0, 100.0, 0.0).is_infinite());
    }

    #[test]
    fn test_arm_daily_traffic_sums_to_total() {
        let (c, v) = arm_daily_traffic(12_000.0, 0.3);
        assert!((c + v - 12_000.0).abs() < 1e-9);
        assert!((v - 3_600.0).abs() < 1e-9);
    }
}
