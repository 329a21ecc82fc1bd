//! Load classification rules.
//!
//! All comparisons are done in integer percent so the boundary cases
//! (exactly 80%, exactly 100%) are exact.

use crowdwatch_types::LocationStatus;

/// Default warning threshold in percent of capacity.
pub const DEFAULT_WARNING_PERCENT: u32 = 80;

/// Classify a location by its count and capacity.
///
/// - `Critical` when `count > capacity` (strictly over).
/// - `Warning` when `count / capacity >= warning_percent / 100`.
/// - `Normal` otherwise, including every zero-capacity location that is
///   empty.
///
/// A location at exactly its capacity is `Warning`, not `Critical`.
pub fn determine_status(count: u32, capacity: u32, warning_percent: u32) -> LocationStatus {
    if count > capacity {
        return LocationStatus::Critical;
    }
    if capacity == 0 {
        return LocationStatus::Normal;
    }

    let scaled_count = u64::from(count).saturating_mul(100);
    let threshold = u64::from(warning_percent).saturating_mul(u64::from(capacity));
    if scaled_count >= threshold {
        LocationStatus::Warning
    } else {
        LocationStatus::Normal
    }
}

/// Load as a percentage of capacity (`100 * count / capacity`).
///
/// Returns `0.0` for a zero-capacity location.
pub fn load_percentage(count: u32, capacity: u32) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    f64::from(count) * 100.0 / f64::from(capacity)
}

/// Load percentage truncated toward zero, as shown in alert text.
pub fn whole_percentage(count: u32, capacity: u32) -> u64 {
    u64::from(count)
        .saturating_mul(100)
        .checked_div(u64::from(capacity))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = DEFAULT_WARNING_PERCENT;

    #[test]
    fn below_threshold_is_normal() {
        assert_eq!(determine_status(0, 30, W), LocationStatus::Normal);
        assert_eq!(determine_status(23, 30, W), LocationStatus::Normal);
    }

    #[test]
    fn exactly_eighty_percent_is_warning() {
        assert_eq!(determine_status(24, 30, W), LocationStatus::Warning);
        assert_eq!(determine_status(40, 50, W), LocationStatus::Warning);
    }

    #[test]
    fn at_capacity_is_warning_not_critical() {
        assert_eq!(determine_status(30, 30, W), LocationStatus::Warning);
    }

    #[test]
    fn over_capacity_is_critical() {
        assert_eq!(determine_status(31, 30, W), LocationStatus::Critical);
    }

    #[test]
    fn zero_capacity_guard() {
        assert_eq!(determine_status(0, 0, W), LocationStatus::Normal);
        assert_eq!(determine_status(1, 0, W), LocationStatus::Critical);
        assert!(load_percentage(5, 0).abs() < f64::EPSILON);
        assert_eq!(whole_percentage(5, 0), 0);
    }

    #[test]
    fn percentages() {
        assert!((load_percentage(15, 30) - 50.0).abs() < 1e-9);
        assert!((load_percentage(31, 30) - 103.333_333_333).abs() < 1e-6);
        assert_eq!(whole_percentage(29, 30), 96);
        assert_eq!(whole_percentage(30, 30), 100);
    }
}
