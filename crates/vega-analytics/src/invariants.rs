//! Engine invariants -- constants that are not tunable.
//!
//! - A baseline emits no judgment before [`MIN_BASELINE_SAMPLES`] samples
//!   and a standard deviation above [`MIN_BASELINE_STD_DEV`]
//! - Physical quantities (forecasts, distances, dose) are never negative
//! - Every detector has a neutral result for unmet preconditions

/// Minimum samples before a channel baseline is valid.
pub const MIN_BASELINE_SAMPLES: u64 = 10;

/// Minimum standard deviation before a channel baseline is valid.
pub const MIN_BASELINE_STD_DEV: f64 = 1e-4;

/// |z| at or above which a reading is anomalous.
pub const ANOMALY_SIGMA: f64 = 2.0;

/// Confidence (percent) for sigma bands 1, 2, 3 and 4+.
pub const SIGMA_CONFIDENCE_PERCENT: [f64; 4] = [68.27, 95.45, 99.73, 99.99];

/// Rates inside ±this band (units/s) count as stable.
pub const RATE_DEAD_ZONE: f64 = 0.0001;

/// Relative rate (percent per second) above which a change is significant.
pub const SIGNIFICANT_PERCENT_PER_SECOND: f64 = 1.0;

/// Absolute rate (in baseline σ per second) above which a change is significant.
pub const SIGNIFICANT_SIGMA_PER_SECOND: f64 = 0.5;

/// Values with magnitude below this are treated as zero in divisions.
pub const NEAR_ZERO: f64 = 1e-9;

/// 95% two-sided normal quantile.
pub const Z_95: f64 = 1.96;

/// Milliseconds per hour.
pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Milliseconds per day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Mean Earth radius in meters (spherical approximation).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Clamp a computed physical quantity to be finite and non-negative.
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_negative_coerces() {
        assert_eq!(non_negative(-3.0), 0.0);
        assert_eq!(non_negative(f64::NAN), 0.0);
        assert_eq!(non_negative(f64::NEG_INFINITY), 0.0);
        assert_eq!(non_negative(2.5), 2.5);
    }

    #[test]
    fn sigma_table_is_increasing() {
        assert!(SIGMA_CONFIDENCE_PERCENT.windows(2).all(|w| w[0] < w[1]));
    }
}
