//! Two-sided CUSUM (Cumulative Sum) change detection.
//!
//! Detects persistent small shifts that a z-score threshold would miss.
//! Slack and decision interval scale with the baseline standard deviation:
//!
//! - high = max(0, high + (x − mean) − k)
//! - low  = min(0, low + (x − mean) + k)
//!
//! with k = 0.5σ and h = 4σ by default.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::baseline::{BaselineStats, Channel};
use crate::config::CusumConfig;

/// Direction of a detected shift.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftDirection {
    Increase,
    Decrease,
    None,
}

impl std::fmt::Display for ShiftDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increase => write!(f, "increase"),
            Self::Decrease => write!(f, "decrease"),
            Self::None => write!(f, "none"),
        }
    }
}

/// CUSUM statistics after one reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CusumResult {
    /// Upper cumulative sum (≥ 0).
    pub cusum_high: f64,
    /// Lower cumulative sum (≤ 0).
    pub cusum_low: f64,
    /// Decision interval h used for this reading.
    pub threshold: f64,
    pub change_detected: bool,
    pub direction: ShiftDirection,
    /// min(1, |statistic| / 2h) for the firing side, 0 otherwise.
    pub confidence: f64,
}

impl CusumResult {
    /// Returned while the baseline is not valid.
    pub const NONE: CusumResult = CusumResult {
        cusum_high: 0.0,
        cusum_low: 0.0,
        threshold: 0.0,
        change_detected: false,
        direction: ShiftDirection::None,
        confidence: 0.0,
    };
}

/// Per-channel CUSUM accumulator.
#[derive(Clone, Debug)]
pub struct CusumDetector {
    config: CusumConfig,
    high: f64,
    low: f64,
}

impl CusumDetector {
    pub fn new(config: CusumConfig) -> Self {
        Self {
            config,
            high: 0.0,
            low: 0.0,
        }
    }

    /// Accumulate `value` against `baseline`.
    ///
    /// With `reset_on_detect` off (the default) the sums keep growing after
    /// a detection, so a sustained shift keeps reporting until the baseline
    /// catches up.
    pub fn update(
        &mut self,
        channel: Channel,
        value: f64,
        baseline: &BaselineStats,
    ) -> CusumResult {
        if !baseline.is_valid() {
            return CusumResult::NONE;
        }

        let k = self.config.slack_sigma * baseline.std_dev;
        let h = self.config.decision_sigma * baseline.std_dev;
        let deviation = value - baseline.mean;

        self.high = (self.high + deviation - k).max(0.0);
        self.low = (self.low + deviation + k).min(0.0);

        let high_fires = self.high > h;
        let low_fires = self.low < -h;
        let (direction, statistic) = match (high_fires, low_fires) {
            (true, true) if -self.low > self.high => (ShiftDirection::Decrease, -self.low),
            (true, _) => (ShiftDirection::Increase, self.high),
            (false, true) => (ShiftDirection::Decrease, -self.low),
            (false, false) => (ShiftDirection::None, 0.0),
        };

        let result = CusumResult {
            cusum_high: self.high,
            cusum_low: self.low,
            threshold: h,
            change_detected: direction != ShiftDirection::None,
            direction,
            confidence: if direction == ShiftDirection::None {
                0.0
            } else {
                (statistic / (2.0 * h)).min(1.0)
            },
        };

        if result.change_detected {
            info!(
                channel = %channel,
                direction = %direction,
                statistic,
                threshold = h,
                "CUSUM change detected"
            );
            if self.config.reset_on_detect {
                self.high = 0.0;
                self.low = 0.0;
            }
        }

        result
    }

    /// Current (high, low) accumulators.
    pub fn statistics(&self) -> (f64, f64) {
        (self.high, self.low)
    }

    pub fn reset(&mut self) {
        self.high = 0.0;
        self.low = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_baseline(mean: f64, std_dev: f64) -> BaselineStats {
        BaselineStats {
            mean,
            variance: std_dev * std_dev,
            std_dev,
            sample_count: 500,
            ..BaselineStats::EMPTY
        }
    }

    #[test]
    fn detects_persistent_upward_drift() {
        let mut cusum = CusumDetector::new(CusumConfig::default());
        let b = make_baseline(100.0, 10.0);

        // Each reading adds 15 − 5 = 10 to the upper sum; h = 40.
        let mut fired_at = None;
        for i in 0..20 {
            let r = cusum.update(Channel::Dose, 115.0, &b);
            if r.change_detected {
                fired_at = Some(i);
                assert_eq!(r.direction, ShiftDirection::Increase);
                break;
            }
        }
        assert_eq!(fired_at, Some(4));
    }

    #[test]
    fn detects_downward_drift() {
        let mut cusum = CusumDetector::new(CusumConfig::default());
        let b = make_baseline(100.0, 10.0);
        let mut last = CusumResult::NONE;
        for _ in 0..10 {
            last = cusum.update(Channel::CountRate, 80.0, &b);
        }
        assert!(last.change_detected);
        assert_eq!(last.direction, ShiftDirection::Decrease);
        assert!(last.cusum_low < -last.threshold);
        assert!(last.confidence > 0.0 && last.confidence <= 1.0);
    }

    #[test]
    fn no_alert_for_balanced_noise() {
        let mut cusum = CusumDetector::new(CusumConfig::default());
        let b = make_baseline(100.0, 10.0);
        for i in 0..200 {
            let value = 100.0 + if i % 2 == 0 { 3.0 } else { -3.0 };
            let r = cusum.update(Channel::Dose, value, &b);
            assert!(!r.change_detected);
        }
    }

    #[test]
    fn statistics_keep_accumulating_by_default() {
        let mut cusum = CusumDetector::new(CusumConfig::default());
        let b = make_baseline(0.0, 1.0);
        let mut highs = Vec::new();
        for _ in 0..10 {
            let r = cusum.update(Channel::Dose, 2.0, &b);
            highs.push(r.cusum_high);
        }
        assert!(highs.windows(2).all(|w| w[1] > w[0]));
        assert!((highs[9] - 15.0).abs() < 1e-9);
    }

    #[test]
    fn reset_on_detect_clears_sums() {
        let config = CusumConfig {
            reset_on_detect: true,
            ..CusumConfig::default()
        };
        let mut cusum = CusumDetector::new(config);
        let b = make_baseline(0.0, 1.0);
        let mut detections = 0;
        for _ in 0..10 {
            if cusum.update(Channel::Dose, 2.0, &b).change_detected {
                detections += 1;
                assert_eq!(cusum.statistics(), (0.0, 0.0));
            }
        }
        // 1.5 per reading crosses h = 4 on every third reading.
        assert_eq!(detections, 3);
    }

    #[test]
    fn invalid_baseline_leaves_state_untouched() {
        let mut cusum = CusumDetector::new(CusumConfig::default());
        let b = BaselineStats {
            sample_count: 3,
            ..make_baseline(0.0, 1.0)
        };
        assert_eq!(cusum.update(Channel::Dose, 50.0, &b), CusumResult::NONE);
        assert_eq!(cusum.statistics(), (0.0, 0.0));
    }
}
