//! Baseline tracker: EWMA-based online learning of a channel baseline.
//!
//! The tracker is a pure function of the previous state: the engine owns
//! one `BaselineStats` per channel and replaces it with the result of
//! [`BaselineTracker::update`] on every sample.

use super::types::BaselineStats;

/// Learns "normal" behavior for a channel.
///
/// Adapts slowly (alpha = 0.1 by default) so a sudden shift stands out
/// against the previous level for several samples.
#[derive(Clone, Copy, Debug)]
pub struct BaselineTracker {
    alpha: f64,
}

impl BaselineTracker {
    /// Create a tracker with the given EWMA learning rate.
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// The configured learning rate.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Incorporate `value` into `prev` and return the new baseline.
    ///
    /// - mean_new = α · value + (1 − α) · mean_old
    /// - var_new = α · (value − mean_new)² + (1 − α) · var_old
    pub fn update(&self, prev: &BaselineStats, value: f64, timestamp_ms: i64) -> BaselineStats {
        if prev.sample_count == 0 {
            return BaselineStats {
                mean: value,
                variance: 0.0,
                std_dev: 0.0,
                sample_count: 1,
                last_update_ms: timestamp_ms,
                min: value,
                max: value,
            };
        }

        let alpha = self.alpha;
        let mean = alpha * value + (1.0 - alpha) * prev.mean;
        let diff = value - mean;
        let variance = alpha * diff * diff + (1.0 - alpha) * prev.variance;

        BaselineStats {
            mean,
            variance,
            std_dev: variance.sqrt(),
            sample_count: prev.sample_count + 1,
            last_update_ms: timestamp_ms,
            min: prev.min.min(value),
            max: prev.max.max(value),
        }
    }
}

impl Default for BaselineTracker {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_BASELINE_ALPHA)
    }
}
