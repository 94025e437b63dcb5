//! Simplified online Bayesian changepoint detection.
//!
//! Tracks the current "run" (readings since the last regime change) with
//! Welford mean and variance. A reading far outside the run starts a new
//! run. The distance of the run mean from the channel baseline, in baseline
//! σ, is mapped to a changepoint probability.
//!
//! ```text
//!   x ──► |x − run_mean| / run_std > 3 ? ──yes──► new run
//!                      │
//!                      ▼
//!   |run_mean − baseline.mean| / σ ──► probability bucket
//!                      │
//!                      ▼
//!   p > 0.75 ∧ run < 30 ∧ cooldown elapsed ──► changepoint
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::baseline::{BaselineStats, Channel};
use crate::buffer::Sample;
use crate::config::ChangepointConfig;
use crate::invariants::MIN_BASELINE_STD_DEV;

/// Run statistics and changepoint decision after one reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangepointResult {
    /// Estimated probability that a regime change occurred recently.
    pub probability: f64,
    /// Readings in the current run, this one included.
    pub run_length: u32,
    pub run_mean: f64,
    /// Run mean distance from the baseline mean, in baseline σ.
    pub deviation_sigma: f64,
    pub is_changepoint: bool,
}

impl ChangepointResult {
    /// Returned while the baseline is not valid.
    pub const NONE: ChangepointResult = ChangepointResult {
        probability: 0.0,
        run_length: 0,
        run_mean: 0.0,
        deviation_sigma: 0.0,
        is_changepoint: false,
    };
}

/// Welford accumulator for the current run.
#[derive(Clone, Copy, Debug, Default)]
struct RunStats {
    count: u32,
    mean: f64,
    m2: f64,
}

impl RunStats {
    fn push(&mut self, value: f64) {
        self.count = self.count.saturating_add(1);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn std_dev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / (self.count - 1) as f64).max(0.0).sqrt()
    }
}

/// Map a run-mean deviation (in σ) to a changepoint probability.
pub fn changepoint_probability(deviation_sigma: f64) -> f64 {
    match deviation_sigma {
        d if d < 1.0 => 0.05,
        d if d < 1.5 => 0.20,
        d if d < 2.0 => 0.40,
        d if d < 2.5 => 0.60,
        d if d < 3.0 => 0.80,
        _ => 0.95,
    }
}

/// Per-channel run-length changepoint detector.
#[derive(Clone, Debug)]
pub struct ChangepointDetector {
    config: ChangepointConfig,
    run: RunStats,
    last_detection_ms: Option<i64>,
}

impl ChangepointDetector {
    pub fn new(config: ChangepointConfig) -> Self {
        Self {
            config,
            run: RunStats::default(),
            last_detection_ms: None,
        }
    }

    /// Absorb `sample` into the run and judge it against `baseline`.
    ///
    /// The run is tracked even while the baseline is invalid.
    pub fn update(
        &mut self,
        channel: Channel,
        sample: Sample,
        baseline: &BaselineStats,
    ) -> ChangepointResult {
        if self.run.count >= 3 {
            let spread = self.run.std_dev().max(MIN_BASELINE_STD_DEV);
            if (sample.value - self.run.mean).abs() / spread > self.config.reset_sigma {
                self.run = RunStats::default();
            }
        }
        self.run.push(sample.value);

        if !baseline.is_valid() {
            return ChangepointResult::NONE;
        }

        let deviation_sigma = (self.run.mean - baseline.mean).abs() / baseline.std_dev;
        let probability = changepoint_probability(deviation_sigma);
        let cooled_down = match self.last_detection_ms {
            Some(at) => {
                let elapsed = sample.timestamp_ms.saturating_sub(at);
                // A detection stamped in the future means the clock went back.
                elapsed < 0 || elapsed >= (self.config.cooldown_secs as i64).saturating_mul(1000)
            }
            None => true,
        };
        let is_changepoint = probability > self.config.probability_threshold
            && self.run.count < self.config.max_run_length
            && cooled_down;

        if is_changepoint {
            self.last_detection_ms = Some(sample.timestamp_ms);
            info!(
                channel = %channel,
                probability,
                run_length = self.run.count,
                run_mean = self.run.mean,
                "changepoint detected"
            );
        }

        ChangepointResult {
            probability,
            run_length: self.run.count,
            run_mean: self.run.mean,
            deviation_sigma,
            is_changepoint,
        }
    }

    /// Length of the current run.
    pub fn run_length(&self) -> u32 {
        self.run.count
    }

    pub fn reset(&mut self) {
        self.run = RunStats::default();
        self.last_detection_ms = None;
    }
}
