//! Periodic pattern search by normalized autocorrelation.
//!
//! Runs over the channel's medium buffer and is rate-limited: between passes
//! the cached result is returned unchanged. Detected periods are annotated
//! with a coarse environmental label (ventilation cycles, pumps, …); the
//! label is descriptive only and never drives alerting.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::baseline::Channel;
use crate::buffer::{RollingBuffer, Sample};
use crate::config::PeriodicityConfig;
use crate::invariants::NEAR_ZERO;

/// Coarse classification of a detected period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodLabel {
    /// Under 15 s.
    RapidFluctuation,
    /// 15–45 s, typical of ventilation cycling.
    HvacLike,
    /// 45–120 s.
    MechanicalCycle,
    /// 120 s and above.
    SlowCycle,
}

impl PeriodLabel {
    pub fn for_period(seconds: f64) -> Self {
        if seconds < 15.0 {
            Self::RapidFluctuation
        } else if seconds < 45.0 {
            Self::HvacLike
        } else if seconds < 120.0 {
            Self::MechanicalCycle
        } else {
            Self::SlowCycle
        }
    }
}

impl std::fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RapidFluctuation => write!(f, "rapid fluctuation"),
            Self::HvacLike => write!(f, "HVAC-like"),
            Self::MechanicalCycle => write!(f, "mechanical cycle"),
            Self::SlowCycle => write!(f, "slow cycle"),
        }
    }
}

/// One autocorrelation peak.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodicPeak {
    /// Lag in samples.
    pub lag: usize,
    /// Lag × median sample interval.
    pub period_seconds: f64,
    pub correlation: f64,
    pub label: PeriodLabel,
}

/// Result of the latest autocorrelation pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodicityResult {
    pub has_periodicity: bool,
    /// Strongest peak.
    pub dominant: Option<PeriodicPeak>,
    /// Second strongest peak.
    pub secondary: Option<PeriodicPeak>,
    pub samples_analyzed: usize,
    /// Timestamp of the pass that produced this result.
    pub computed_at_ms: Option<i64>,
}

impl PeriodicityResult {
    /// No pass has produced a result yet.
    pub const NONE: PeriodicityResult = PeriodicityResult {
        has_periodicity: false,
        dominant: None,
        secondary: None,
        samples_analyzed: 0,
        computed_at_ms: None,
    };
}

/// Rate-limited per-channel autocorrelation analyzer.
#[derive(Clone, Debug)]
pub struct AutocorrelationAnalyzer {
    config: PeriodicityConfig,
    last_pass_ms: Option<i64>,
    cached: PeriodicityResult,
}

impl AutocorrelationAnalyzer {
    pub fn new(config: PeriodicityConfig) -> Self {
        Self {
            config,
            last_pass_ms: None,
            cached: PeriodicityResult::NONE,
        }
    }

    /// Analyze `history`, or return the cached result if the previous pass
    /// was less than the configured interval ago.
    pub fn analyze(
        &mut self,
        channel: Channel,
        history: &RollingBuffer<Sample>,
        now_ms: i64,
    ) -> PeriodicityResult {
        let interval_ms = (self.config.interval_secs as i64).saturating_mul(1000);
        if let Some(last) = self.last_pass_ms {
            let elapsed = now_ms.saturating_sub(last);
            if (0..interval_ms).contains(&elapsed) {
                return self.cached;
            }
        }
        if history.len() < self.config.min_samples {
            return self.cached;
        }

        self.last_pass_ms = Some(now_ms);
        self.cached = self.pass(history, now_ms);
        debug!(
            channel = %channel,
            samples = history.len(),
            periodic = self.cached.has_periodicity,
            period_s = self.cached.dominant.map(|p| p.period_seconds),
            "autocorrelation pass"
        );
        self.cached
    }

    fn pass(&self, history: &RollingBuffer<Sample>, now_ms: i64) -> PeriodicityResult {
        let values = history.values();
        let n = values.len();
        let mut result = PeriodicityResult {
            samples_analyzed: n,
            computed_at_ms: Some(now_ms),
            ..PeriodicityResult::NONE
        };

        let mean = values.iter().sum::<f64>() / n as f64;
        let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();
        let energy: f64 = centered.iter().map(|d| d * d).sum();
        if energy < NEAR_ZERO {
            return result;
        }

        let max_lag = self.config.max_lag.min(n / 2);
        if max_lag < 2 {
            return result;
        }
        // Correlations for lags 1..=max_lag + 1 so every candidate has both neighbours.
        let top = (max_lag + 1).min(n - 1);
        let correlation: Vec<f64> = (0..=top)
            .map(|lag| {
                if lag == 0 {
                    return 1.0;
                }
                centered
                    .iter()
                    .zip(&centered[lag..])
                    .map(|(a, b)| a * b)
                    .sum::<f64>()
                    / energy
            })
            .collect();

        let interval = median_interval_secs(history);
        let mut peaks: Vec<PeriodicPeak> = (2..=max_lag)
            .filter(|&lag| lag < top)
            .filter(|&lag| {
                let r = correlation[lag];
                r > self.config.min_correlation
                    && r > correlation[lag - 1]
                    && r > correlation[lag + 1]
            })
            .map(|lag| {
                let period_seconds = lag as f64 * interval;
                PeriodicPeak {
                    lag,
                    period_seconds,
                    correlation: correlation[lag],
                    label: PeriodLabel::for_period(period_seconds),
                }
            })
            .collect();
        peaks.sort_by(|a, b| b.correlation.total_cmp(&a.correlation));

        let mut ranked = peaks.into_iter();
        result.dominant = ranked.next();
        result.secondary = ranked.next();
        result.has_periodicity = result.dominant.is_some();
        result
    }

    pub fn reset(&mut self) {
        self.last_pass_ms = None;
        self.cached = PeriodicityResult::NONE;
    }
}

/// Median of the positive gaps between consecutive samples, in seconds.
/// Falls back to 1 s (the nominal sensor cadence).
fn median_interval_secs(history: &RollingBuffer<Sample>) -> f64 {
    let samples = history.to_vec();
    let mut gaps: Vec<f64> = samples
        .windows(2)
        .map(|w| w[1].seconds_since(&w[0]))
        .filter(|gap| *gap > 0.0)
        .collect();
    if gaps.is_empty() {
        return 1.0;
    }
    gaps.sort_by(f64::total_cmp);
    let mid = gaps.len() / 2;
    if gaps.len() % 2 == 0 {
        (gaps[mid - 1] + gaps[mid]) / 2.0
    } else {
        gaps[mid]
    }
}
