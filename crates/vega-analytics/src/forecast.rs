//! Holt-Winters (double exponential smoothing) forecasting.
//!
//! Level and trend are smoothed per reading:
//!
//! - level' = α·x + (1 − α)·(level + trend)
//! - trend' = β·(level' − level) + (1 − β)·trend
//!
//! The sensor cadence is roughly 1 Hz, so the per-reading trend is treated
//! as per second when projecting `h` seconds ahead. Predictions of a
//! radiation quantity are never negative.

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineStats;
use crate::config::ForecastConfig;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::invariants::Z_95;

/// Projection at one horizon with a 95% interval.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Whether the forecaster has seen any data.
    pub available: bool,
    pub horizon_seconds: u32,
    /// max(0, level + h·trend).
    pub predicted: f64,
    /// Lower bound of the 95% interval, clamped at zero.
    pub lower: f64,
    pub upper: f64,
    /// One-σ forecast uncertainty.
    pub uncertainty: f64,
    /// Smoothed trend, units per second.
    pub trend_per_second: f64,
}

impl ForecastResult {
    /// Forecaster not yet initialized.
    pub const UNKNOWN: ForecastResult = ForecastResult {
        available: false,
        horizon_seconds: 0,
        predicted: 0.0,
        lower: 0.0,
        upper: 0.0,
        uncertainty: 0.0,
        trend_per_second: 0.0,
    };
}

/// One point on a forecast curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub seconds_ahead: u32,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Smoothed {
    level: f64,
    trend: f64,
}

/// Per-channel level/trend smoother.
#[derive(Clone, Debug)]
pub struct HoltWintersForecaster {
    alpha: f64,
    beta: f64,
    state: Option<Smoothed>,
}

impl HoltWintersForecaster {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            alpha: config.alpha,
            beta: config.beta,
            state: None,
        }
    }

    /// Fold one reading into the level and trend.
    pub fn update(&mut self, value: f64) {
        self.state = Some(match self.state {
            None => Smoothed {
                level: value,
                trend: 0.0,
            },
            Some(prev) => {
                let level = self.alpha * value + (1.0 - self.alpha) * (prev.level + prev.trend);
                let trend = self.beta * (level - prev.level) + (1.0 - self.beta) * prev.trend;
                Smoothed { level, trend }
            }
        });
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Current (level, trend), if initialized.
    pub fn components(&self) -> Option<(f64, f64)> {
        self.state.map(|s| (s.level, s.trend))
    }

    /// Project `horizon_seconds` ahead.
    ///
    /// Uncertainty grows with √h from the baseline σ; without a valid
    /// baseline it falls back to 10% of the prediction.
    pub fn forecast(&self, horizon_seconds: u32, baseline: &BaselineStats) -> ForecastResult {
        let Some(s) = self.state else {
            return ForecastResult::UNKNOWN;
        };
        let h = f64::from(horizon_seconds);
        let predicted = (s.level + h * s.trend).max(0.0);
        let uncertainty = if baseline.is_valid() {
            baseline.std_dev * h.sqrt() * 0.5
        } else {
            0.1 * predicted
        };
        ForecastResult {
            available: true,
            horizon_seconds,
            predicted,
            lower: (predicted - Z_95 * uncertainty).max(0.0),
            upper: predicted + Z_95 * uncertainty,
            uncertainty,
            trend_per_second: s.trend,
        }
    }

    /// Forecast curve at `interval_s`, `2·interval_s`, … up to `horizon_s`.
    ///
    /// An uninitialized forecaster yields an empty curve.
    pub fn points(
        &self,
        horizon_s: u32,
        interval_s: u32,
        baseline: &BaselineStats,
    ) -> AnalyticsResult<Vec<ForecastPoint>> {
        if interval_s == 0 {
            return Err(AnalyticsError::InvalidArgument(
                "forecast interval must be positive".into(),
            ));
        }
        if !self.is_initialized() {
            return Ok(Vec::new());
        }
        Ok((1..=horizon_s / interval_s)
            .map(|k| {
                let f = self.forecast(k * interval_s, baseline);
                ForecastPoint {
                    seconds_ahead: f.horizon_seconds,
                    predicted: f.predicted,
                    lower: f.lower,
                    upper: f.upper,
                }
            })
            .collect())
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecaster() -> HoltWintersForecaster {
        HoltWintersForecaster::new(&ForecastConfig::default())
    }

    fn make_baseline(mean: f64, std_dev: f64) -> BaselineStats {
        BaselineStats {
            mean,
            variance: std_dev * std_dev,
            std_dev,
            sample_count: 50,
            ..BaselineStats::EMPTY
        }
    }

    #[test]
    fn uninitialized_is_unknown() {
        let f = forecaster();
        assert_eq!(f.forecast(30, &BaselineStats::EMPTY), ForecastResult::UNKNOWN);
    }

    #[test]
    fn first_sample_seeds_level_with_flat_trend() {
        let mut f = forecaster();
        f.update(0.25);
        assert_eq!(f.components(), Some((0.25, 0.0)));
        let r = f.forecast(60, &BaselineStats::EMPTY);
        assert!(r.available);
        assert!((r.predicted - 0.25).abs() < 1e-12);
        // No valid baseline: 10% of prediction.
        assert!((r.uncertainty - 0.025).abs() < 1e-12);
    }

    #[test]
    fn smoothing_formulas() {
        let mut f = forecaster();
        f.update(1.0);
        f.update(2.0);
        // level = 0.1·2 + 0.9·1 = 1.1, trend = 0.05·0.1 = 0.005
        let (level, trend) = f.components().unwrap();
        assert!((level - 1.1).abs() < 1e-12);
        assert!((trend - 0.005).abs() < 1e-12);
        let r = f.forecast(30, &BaselineStats::EMPTY);
        assert!((r.predicted - 1.25).abs() < 1e-12);
    }

    #[test]
    fn uncertainty_grows_with_horizon() {
        let mut f = forecaster();
        f.update(1.0);
        let b = make_baseline(1.0, 2.0);
        let r30 = f.forecast(30, &b);
        assert!((r30.uncertainty - 2.0 * 30f64.sqrt() * 0.5).abs() < 1e-12);
        assert!((r30.upper - (1.0 + Z_95 * r30.uncertainty)).abs() < 1e-12);
        assert_eq!(r30.lower, 0.0);
        assert!(f.forecast(300, &b).uncertainty > r30.uncertainty);
    }

    #[test]
    fn falling_trend_clamps_at_zero() {
        let mut f = forecaster();
        for i in 0..30 {
            f.update(100.0 - 3.0 * i as f64);
        }
        assert!(f.components().unwrap().1 < 0.0);
        let r = f.forecast(300, &BaselineStats::EMPTY);
        assert_eq!(r.predicted, 0.0);
        assert_eq!(r.lower, 0.0);
    }

    #[test]
    fn points_cover_horizon() {
        let mut f = forecaster();
        f.update(0.5);
        let pts = f.points(60, 20, &BaselineStats::EMPTY).unwrap();
        let secs: Vec<u32> = pts.iter().map(|p| p.seconds_ahead).collect();
        assert_eq!(secs, vec![20, 40, 60]);

        let pts = f.points(50, 20, &BaselineStats::EMPTY).unwrap();
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn points_reject_zero_interval() {
        let f = forecaster();
        assert!(matches!(
            f.points(60, 0, &BaselineStats::EMPTY),
            Err(AnalyticsError::InvalidArgument(_))
        ));
        assert!(f.points(60, 10, &BaselineStats::EMPTY).unwrap().is_empty());
    }
}
