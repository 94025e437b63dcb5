//! Engine configuration.
//!
//! Every group deserializes with `#[serde(default)]`, so a partial TOML or
//! JSON document only overrides the keys it names. [`EngineConfig::validate`]
//! is run by the engine constructor.

use serde::{Deserialize, Serialize};

use crate::dose::proximity;
use crate::error::{AnalyticsError, AnalyticsResult};

// ── Defaults ────────────────────────────────────────────────────────────

/// Default EWMA learning rate for channel baselines (slow adaptation).
pub const DEFAULT_BASELINE_ALPHA: f64 = 0.1;

/// Default Holt-Winters level smoothing.
pub const DEFAULT_FORECAST_ALPHA: f64 = 0.1;

/// Default Holt-Winters trend smoothing.
pub const DEFAULT_FORECAST_BETA: f64 = 0.05;

/// Forecast horizons reported on every snapshot (seconds).
pub const DEFAULT_FORECAST_HORIZONS: [u32; 3] = [30, 60, 300];

/// Short rolling window (samples), also the MA-crossover long window.
pub const DEFAULT_SHORT_BUFFER: usize = 60;

/// Medium rolling window for autocorrelation (5 minutes at 1 Hz).
pub const DEFAULT_MEDIUM_BUFFER: usize = 300;

// ── Groups ──────────────────────────────────────────────────────────────

/// Channel baseline settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// EWMA learning rate (alpha), in (0, 1].
    pub alpha: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_BASELINE_ALPHA,
        }
    }
}

/// Two-sided CUSUM settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CusumConfig {
    /// Slack `k` in baseline standard deviations.
    pub slack_sigma: f64,
    /// Decision interval `h` in baseline standard deviations.
    pub decision_sigma: f64,
    /// Zero both statistics after a detection. Off by default: the
    /// statistics keep accumulating past the first detection.
    pub reset_on_detect: bool,
}

impl Default for CusumConfig {
    fn default() -> Self {
        Self {
            slack_sigma: 0.5,
            decision_sigma: 4.0,
            reset_on_detect: false,
        }
    }
}

/// Holt-Winters (double exponential smoothing) settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Level smoothing factor.
    pub alpha: f64,
    /// Trend smoothing factor.
    pub beta: f64,
    /// Horizons attached to every snapshot, in seconds.
    pub horizons: [u32; 3],
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_FORECAST_ALPHA,
            beta: DEFAULT_FORECAST_BETA,
            horizons: DEFAULT_FORECAST_HORIZONS,
        }
    }
}

/// Rolling windows and moving-average crossover settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Per-channel short history (samples).
    pub short_buffer: usize,
    /// Per-channel medium history used by autocorrelation (samples).
    pub medium_buffer: usize,
    /// Short moving-average window (samples).
    pub ma_short: usize,
    /// Long moving-average window (samples).
    pub ma_long: usize,
    /// How long a detected crossover keeps being reported (seconds).
    pub crossover_hold_secs: u64,
    /// Readings retained for source-proximity estimation.
    pub proximity_readings: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            short_buffer: DEFAULT_SHORT_BUFFER,
            medium_buffer: DEFAULT_MEDIUM_BUFFER,
            ma_short: 10,
            ma_long: 60,
            crossover_hold_secs: 60,
            proximity_readings: 10,
        }
    }
}

/// Simplified online changepoint settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangepointConfig {
    /// Probability above which a changepoint is declared.
    pub probability_threshold: f64,
    /// Runs at least this long are considered settled (no detection).
    pub max_run_length: u32,
    /// Minimum spacing between detections (seconds).
    pub cooldown_secs: u64,
    /// Instantaneous deviation from the run mean that starts a new run (σ).
    pub reset_sigma: f64,
}

impl Default for ChangepointConfig {
    fn default() -> Self {
        Self {
            probability_threshold: 0.75,
            max_run_length: 30,
            cooldown_secs: 30,
            reset_sigma: 3.0,
        }
    }
}

/// Autocorrelation (periodicity) settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodicityConfig {
    /// Minimum spacing between passes (seconds).
    pub interval_secs: u64,
    /// Samples required before a pass runs.
    pub min_samples: usize,
    /// Largest lag examined (samples).
    pub max_lag: usize,
    /// Correlation a local maximum must exceed to count as a peak.
    pub min_correlation: f64,
}

impl Default for PeriodicityConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            min_samples: 60,
            max_lag: 120,
            min_correlation: 0.3,
        }
    }
}

/// Per-cell location baseline settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Readings required in a cell before anomalies are judged.
    pub min_samples: usize,
    /// Age horizon for cell history (days).
    pub retention_days: u32,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            min_samples: 5,
            retention_days: 30,
        }
    }
}

/// Gradient and hotspot settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Geo-tagged readings retained.
    pub geo_capacity: usize,
    /// Minimum distance between consecutive points used in the gradient fit (m).
    pub min_spacing_m: f64,
    /// Points required for a gradient fit or a hotspot projection.
    pub min_points: usize,
    /// Interpolation grid spacing (m).
    pub grid_spacing_m: f64,
    /// Margin added around the observed bounding box (m).
    pub grid_margin_m: f64,
    /// Hotspot candidates returned.
    pub max_hotspots: usize,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            geo_capacity: 100,
            min_spacing_m: 5.0,
            min_points: 5,
            grid_spacing_m: 10.0,
            grid_margin_m: 20.0,
            max_hotspots: 3,
        }
    }
}

// ── Engine Config ───────────────────────────────────────────────────────

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub baseline: BaselineConfig,
    pub cusum: CusumConfig,
    pub forecast: ForecastConfig,
    pub windows: WindowConfig,
    pub changepoint: ChangepointConfig,
    pub periodicity: PeriodicityConfig,
    pub location: LocationConfig,
    pub spatial: SpatialConfig,
}

impl EngineConfig {
    /// Reject values that would make the detectors meaningless.
    pub fn validate(&self) -> AnalyticsResult<()> {
        unit_interval("baseline.alpha", self.baseline.alpha)?;
        unit_interval("forecast.alpha", self.forecast.alpha)?;
        unit_interval("forecast.beta", self.forecast.beta)?;
        positive("cusum.decision_sigma", self.cusum.decision_sigma)?;
        if !(self.cusum.slack_sigma >= 0.0) {
            return Err(AnalyticsError::config(
                "cusum.slack_sigma",
                "must be non-negative",
            ));
        }

        let w = &self.windows;
        nonzero("windows.ma_short", w.ma_short)?;
        if w.proximity_readings < proximity::MIN_READINGS {
            return Err(AnalyticsError::config(
                "windows.proximity_readings",
                format!("must hold at least {} readings", proximity::MIN_READINGS),
            ));
        }
        if w.ma_short >= w.ma_long {
            return Err(AnalyticsError::config(
                "windows.ma_long",
                format!("must exceed ma_short ({})", w.ma_short),
            ));
        }
        if w.short_buffer < w.ma_long {
            return Err(AnalyticsError::config(
                "windows.short_buffer",
                format!("must hold at least ma_long ({}) samples", w.ma_long),
            ));
        }
        nonzero("windows.medium_buffer", w.medium_buffer)?;

        unit_interval(
            "changepoint.probability_threshold",
            self.changepoint.probability_threshold,
        )?;
        positive("changepoint.reset_sigma", self.changepoint.reset_sigma)?;

        let p = &self.periodicity;
        if p.max_lag < 2 {
            return Err(AnalyticsError::config(
                "periodicity.max_lag",
                "must be at least 2",
            ));
        }
        if p.min_samples < 4 {
            return Err(AnalyticsError::config(
                "periodicity.min_samples",
                "must be at least 4",
            ));
        }
        if w.medium_buffer < p.min_samples {
            return Err(AnalyticsError::config(
                "windows.medium_buffer",
                format!("must hold periodicity.min_samples ({}) samples", p.min_samples),
            ));
        }

        nonzero("location.min_samples", self.location.min_samples)?;
        if self.location.retention_days == 0 {
            return Err(AnalyticsError::config(
                "location.retention_days",
                "must be positive",
            ));
        }

        let s = &self.spatial;
        nonzero("spatial.geo_capacity", s.geo_capacity)?;
        positive("spatial.grid_spacing_m", s.grid_spacing_m)?;
        if s.min_points < 3 {
            return Err(AnalyticsError::config(
                "spatial.min_points",
                "a planar fit needs at least 3 points",
            ));
        }
        non_negative_distance("spatial.min_spacing_m", s.min_spacing_m)?;
        non_negative_distance("spatial.grid_margin_m", s.grid_margin_m)?;
        Ok(())
    }
}

fn unit_interval(field: &str, value: f64) -> AnalyticsResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(AnalyticsError::config(
            field,
            format!("{} must be in (0, 1]", value),
        ))
    }
}

fn positive(field: &str, value: f64) -> AnalyticsResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(AnalyticsError::config(
            field,
            format!("{} must be positive", value),
        ))
    }
}

fn non_negative_distance(field: &str, value: f64) -> AnalyticsResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(AnalyticsError::config(
            field,
            format!("{} must be a finite, non-negative distance", value),
        ))
    }
}

fn nonzero(field: &str, value: usize) -> AnalyticsResult<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(AnalyticsError::config(field, "must be positive"))
    }
}
