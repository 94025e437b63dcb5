//! Radiation engine: the streaming entry point.
//!
//! One [`RadiationEngine`] per device stream. Every reading flows through
//! the per-channel pipeline and, when a current location is known, through
//! the geospatial detectors:
//!
//! ```text
//!   add_reading(dose, cps, t)
//!        │
//!        ├─► sanitize (reject non-finite, clamp negatives)
//!        ├─► cumulative dose ◄── dose
//!        │
//!        ├─► per channel ─► baseline ─► z │ rate │ cusum │ forecast
//!        │                           └► crossover │ changepoint │ periodicity
//!        │
//!        ├─► poisson (count rate)
//!        ├─► location │ gradient │ hotspots (dose, if located)
//!        ▼
//!   (dose snapshot, count-rate snapshot)
//! ```
//!
//! All state sits behind one `RwLock`; readers never block each other.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::anomaly::{
    poisson_uncertainty, z_score, AutocorrelationAnalyzer, ChangepointDetector,
    CrossoverDetector, CusumDetector, PoissonUncertainty, RateOfChangeAnalyzer,
};
use crate::baseline::{BaselineStats, BaselineTracker, Channel};
use crate::buffer::{RollingBuffer, Sample};
use crate::config::EngineConfig;
use crate::dose::{self, CumulativeDoseResult, CumulativeDoseTracker, SourceProximityResult};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::forecast::{ForecastPoint, HoltWintersForecaster};
use crate::invariants::non_negative;
use crate::snapshot::AnalysisSnapshot;
use crate::spatial::{
    analyze_gradient, predict_hotspots, GeoReading, GradientResult, HotspotResult,
    LocationAnomalyResult, LocationBaselines,
};

// ── Location ────────────────────────────────────────────────────────────

/// Where the detector currently is, and the spatial cell that covers it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentLocation {
    pub lat: f64,
    pub lng: f64,
    pub cell_id: String,
}

// ── Channel State ───────────────────────────────────────────────────────

/// Detector state for one channel.
#[derive(Debug)]
struct ChannelState {
    baseline: BaselineStats,
    short: RollingBuffer<Sample>,
    medium: RollingBuffer<Sample>,
    rate: RateOfChangeAnalyzer,
    cusum: CusumDetector,
    forecaster: HoltWintersForecaster,
    crossover: CrossoverDetector,
    changepoint: ChangepointDetector,
    periodicity: AutocorrelationAnalyzer,
}

impl ChannelState {
    fn new(config: &EngineConfig) -> Self {
        Self {
            baseline: BaselineStats::EMPTY,
            short: RollingBuffer::new(config.windows.short_buffer),
            medium: RollingBuffer::new(config.windows.medium_buffer),
            rate: RateOfChangeAnalyzer::new(),
            cusum: CusumDetector::new(config.cusum.clone()),
            forecaster: HoltWintersForecaster::new(&config.forecast),
            crossover: CrossoverDetector::new(&config.windows),
            changepoint: ChangepointDetector::new(config.changepoint.clone()),
            periodicity: AutocorrelationAnalyzer::new(config.periodicity.clone()),
        }
    }

    fn reset(&mut self) {
        self.baseline = BaselineStats::EMPTY;
        self.short.clear();
        self.medium.clear();
        self.rate.reset();
        self.cusum.reset();
        self.forecaster.reset();
        self.crossover.reset();
        self.changepoint.reset();
        self.periodicity.reset();
    }

    /// Run the channel pipeline for one sanitized sample.
    ///
    /// The baseline absorbs the sample first; every detector then judges the
    /// sample against the updated baseline.
    fn analyze(
        &mut self,
        channel: Channel,
        tracker: &BaselineTracker,
        horizons: [u32; 3],
        sample: Sample,
    ) -> AnalysisSnapshot {
        let was_valid = self.baseline.is_valid();
        self.baseline = tracker.update(&self.baseline, sample.value, sample.timestamp_ms);
        if !was_valid && self.baseline.is_valid() {
            debug!(
                channel = %channel,
                mean = self.baseline.mean,
                std_dev = self.baseline.std_dev,
                samples = self.baseline.sample_count,
                "baseline established"
            );
        }
        let baseline = self.baseline;

        self.short.push(sample);
        self.medium.push(sample);
        self.forecaster.update(sample.value);

        AnalysisSnapshot {
            channel,
            value: sample.value,
            timestamp_ms: sample.timestamp_ms,
            accepted: true,
            baseline,
            z_score: z_score(sample.value, &baseline),
            rate_of_change: self.rate.analyze(sample, &baseline),
            cusum: self.cusum.update(channel, sample.value, &baseline),
            forecasts: horizons.map(|h| self.forecaster.forecast(h, &baseline)),
            crossover: self.crossover.update(&self.short, sample.timestamp_ms),
            changepoint: self.changepoint.update(channel, sample, &baseline),
            periodicity: self
                .periodicity
                .analyze(channel, &self.medium, sample.timestamp_ms),
            ..AnalysisSnapshot::neutral(channel, sample.value, sample.timestamp_ms)
        }
    }
}

// ── Engine State ────────────────────────────────────────────────────────

#[derive(Debug)]
struct EngineState {
    /// Indexed by [`Channel::index`].
    channels: [ChannelState; 2],
    proximity: RollingBuffer<Sample>,
    cumulative: CumulativeDoseTracker,
    locations: LocationBaselines,
    geo: RollingBuffer<GeoReading>,
    current_location: Option<CurrentLocation>,
    readings_processed: u64,
}

impl EngineState {
    fn new(config: &EngineConfig) -> Self {
        Self {
            channels: [ChannelState::new(config), ChannelState::new(config)],
            proximity: RollingBuffer::new(config.windows.proximity_readings),
            cumulative: CumulativeDoseTracker::new(),
            locations: LocationBaselines::new(&config.location),
            geo: RollingBuffer::new(config.spatial.geo_capacity),
            current_location: None,
            readings_processed: 0,
        }
    }

    fn channel(&self, channel: Channel) -> &ChannelState {
        &self.channels[channel.index()]
    }

    /// Clear streaming state; cumulative dose and location survive.
    fn reset_streaming(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
        self.proximity.clear();
        self.locations.clear();
        self.geo.clear();
        self.readings_processed = 0;
    }
}

/// Geospatial results shared by both snapshots of a reading.
struct SpatialOutcome {
    location: LocationAnomalyResult,
    gradient: GradientResult,
    hotspots: HotspotResult,
}

// ── Radiation Engine ────────────────────────────────────────────────────

/// Streaming analytics for one detector.
///
/// `Send + Sync`; share it behind an `Arc` when readers live on other
/// threads.
#[derive(Debug)]
pub struct RadiationEngine {
    config: EngineConfig,
    tracker: BaselineTracker,
    state: RwLock<EngineState>,
}

impl RadiationEngine {
    /// Create an engine, rejecting an invalid configuration.
    pub fn new(config: EngineConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create an engine with the default configuration.
    pub fn with_defaults() -> Self {
        Self::build(EngineConfig::default())
    }

    fn build(config: EngineConfig) -> Self {
        let state = EngineState::new(&config);
        Self {
            tracker: BaselineTracker::new(config.baseline.alpha),
            config,
            state: RwLock::new(state),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Ingest ──────────────────────────────────────────────────────

    /// Analyze one sensor reading and return the (dose, count-rate)
    /// snapshots.
    ///
    /// Non-finite input is rejected without touching state: a neutral pair
    /// with `accepted == false` is returned. Negative input is clamped to 0.
    pub fn add_reading(
        &self,
        dose_rate: f64,
        cps: f64,
        timestamp_ms: i64,
    ) -> AnalyticsResult<(AnalysisSnapshot, AnalysisSnapshot)> {
        if !dose_rate.is_finite() || !cps.is_finite() {
            warn!(dose_rate, cps, timestamp_ms, "rejected non-finite reading");
            return Ok((
                AnalysisSnapshot::neutral(Channel::Dose, non_negative(dose_rate), timestamp_ms),
                AnalysisSnapshot::neutral(Channel::CountRate, non_negative(cps), timestamp_ms),
            ));
        }

        let dose_sample = Sample::new(dose_rate.max(0.0), timestamp_ms);
        let cps_sample = Sample::new(cps.max(0.0), timestamp_ms);
        let horizons = self.config.forecast.horizons;

        let mut guard = self.state.write().map_err(|_| AnalyticsError::LockError)?;
        let state = &mut *guard;
        state.readings_processed += 1;

        state.cumulative.add(dose_sample.value, timestamp_ms);
        state.proximity.push(dose_sample);

        let mut dose = state.channels[Channel::Dose.index()].analyze(
            Channel::Dose,
            &self.tracker,
            horizons,
            dose_sample,
        );
        let mut count = state.channels[Channel::CountRate.index()].analyze(
            Channel::CountRate,
            &self.tracker,
            horizons,
            cps_sample,
        );

        let poisson: PoissonUncertainty = poisson_uncertainty(cps_sample.value, &count.baseline);
        dose.poisson = poisson;
        count.poisson = poisson;

        if let Some(spatial) = self.analyze_location(state, dose_sample) {
            count.location = spatial.location.clone();
            count.gradient = spatial.gradient;
            count.hotspots = spatial.hotspots.clone();
            dose.location = spatial.location;
            dose.gradient = spatial.gradient;
            dose.hotspots = spatial.hotspots;
        }

        Ok((dose, count))
    }

    fn analyze_location(&self, state: &mut EngineState, sample: Sample) -> Option<SpatialOutcome> {
        let here = state.current_location.clone()?;
        let location = state.locations.update(&here.cell_id, sample);
        state.geo.push(GeoReading {
            lat: here.lat,
            lng: here.lng,
            value: sample.value,
            timestamp_ms: sample.timestamp_ms,
        });
        let readings = state.geo.to_vec();
        Some(SpatialOutcome {
            location,
            gradient: analyze_gradient(&readings, here.lat, here.lng, &self.config.spatial),
            hotspots: predict_hotspots(&readings, here.lat, here.lng, &self.config.spatial),
        })
    }

    // ── Location ────────────────────────────────────────────────────

    /// Set the current position and the cell id that covers it.
    pub fn set_current_location(
        &self,
        lat: f64,
        lng: f64,
        cell_id: impl Into<String>,
    ) -> AnalyticsResult<()> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(AnalyticsError::InvalidArgument(format!(
                "({}, {}) is not a coordinate",
                lat, lng
            )));
        }
        let cell_id = cell_id.into();
        if cell_id.is_empty() {
            return Err(AnalyticsError::InvalidArgument("empty cell id".into()));
        }
        let mut state = self.state.write().map_err(|_| AnalyticsError::LockError)?;
        state.current_location = Some(CurrentLocation { lat, lng, cell_id });
        Ok(())
    }

    /// Forget the current position; geospatial results go neutral.
    pub fn clear_current_location(&self) -> AnalyticsResult<()> {
        let mut state = self.state.write().map_err(|_| AnalyticsError::LockError)?;
        state.current_location = None;
        Ok(())
    }

    pub fn current_location(&self) -> AnalyticsResult<Option<CurrentLocation>> {
        let state = self.state.read().map_err(|_| AnalyticsError::LockError)?;
        Ok(state.current_location.clone())
    }

    // ── Reset ───────────────────────────────────────────────────────

    /// Clear buffers, baselines, detector state, location baselines and
    /// the geo ring. Cumulative dose and the current location are kept.
    pub fn reset(&self) -> AnalyticsResult<()> {
        let mut state = self.state.write().map_err(|_| AnalyticsError::LockError)?;
        state.reset_streaming();
        info!("engine reset; cumulative dose kept");
        Ok(())
    }

    /// Clear everything, cumulative dose and current location included.
    pub fn full_reset(&self) -> AnalyticsResult<()> {
        let mut state = self.state.write().map_err(|_| AnalyticsError::LockError)?;
        state.reset_streaming();
        state.cumulative.reset();
        state.current_location = None;
        info!("engine fully reset");
        Ok(())
    }

    pub fn reset_cumulative_dose(&self) -> AnalyticsResult<()> {
        let mut state = self.state.write().map_err(|_| AnalyticsError::LockError)?;
        let total_usv = state.cumulative.total_usv();
        state.cumulative.reset();
        info!(total_usv, "cumulative dose reset");
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn baseline(&self, channel: Channel) -> AnalyticsResult<BaselineStats> {
        let state = self.state.read().map_err(|_| AnalyticsError::LockError)?;
        Ok(state.channel(channel).baseline)
    }

    pub fn dose_baseline(&self) -> AnalyticsResult<BaselineStats> {
        self.baseline(Channel::Dose)
    }

    pub fn count_baseline(&self) -> AnalyticsResult<BaselineStats> {
        self.baseline(Channel::CountRate)
    }

    /// Dose samples in the short window, oldest first.
    pub fn recent_dose_readings(&self) -> AnalyticsResult<Vec<Sample>> {
        let state = self.state.read().map_err(|_| AnalyticsError::LockError)?;
        Ok(state.channel(Channel::Dose).short.to_vec())
    }

    /// Accepted readings since construction or the last reset.
    pub fn readings_processed(&self) -> AnalyticsResult<u64> {
        let state = self.state.read().map_err(|_| AnalyticsError::LockError)?;
        Ok(state.readings_processed)
    }

    /// Accumulated dose against `daily_limit` (μSv).
    pub fn cumulative_dose(&self, daily_limit: f64) -> AnalyticsResult<CumulativeDoseResult> {
        let state = self.state.read().map_err(|_| AnalyticsError::LockError)?;
        state.cumulative.result(daily_limit)
    }

    /// Inverse-square proximity heuristic over the latest dose readings.
    pub fn estimate_source_proximity(
        &self,
        background: f64,
    ) -> AnalyticsResult<SourceProximityResult> {
        let state = self.state.read().map_err(|_| AnalyticsError::LockError)?;
        Ok(dose::estimate_source_proximity(&state.proximity, background))
    }

    /// Forecast curve for `channel` up to `horizon_s`, one point every
    /// `interval_s`.
    pub fn forecast_points(
        &self,
        horizon_s: u32,
        interval_s: u32,
        channel: Channel,
    ) -> AnalyticsResult<Vec<ForecastPoint>> {
        let state = self.state.read().map_err(|_| AnalyticsError::LockError)?;
        let ch = state.channel(channel);
        ch.forecaster.points(horizon_s, interval_s, &ch.baseline)
    }
}

impl Default for RadiationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}
