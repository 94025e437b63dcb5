//! Analysis snapshots, the per-reading output of the engine.
//!
//! One snapshot is produced per channel per reading. Snapshots are plain
//! values: the engine never mutates or stores them after returning.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::anomaly::{
    ChangepointResult, CrossoverResult, CusumResult, PeriodicityResult, PoissonUncertainty,
    RateOfChangeResult, ZScoreResult,
};
use crate::baseline::{BaselineStats, Channel};
use crate::forecast::ForecastResult;
use crate::spatial::{GradientResult, HotspotResult, LocationAnomalyResult};

/// Every detector's result for one channel at one reading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub channel: Channel,
    /// The reading after sanitization (negative inputs are clamped to zero).
    pub value: f64,
    pub timestamp_ms: i64,
    /// False when the reading was rejected (non-finite input) and every
    /// field holds its neutral value.
    pub accepted: bool,
    /// Baseline after incorporating this reading.
    pub baseline: BaselineStats,
    pub z_score: ZScoreResult,
    pub rate_of_change: RateOfChangeResult,
    pub cusum: CusumResult,
    /// Forecasts at the configured horizons, shortest first.
    pub forecasts: [ForecastResult; 3],
    /// Counting statistics of the count-rate channel (shared by both snapshots).
    pub poisson: PoissonUncertainty,
    pub crossover: CrossoverResult,
    pub changepoint: ChangepointResult,
    pub periodicity: PeriodicityResult,
    /// Shared by both snapshots; judged on the dose channel.
    pub location: LocationAnomalyResult,
    /// Shared by both snapshots; fitted on the dose channel.
    pub gradient: GradientResult,
    /// Shared by both snapshots; interpolated on the dose channel.
    pub hotspots: HotspotResult,
}

impl AnalysisSnapshot {
    /// A snapshot with every detector at its neutral value.
    pub fn neutral(channel: Channel, value: f64, timestamp_ms: i64) -> Self {
        Self {
            channel,
            value,
            timestamp_ms,
            accepted: false,
            baseline: BaselineStats::EMPTY,
            z_score: ZScoreResult::NORMAL,
            rate_of_change: RateOfChangeResult::STABLE,
            cusum: CusumResult::NONE,
            forecasts: [ForecastResult::UNKNOWN; 3],
            poisson: PoissonUncertainty::NONE,
            crossover: CrossoverResult::NONE,
            changepoint: ChangepointResult::NONE,
            periodicity: PeriodicityResult::NONE,
            location: LocationAnomalyResult::NO_LOCATION,
            gradient: GradientResult::UNKNOWN,
            hotspots: HotspotResult::unknown(),
        }
    }

    /// Timestamp as a UTC datetime, if representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms).single()
    }

    /// Forecast at `horizon_seconds`, if that horizon is configured.
    pub fn forecast_at(&self, horizon_seconds: u32) -> Option<&ForecastResult> {
        self.forecasts
            .iter()
            .find(|f| f.available && f.horizon_seconds == horizon_seconds)
    }

    /// Shortest-horizon forecast.
    pub fn earliest_forecast(&self) -> &ForecastResult {
        &self.forecasts[0]
    }

    /// Whether any channel detector flagged this reading.
    pub fn is_anomalous(&self) -> bool {
        self.z_score.is_anomaly || self.cusum.change_detected || self.changepoint.is_changepoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_snapshot_flags_nothing() {
        let s = AnalysisSnapshot::neutral(Channel::Dose, 0.1, 1_700_000_000_000);
        assert!(!s.accepted);
        assert!(!s.is_anomalous());
        assert_eq!(s.forecast_at(30), None);
        assert!(s.datetime().is_some());
        assert_eq!(s.location, LocationAnomalyResult::NO_LOCATION);
    }

    #[test]
    fn forecast_lookup_by_horizon() {
        let mut s = AnalysisSnapshot::neutral(Channel::CountRate, 20.0, 0);
        for (slot, h) in s.forecasts.iter_mut().zip([30, 60, 300]) {
            *slot = ForecastResult {
                available: true,
                horizon_seconds: h,
                predicted: 20.0,
                ..ForecastResult::UNKNOWN
            };
        }
        assert_eq!(s.forecast_at(60).map(|f| f.horizon_seconds), Some(60));
        assert_eq!(s.forecast_at(45), None);
        assert_eq!(s.earliest_forecast().horizon_seconds, 30);
    }

    #[test]
    fn serializes_to_json() {
        let s = AnalysisSnapshot::neutral(Channel::Dose, 0.1, 0);
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"channel\":\"dose\""));
        assert!(json.contains("\"NO_LOCATION\""));
    }
}
