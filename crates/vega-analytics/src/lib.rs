//! # vega-analytics
//!
//! Streaming statistical analysis for handheld radiation detectors.
//!
//! Every sensor reading (dose rate in μSv/h, count rate in cps) is pushed
//! through a set of online detectors that learn what "normal" looks like,
//! flag departures from it, forecast where the reading is heading and,
//! when the detector's position is known, reason about the radiation field
//! around it.
//!
//! ## Architecture
//!
//! ```text
//!   sensor feed ──► ┌────────────────────────────┐
//!                   │  RadiationEngine           │
//!   location ─────► │  ┌──────────────────────┐  │
//!                   │  │ Baseline (EWMA)      │  │  ← per channel
//!                   │  └──────────┬───────────┘  │
//!                   │  ┌──────────▼───────────┐  │
//!                   │  │ Anomaly detectors    │  │  ← z, rate, CUSUM, MA cross,
//!                   │  │ Holt-Winters         │  │    changepoint, periodicity
//!                   │  └──────────────────────┘  │
//!                   │  ┌──────────────────────┐  │
//!                   │  │ Dose │ Spatial       │  │  ← cumulative dose, location,
//!                   │  └──────────────────────┘  │    gradient, hotspots
//!                   └─────────────┬──────────────┘
//!                                 │ (dose, count-rate) snapshots
//!                                 ▼
//!                   ┌────────────────────────────┐
//!                   │  evaluate_triggers(policy) │ → StatisticalTrigger list
//!                   └────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Analytic results degrade to neutral values (`NORMAL`, `STABLE`,
//!   `UNKNOWN`) instead of failing; errors are reserved for misuse.
//! - Memory is bounded: every history is a fixed-capacity rolling buffer,
//!   and per-cell location history is pruned to a retention horizon.
//! - Trigger evaluation is stateless; the caller owns alert debouncing.
//!
//! ## Quick Start
//!
//! ```rust
//! use vega_analytics::{evaluate_triggers, RadiationEngine, StatisticalAlertConfig};
//!
//! let engine = RadiationEngine::with_defaults();
//! for t in 0..30 {
//!     let (dose, cps) = engine.add_reading(0.12, 25.0, t * 1000).unwrap();
//!     let alerts = evaluate_triggers(&dose, &cps, &StatisticalAlertConfig::default());
//!     assert!(alerts.is_empty());
//! }
//!
//! let summary = engine.cumulative_dose(10.0).unwrap();
//! assert!(!summary.limit_exceeded);
//! ```

#![deny(unsafe_code)]

pub mod anomaly;
pub mod baseline;
pub mod buffer;
pub mod config;
pub mod dose;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod invariants;
pub mod snapshot;
pub mod spatial;
pub mod triggers;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use anomaly::{
    ChangepointResult, CrossoverKind, CrossoverResult, CusumResult, Deviation, PeriodLabel,
    PeriodicityResult, PoissonUncertainty, RateOfChangeResult, ShiftDirection, Trend,
    ZScoreResult,
};
pub use baseline::{BaselineStats, BaselineTracker, Channel};
pub use buffer::{RollingBuffer, Sample};
pub use config::EngineConfig;
pub use dose::{CumulativeDoseResult, ProximityConfidence, SourceProximityResult};
pub use engine::{CurrentLocation, RadiationEngine};
pub use error::{AnalyticsError, AnalyticsResult};
pub use forecast::{ForecastPoint, ForecastResult};
pub use snapshot::AnalysisSnapshot;
pub use spatial::{
    CompassPoint, GeoReading, GradientResult, HexCell, HexGrid, HotspotPrediction,
    HotspotResult, LocationAnomalyResult, LocationStatus,
};
pub use triggers::{
    evaluate_triggers, StatisticalAlertConfig, StatisticalTrigger, TriggerSeverity,
    TriggerType,
};
