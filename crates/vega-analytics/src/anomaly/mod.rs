//! Per-channel anomaly and regime detectors.
//!
//! Every detector is an independent online estimator that returns a neutral
//! sentinel when its preconditions are not met (invalid baseline, too little
//! history). The engine runs all of them on every reading.
//!
//! ## Architecture
//!
//! ```text
//!   Sample + BaselineStats (already updated with the sample)
//!       │
//!       ├──► z_score               instantaneous deviation
//!       ├──► RateOfChangeAnalyzer  first derivative + persistence
//!       ├──► CusumDetector         persistent small shifts
//!       ├──► CrossoverDetector     short/long moving-average cross
//!       ├──► ChangepointDetector   run-length regime change
//!       ├──► AutocorrelationAnalyzer  periodic patterns (rate-limited)
//!       └──► poisson_uncertainty   counting statistics (count rate only)
//! ```

pub mod changepoint;
pub mod crossover;
pub mod cusum;
pub mod periodicity;
pub mod poisson;
pub mod rate;
pub mod zscore;

pub use changepoint::{changepoint_probability, ChangepointDetector, ChangepointResult};
pub use crossover::{CrossoverDetector, CrossoverKind, CrossoverResult};
pub use cusum::{CusumDetector, CusumResult, ShiftDirection};
pub use periodicity::{AutocorrelationAnalyzer, PeriodLabel, PeriodicPeak, PeriodicityResult};
pub use poisson::{poisson_uncertainty, PoissonUncertainty};
pub use rate::{RateOfChangeAnalyzer, RateOfChangeResult, Trend};
pub use zscore::{z_score, Deviation, ZScoreResult};
