//! Dose accounting and source proximity.
//!
//! - **CumulativeDoseTracker**: integral of dose rate, projected against a daily limit
//! - **estimate_source_proximity**: inverse-square walk-up heuristic over recent readings

pub mod cumulative;
pub mod proximity;

pub use cumulative::{CumulativeDoseResult, CumulativeDoseTracker};
pub use proximity::{estimate_source_proximity, ProximityConfidence, SourceProximityResult};
