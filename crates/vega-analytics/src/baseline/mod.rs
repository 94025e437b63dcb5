//! Per-channel behavioral baselines.
//!
//! Uses EWMA (Exponentially Weighted Moving Average) for online learning of
//! mean and variance. Every sigma-based decision in the crate is made against
//! one of these baselines.
//!
//! ## Architecture
//!
//! ```text
//!   (value, timestamp) ──► BaselineTracker::update ──► BaselineStats (per channel)
//!                              │
//!                              ├── EWMA mean/variance
//!                              ├── running min/max
//!                              └── validity gate (≥10 samples, σ > 1e-4)
//! ```

pub mod tracker;
pub mod types;

pub use tracker::BaselineTracker;
pub use types::{BaselineStats, Channel};
