//! Baseline type definitions.
//!
//! Key types: `Channel` (which sensor quantity), `BaselineStats` (learned
//! EWMA state for one channel).

use serde::{Deserialize, Serialize};

use crate::invariants::{MIN_BASELINE_SAMPLES, MIN_BASELINE_STD_DEV};

// ── Channel ─────────────────────────────────────────────────────────────

/// A sensor quantity analyzed independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Ambient dose equivalent rate, μSv/h.
    Dose,
    /// Detector count rate, counts per second.
    CountRate,
}

impl Channel {
    /// Both channels, in snapshot order.
    pub const ALL: [Channel; 2] = [Channel::Dose, Channel::CountRate];

    /// Index into per-channel state arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Dose => 0,
            Self::CountRate => 1,
        }
    }

    /// Display unit.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Dose => "μSv/h",
            Self::CountRate => "cps",
        }
    }

    /// Human-readable quantity name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Dose => "Dose rate",
            Self::CountRate => "Count rate",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dose => write!(f, "dose"),
            Self::CountRate => write!(f, "count-rate"),
        }
    }
}

// ── Baseline Stats ──────────────────────────────────────────────────────

/// Per-channel baseline representing learned "normal" behavior.
///
/// Updated online via EWMA. Only judged against once [`is_valid`] holds.
///
/// [`is_valid`]: BaselineStats::is_valid
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    /// EWMA of the value.
    pub mean: f64,
    /// EWMA of the squared deviation from the updated mean.
    pub variance: f64,
    /// Square root of `variance`.
    pub std_dev: f64,
    /// Number of samples incorporated.
    pub sample_count: u64,
    /// Timestamp of the last incorporated sample (epoch ms).
    pub last_update_ms: i64,
    /// Smallest value seen.
    pub min: f64,
    /// Largest value seen.
    pub max: f64,
}

impl BaselineStats {
    /// The state before any sample has been seen.
    pub const EMPTY: BaselineStats = BaselineStats {
        mean: 0.0,
        variance: 0.0,
        std_dev: 0.0,
        sample_count: 0,
        last_update_ms: 0,
        min: 0.0,
        max: 0.0,
    };

    /// Whether enough data with enough spread has been seen to judge against.
    pub fn is_valid(&self) -> bool {
        self.sample_count >= MIN_BASELINE_SAMPLES && self.std_dev > MIN_BASELINE_STD_DEV
    }

    /// Standardized deviation of `value`, or `None` if the baseline is not valid.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        if self.is_valid() {
            Some((value - self.mean) / self.std_dev)
        } else {
            None
        }
    }
}
