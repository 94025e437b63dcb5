//! Per-cell location baselines.
//!
//! Each spatial cell keeps its own history of dose readings, so a reading
//! can be judged against what is normal *at this place* rather than against
//! the walking average.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::Sample;
use crate::config::LocationConfig;
use crate::invariants::{ANOMALY_SIGMA, MIN_BASELINE_STD_DEV, MS_PER_DAY};

/// Outcome class of a location comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationStatus {
    /// No current location is set.
    NoLocation,
    /// First reading recorded in this cell.
    FirstVisit,
    /// Too few readings in this cell to judge.
    InsufficientData,
    Normal,
    Elevated,
    Depressed,
}

impl std::fmt::Display for LocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoLocation => write!(f, "no-location"),
            Self::FirstVisit => write!(f, "first-visit"),
            Self::InsufficientData => write!(f, "insufficient-data"),
            Self::Normal => write!(f, "normal"),
            Self::Elevated => write!(f, "elevated"),
            Self::Depressed => write!(f, "depressed"),
        }
    }
}

/// Comparison of one reading against its cell's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationAnomalyResult {
    pub status: LocationStatus,
    pub cell_id: Option<String>,
    /// Readings held for the cell, this one included.
    pub sample_count: usize,
    /// Mean of the cell's earlier readings.
    pub cell_mean: f64,
    /// Population standard deviation of the cell's earlier readings.
    pub cell_std_dev: f64,
    pub z_score: f64,
    pub is_anomaly: bool,
}

impl LocationAnomalyResult {
    pub const NO_LOCATION: LocationAnomalyResult = LocationAnomalyResult {
        status: LocationStatus::NoLocation,
        cell_id: None,
        sample_count: 0,
        cell_mean: 0.0,
        cell_std_dev: 0.0,
        z_score: 0.0,
        is_anomaly: false,
    };
}

/// Cell id → ordered reading history.
#[derive(Clone, Debug)]
pub struct LocationBaselines {
    min_samples: usize,
    retention_ms: i64,
    cells: HashMap<String, Vec<Sample>>,
}

impl LocationBaselines {
    pub fn new(config: &LocationConfig) -> Self {
        Self {
            min_samples: config.min_samples,
            retention_ms: i64::from(config.retention_days).saturating_mul(MS_PER_DAY),
            cells: HashMap::new(),
        }
    }

    /// Record `sample` in `cell_id` and compare it to the cell's earlier readings.
    ///
    /// Entries older than the retention horizon (relative to the reading
    /// time) are pruned first.
    pub fn update(&mut self, cell_id: &str, sample: Sample) -> LocationAnomalyResult {
        let history = self.cells.entry(cell_id.to_string()).or_default();

        let horizon = sample.timestamp_ms.saturating_sub(self.retention_ms);
        let before = history.len();
        history.retain(|s| s.timestamp_ms >= horizon);
        if history.len() < before {
            debug!(
                cell = %cell_id,
                pruned = before - history.len(),
                "pruned stale cell history"
            );
        }

        history.push(sample);
        let count = history.len();
        let mut result = LocationAnomalyResult {
            cell_id: Some(cell_id.to_string()),
            sample_count: count,
            ..LocationAnomalyResult::NO_LOCATION
        };

        if count == 1 {
            result.status = LocationStatus::FirstVisit;
            return result;
        }
        if count < self.min_samples {
            result.status = LocationStatus::InsufficientData;
            return result;
        }

        let earlier = &history[..count - 1];
        let n = earlier.len() as f64;
        let mean = earlier.iter().map(|s| s.value).sum::<f64>() / n;
        let variance = earlier
            .iter()
            .map(|s| (s.value - mean).powi(2))
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();
        let z = if std_dev < MIN_BASELINE_STD_DEV {
            0.0
        } else {
            (sample.value - mean) / std_dev
        };

        result.cell_mean = mean;
        result.cell_std_dev = std_dev;
        result.z_score = z;
        result.is_anomaly = z.abs() >= ANOMALY_SIGMA;
        result.status = if z >= ANOMALY_SIGMA {
            LocationStatus::Elevated
        } else if z <= -ANOMALY_SIGMA {
            LocationStatus::Depressed
        } else {
            LocationStatus::Normal
        };
        result
    }

    /// Readings currently held for a cell.
    pub fn cell_len(&self, cell_id: &str) -> usize {
        self.cells.get(cell_id).map_or(0, Vec::len)
    }

    /// Number of cells with history.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
