//! Rate-of-change analysis: first derivative plus direction persistence.

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineStats;
use crate::buffer::Sample;
use crate::invariants::{
    NEAR_ZERO, RATE_DEAD_ZONE, SIGNIFICANT_PERCENT_PER_SECOND, SIGNIFICANT_SIGMA_PER_SECOND,
};

/// Direction of movement between consecutive readings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rising => write!(f, "rising"),
            Self::Falling => write!(f, "falling"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

/// First derivative of a channel at one reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateOfChangeResult {
    /// Units per second.
    pub rate_per_second: f64,
    /// Rate relative to the baseline mean, percent per second.
    pub percent_per_second: f64,
    pub trend: Trend,
    /// Passed either the relative or the absolute significance test.
    pub is_significant: bool,
    /// Consecutive readings moving in `trend`'s direction, this one included.
    pub consecutive_count: u32,
}

impl RateOfChangeResult {
    /// No previous reading, or no elapsed time to divide by.
    pub const STABLE: RateOfChangeResult = RateOfChangeResult {
        rate_per_second: 0.0,
        percent_per_second: 0.0,
        trend: Trend::Stable,
        is_significant: false,
        consecutive_count: 0,
    };
}

/// Stateful per-channel rate-of-change analyzer.
#[derive(Clone, Debug)]
pub struct RateOfChangeAnalyzer {
    previous: Option<Sample>,
    direction: Trend,
    consecutive: u32,
}

impl RateOfChangeAnalyzer {
    pub fn new() -> Self {
        Self {
            previous: None,
            direction: Trend::Stable,
            consecutive: 0,
        }
    }

    /// Compare `sample` to the previous reading on this channel.
    ///
    /// A non-positive time delta (duplicate or backwards timestamp) yields
    /// [`RateOfChangeResult::STABLE`] and leaves the direction counter alone.
    pub fn analyze(&mut self, sample: Sample, baseline: &BaselineStats) -> RateOfChangeResult {
        let Some(prev) = self.previous.replace(sample) else {
            return RateOfChangeResult::STABLE;
        };

        let dt = sample.seconds_since(&prev);
        if dt <= 0.0 {
            return RateOfChangeResult::STABLE;
        }

        let rate = (sample.value - prev.value) / dt;
        let reference = if baseline.mean.abs() > NEAR_ZERO {
            baseline.mean
        } else {
            prev.value
        };
        let percent = if reference.abs() > NEAR_ZERO {
            rate / reference * 100.0
        } else {
            0.0
        };

        let trend = if rate > RATE_DEAD_ZONE {
            Trend::Rising
        } else if rate < -RATE_DEAD_ZONE {
            Trend::Falling
        } else {
            Trend::Stable
        };

        self.consecutive = match trend {
            Trend::Stable => 0,
            t if t == self.direction => self.consecutive.saturating_add(1),
            _ => 1,
        };
        self.direction = trend;

        let relative = percent.abs() > SIGNIFICANT_PERCENT_PER_SECOND;
        let absolute =
            baseline.is_valid() && rate.abs() > SIGNIFICANT_SIGMA_PER_SECOND * baseline.std_dev;

        RateOfChangeResult {
            rate_per_second: rate,
            percent_per_second: percent,
            trend,
            is_significant: trend != Trend::Stable && (relative || absolute),
            consecutive_count: self.consecutive,
        }
    }

    /// The last reading seen on this channel.
    pub fn previous(&self) -> Option<Sample> {
        self.previous
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for RateOfChangeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
