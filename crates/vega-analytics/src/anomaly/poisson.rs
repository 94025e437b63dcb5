//! Counting-statistics uncertainty for the count-rate channel.
//!
//! Radioactive decay counts are Poisson distributed, so the natural
//! uncertainty of N counts is √N. Comparing two counts uses the quadrature
//! sum of their uncertainties rather than a Gaussian baseline σ.

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineStats;

/// Deviations beyond this many combined σ are significant.
const SIGNIFICANCE_SIGMA: f64 = 2.0;

/// Poisson uncertainty of one count-rate reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoissonUncertainty {
    /// Counts in the (1 s) window: round(cps).
    pub counts: u64,
    /// √N.
    pub uncertainty: f64,
    /// 100 / √N; 100 when no counts were observed.
    pub relative_uncertainty_percent: f64,
    /// Expected counts from the count-rate baseline, when it is valid.
    pub expected_counts: Option<u64>,
    /// √(N + E), or 0 without an expectation.
    pub combined_uncertainty: f64,
    /// N − E, or 0 without an expectation.
    pub difference: f64,
    /// |N − E| / combined uncertainty.
    pub sigma_deviation: f64,
    /// |N − E| > 2 · combined uncertainty.
    pub is_significant: bool,
}

impl PoissonUncertainty {
    /// Returned for rejected readings.
    pub const NONE: PoissonUncertainty = PoissonUncertainty {
        counts: 0,
        uncertainty: 0.0,
        relative_uncertainty_percent: 100.0,
        expected_counts: None,
        combined_uncertainty: 0.0,
        difference: 0.0,
        sigma_deviation: 0.0,
        is_significant: false,
    };
}

/// Quantify the counting uncertainty of `cps`, comparing against the
/// count-rate `baseline` when it is valid.
pub fn poisson_uncertainty(cps: f64, baseline: &BaselineStats) -> PoissonUncertainty {
    let counts = round_counts(cps);
    let uncertainty = (counts as f64).sqrt();
    let relative_uncertainty_percent = if counts > 0 {
        100.0 / uncertainty
    } else {
        100.0
    };

    if !baseline.is_valid() {
        return PoissonUncertainty {
            counts,
            uncertainty,
            relative_uncertainty_percent,
            ..PoissonUncertainty::NONE
        };
    }

    let expected = round_counts(baseline.mean);
    let combined = ((counts + expected) as f64).sqrt();
    let difference = counts as f64 - expected as f64;
    let sigma_deviation = if combined > 0.0 {
        difference.abs() / combined
    } else {
        0.0
    };

    PoissonUncertainty {
        counts,
        uncertainty,
        relative_uncertainty_percent,
        expected_counts: Some(expected),
        combined_uncertainty: combined,
        difference,
        sigma_deviation,
        is_significant: combined > 0.0 && difference.abs() > SIGNIFICANCE_SIGMA * combined,
    }
}

fn round_counts(rate: f64) -> u64 {
    if rate.is_finite() && rate > 0.0 {
        rate.round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_baseline(mean: f64) -> BaselineStats {
        BaselineStats {
            mean,
            variance: mean,
            std_dev: mean.sqrt(),
            sample_count: 100,
            ..BaselineStats::EMPTY
        }
    }

    #[test]
    fn hundred_cps_has_ten_percent_uncertainty() {
        let p = poisson_uncertainty(100.0, &BaselineStats::EMPTY);
        assert_eq!(p.counts, 100);
        assert!((p.uncertainty - 10.0).abs() < 1e-12);
        assert!((p.relative_uncertainty_percent - 10.0).abs() < 1e-12);
        assert_eq!(p.expected_counts, None);
        assert!(!p.is_significant);
    }

    #[test]
    fn rounds_fractional_rates() {
        let p = poisson_uncertainty(24.6, &BaselineStats::EMPTY);
        assert_eq!(p.counts, 25);
        assert!((p.uncertainty - 5.0).abs() < 1e-12);
    }

    #[test]
    fn zero_counts_are_fully_uncertain() {
        let p = poisson_uncertainty(0.2, &BaselineStats::EMPTY);
        assert_eq!(p.counts, 0);
        assert_eq!(p.uncertainty, 0.0);
        assert_eq!(p.relative_uncertainty_percent, 100.0);

        let p = poisson_uncertainty(-4.0, &BaselineStats::EMPTY);
        assert_eq!(p.counts, 0);
    }

    #[test]
    fn significant_against_baseline() {
        // E = 100, N = 150: combined √250 ≈ 15.8, diff 50 > 31.6
        let p = poisson_uncertainty(150.0, &count_baseline(100.0));
        assert_eq!(p.expected_counts, Some(100));
        assert!((p.combined_uncertainty - 250f64.sqrt()).abs() < 1e-12);
        assert!(p.is_significant);
        assert!(p.sigma_deviation > 3.0);
    }

    #[test]
    fn within_counting_noise_is_not_significant() {
        // E = 100, N = 120: diff 20 < 2 · √220 ≈ 29.7
        let p = poisson_uncertainty(120.0, &count_baseline(100.0));
        assert!(!p.is_significant);
        assert_eq!(p.difference, 20.0);
    }
}
