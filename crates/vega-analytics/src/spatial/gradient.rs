//! Spatial dose gradient by planar least squares.
//!
//! Fits `v ≈ a + b·x + c·y` over recent geo-tagged readings projected to
//! local meters around the operator. `(b, c)` points uphill: the bearing
//! is where the dose increases fastest.

use serde::{Deserialize, Serialize};

use crate::config::SpatialConfig;
use crate::spatial::geo::{local_bearing, CompassPoint, GeoReading, LocalProjection};

/// Magnitudes at or below this (units per meter) are not significant.
const MIN_SIGNIFICANT_MAGNITUDE: f64 = 0.001;

/// Fits explaining no more variance than this are not significant.
const MIN_SIGNIFICANT_R_SQUARED: f64 = 0.3;

/// Relative determinant below which the point layout is treated as collinear.
const DEGENERATE_DETERMINANT: f64 = 1e-9;

/// Total sum of squares below which the field is flat.
const FLAT_FIELD_SS: f64 = 1e-12;

/// Fitted gradient at the current position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientResult {
    pub available: bool,
    /// √(b² + c²), units per meter.
    pub magnitude: f64,
    /// Uphill bearing, degrees clockwise from north in [0, 360).
    pub bearing_deg: f64,
    pub direction: Option<CompassPoint>,
    pub r_squared: f64,
    /// Spatially diverse points used in the fit.
    pub points_used: usize,
    /// Diagonal of the fitted points' bounding box, meters.
    pub extent_m: f64,
    pub is_significant: bool,
    pub confidence: f64,
}

impl GradientResult {
    /// Too few diverse points or degenerate geometry.
    pub const UNKNOWN: GradientResult = GradientResult {
        available: false,
        magnitude: 0.0,
        bearing_deg: 0.0,
        direction: None,
        r_squared: 0.0,
        points_used: 0,
        extent_m: 0.0,
        is_significant: false,
        confidence: 0.0,
    };
}

/// Keep readings at least `min_spacing_m` from the previously kept one.
fn diverse_points(
    readings: &[GeoReading],
    projection: &LocalProjection,
    min_spacing_m: f64,
) -> Vec<(f64, f64, f64)> {
    let mut kept: Vec<(f64, f64, f64)> = Vec::with_capacity(readings.len());
    for r in readings {
        let (x, y) = projection.to_local(r.lat, r.lng);
        let far_enough = kept
            .last()
            .map_or(true, |&(px, py, _)| (x - px).hypot(y - py) >= min_spacing_m);
        if far_enough {
            kept.push((x, y, r.value));
        }
    }
    kept
}

/// Fit the dose gradient over `readings` (oldest first) around (`lat`, `lng`).
pub fn analyze_gradient(
    readings: &[GeoReading],
    lat: f64,
    lng: f64,
    config: &SpatialConfig,
) -> GradientResult {
    let projection = LocalProjection::new(lat, lng);
    let points = diverse_points(readings, &projection, config.min_spacing_m);
    let n = points.len();
    if n < config.min_points {
        return GradientResult::UNKNOWN;
    }

    let nf = n as f64;
    let (mx, my, mv) = points.iter().fold((0.0, 0.0, 0.0), |acc, p| {
        (acc.0 + p.0 / nf, acc.1 + p.1 / nf, acc.2 + p.2 / nf)
    });

    let (mut sxx, mut syy, mut sxy, mut sxv, mut syv, mut svv) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for &(x, y, v) in &points {
        let (dx, dy, dv) = (x - mx, y - my, v - mv);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
        sxv += dx * dv;
        syv += dy * dv;
        svv += dv * dv;
    }

    let det = sxx * syy - sxy * sxy;
    if !(det > DEGENERATE_DETERMINANT * sxx * syy) {
        return GradientResult::UNKNOWN;
    }
    let b = (sxv * syy - syv * sxy) / det;
    let c = (syv * sxx - sxv * sxy) / det;

    // Residual sum of squares of the centered fit.
    let ss_res = points
        .iter()
        .map(|&(x, y, v)| {
            let predicted = mv + b * (x - mx) + c * (y - my);
            (v - predicted).powi(2)
        })
        .sum::<f64>();
    let r_squared = if svv > FLAT_FIELD_SS {
        (1.0 - ss_res / svv).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let magnitude = b.hypot(c);
    let bearing_deg = local_bearing(b, c);

    let (min_x, max_x, min_y, max_y) = points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |acc, &(x, y, _)| (acc.0.min(x), acc.1.max(x), acc.2.min(y), acc.3.max(y)),
    );
    let extent_m = (max_x - min_x).hypot(max_y - min_y);

    let confidence =
        0.3 * (nf / 20.0).min(1.0) + 0.3 * (extent_m / 50.0).min(1.0) + 0.4 * r_squared;

    GradientResult {
        available: true,
        magnitude,
        bearing_deg,
        direction: Some(CompassPoint::from_bearing(bearing_deg)),
        r_squared,
        points_used: n,
        extent_m,
        is_significant: magnitude > MIN_SIGNIFICANT_MAGNITUDE
            && r_squared > MIN_SIGNIFICANT_R_SQUARED,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: (f64, f64) = (47.0, 8.0);

    /// Readings on a local (x, y) layout, converted to lat/lng around ORIGIN.
    fn readings(points: &[(f64, f64, f64)]) -> Vec<GeoReading> {
        let proj = LocalProjection::new(ORIGIN.0, ORIGIN.1);
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y, value))| {
                let (lat, lng) = proj.to_geo(x, y);
                GeoReading {
                    lat,
                    lng,
                    value,
                    timestamp_ms: i as i64 * 1000,
                }
            })
            .collect()
    }

    fn grid_layout(f: impl Fn(f64, f64) -> f64) -> Vec<(f64, f64, f64)> {
        let mut pts = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                let (x, y) = (i as f64 * 10.0, j as f64 * 10.0);
                pts.push((x, y, f(x, y)));
            }
        }
        pts
    }

    #[test]
    fn east_rising_field() {
        let pts = readings(&grid_layout(|x, _| 0.1 + 0.01 * x));
        let g = analyze_gradient(&pts, ORIGIN.0, ORIGIN.1, &SpatialConfig::default());
        assert!(g.available);
        assert!((g.magnitude - 0.01).abs() < 1e-6);
        assert!((g.bearing_deg - 90.0).abs() < 0.01);
        assert_eq!(g.direction, Some(CompassPoint::E));
        assert!((g.r_squared - 1.0).abs() < 1e-9);
        assert!(g.is_significant);
        assert_eq!(g.points_used, 16);
    }

    #[test]
    fn north_west_field() {
        let pts = readings(&grid_layout(|x, y| 1.0 - 0.005 * x + 0.005 * y));
        let g = analyze_gradient(&pts, ORIGIN.0, ORIGIN.1, &SpatialConfig::default());
        assert!((g.bearing_deg - 315.0).abs() < 0.01);
        assert_eq!(g.direction, Some(CompassPoint::NW));
    }

    #[test]
    fn confidence_formula() {
        let pts = readings(&grid_layout(|x, _| 0.1 + 0.01 * x));
        let g = analyze_gradient(&pts, ORIGIN.0, ORIGIN.1, &SpatialConfig::default());
        let extent = (30f64 * 30.0 * 2.0).sqrt();
        let expected = 0.3 * (16.0 / 20.0) + 0.3 * (extent / 50.0) + 0.4 * 1.0;
        assert!((g.extent_m - extent).abs() < 1e-6);
        assert!((g.confidence - expected).abs() < 1e-6);
    }

    #[test]
    fn clustered_points_are_unknown() {
        // All within 5 m of each other: only the first is kept.
        let pts = readings(&[
            (0.0, 0.0, 0.1),
            (1.0, 0.0, 0.2),
            (2.0, 1.0, 0.3),
            (1.0, 2.0, 0.4),
            (0.5, 0.5, 0.5),
            (2.0, 2.0, 0.6),
        ]);
        let g = analyze_gradient(&pts, ORIGIN.0, ORIGIN.1, &SpatialConfig::default());
        assert_eq!(g, GradientResult::UNKNOWN);
    }

    #[test]
    fn collinear_walk_is_degenerate() {
        let line: Vec<_> = (0..8).map(|i| (i as f64 * 10.0, 0.0, 0.1 * i as f64)).collect();
        let g = analyze_gradient(&readings(&line), ORIGIN.0, ORIGIN.1, &SpatialConfig::default());
        assert!(!g.available);
    }

    #[test]
    fn flat_field_is_not_significant() {
        let pts = readings(&grid_layout(|_, _| 0.1));
        let g = analyze_gradient(&pts, ORIGIN.0, ORIGIN.1, &SpatialConfig::default());
        assert!(g.available);
        assert!(!g.is_significant);
        assert_eq!(g.r_squared, 0.0);
    }
}
