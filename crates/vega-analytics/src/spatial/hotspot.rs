//! Hotspot prediction by inverse-distance-weighted interpolation.
//!
//! Interpolates the observed dose field onto a regular grid around the
//! readings and reports the highest unvisited nodes. Nodes close to an
//! actual reading are skipped: the operator already knows those values.
//!
//! ```text
//!   readings ──► local (x, y) ──► bbox + margin ──► grid (≤ 10 000 nodes)
//!                                                      │
//!                         skip nodes within 5 m of a reading
//!                                                      │
//!                 IDW(1/d²) ──► above reading mean ──► top N by value
//! ```

use serde::{Deserialize, Serialize};

use crate::config::SpatialConfig;
use crate::invariants::NEAR_ZERO;
use crate::spatial::geo::{local_bearing, CompassPoint, GeoReading, LocalProjection};

/// Grid nodes evaluated at most; spacing is widened to stay under it.
pub const MAX_GRID_NODES: usize = 10_000;

/// Nodes this close to a reading count as visited (m).
const VISITED_RADIUS_M: f64 = 5.0;

/// Distance under which IDW returns the reading itself (m).
const EXACT_MATCH_M: f64 = 0.5;

/// Distance scale of the heuristic confidence (m).
const CONFIDENCE_SCALE_M: f64 = 20.0;

/// One predicted hotspot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotspotPrediction {
    pub lat: f64,
    pub lng: f64,
    pub predicted_value: f64,
    /// Distance from the current position, meters.
    pub distance_m: f64,
    /// Bearing from the current position, degrees in [0, 360).
    pub bearing_deg: f64,
    pub direction: CompassPoint,
    /// 1 / (1 + d_nearest / 20): falls off away from observed data.
    pub confidence: f64,
}

/// Hotspot candidates ranked by predicted value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HotspotResult {
    pub available: bool,
    pub hotspots: Vec<HotspotPrediction>,
    pub readings_used: usize,
    pub grid_nodes: usize,
    /// Spacing actually used, meters.
    pub grid_spacing_m: f64,
}

impl HotspotResult {
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// IDW estimate at (x, y) over projected `(x, y, value)` points.
fn idw(points: &[(f64, f64, f64)], x: f64, y: f64) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for &(px, py, v) in points {
        let d = (x - px).hypot(y - py);
        if d < EXACT_MATCH_M {
            return v;
        }
        let w = 1.0 / (d * d);
        weighted += w * v;
        total_weight += w;
    }
    if total_weight > 0.0 {
        weighted / total_weight
    } else {
        0.0
    }
}

fn nearest_distance(points: &[(f64, f64, f64)], x: f64, y: f64) -> f64 {
    points
        .iter()
        .map(|&(px, py, _)| (x - px).hypot(y - py))
        .fold(f64::INFINITY, f64::min)
}

/// Predict unvisited hotspots from `readings` around the current position.
pub fn predict_hotspots(
    readings: &[GeoReading],
    lat: f64,
    lng: f64,
    config: &SpatialConfig,
) -> HotspotResult {
    if readings.len() < config.min_points {
        return HotspotResult::unknown();
    }

    let projection = LocalProjection::new(lat, lng);
    let points: Vec<(f64, f64, f64)> = readings
        .iter()
        .map(|r| {
            let (x, y) = projection.to_local(r.lat, r.lng);
            (x, y, r.value)
        })
        .collect();
    let mean = points.iter().map(|p| p.2).sum::<f64>() / points.len() as f64;

    let (min_x, max_x, min_y, max_y) = points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |acc, &(x, y, _)| (acc.0.min(x), acc.1.max(x), acc.2.min(y), acc.3.max(y)),
    );
    let (x0, y0) = (min_x - config.grid_margin_m, min_y - config.grid_margin_m);
    let width = max_x - min_x + 2.0 * config.grid_margin_m;
    let height = max_y - min_y + 2.0 * config.grid_margin_m;

    if !(width.is_finite() && height.is_finite()) {
        return HotspotResult::unknown();
    }

    let mut spacing = config.grid_spacing_m;
    let node_count = |s: f64| ((width / s).floor() + 1.0) * ((height / s).floor() + 1.0);
    let max_nodes = MAX_GRID_NODES as f64;
    while node_count(spacing) > max_nodes {
        spacing *= (node_count(spacing) / max_nodes).sqrt().max(1.01);
    }
    let nx = (width / spacing).floor() as usize + 1;
    let ny = (height / spacing).floor() as usize + 1;

    let mut candidates: Vec<(f64, f64, f64, f64)> = Vec::new();
    for i in 0..nx {
        for j in 0..ny {
            let (x, y) = (x0 + i as f64 * spacing, y0 + j as f64 * spacing);
            let nearest = nearest_distance(&points, x, y);
            if nearest < VISITED_RADIUS_M {
                continue;
            }
            let predicted = idw(&points, x, y);
            if predicted > mean + NEAR_ZERO {
                candidates.push((x, y, predicted, nearest));
            }
        }
    }
    candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

    let hotspots = candidates
        .into_iter()
        .take(config.max_hotspots)
        .map(|(x, y, predicted, nearest)| {
            let (h_lat, h_lng) = projection.to_geo(x, y);
            let bearing_deg = local_bearing(x, y);
            HotspotPrediction {
                lat: h_lat,
                lng: h_lng,
                predicted_value: predicted,
                distance_m: x.hypot(y),
                bearing_deg,
                direction: CompassPoint::from_bearing(bearing_deg),
                confidence: 1.0 / (1.0 + nearest / CONFIDENCE_SCALE_M),
            }
        })
        .collect();

    HotspotResult {
        available: true,
        hotspots,
        readings_used: points.len(),
        grid_nodes: nx * ny,
        grid_spacing_m: spacing,
    }
}
