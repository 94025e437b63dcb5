//! Geodesy helpers: great-circle distance, bearings and a local
//! equirectangular projection.
//!
//! Survey areas are a few hundred meters across, so projecting onto a
//! tangent plane at a reference point is accurate to well under a meter.

use serde::{Deserialize, Serialize};

use crate::invariants::EARTH_RADIUS_M;

/// A geo-tagged dose reading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoReading {
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
    pub timestamp_ms: i64,
}

/// Eight-point compass direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassPoint {
    const ORDER: [CompassPoint; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Nearest compass point for a bearing in degrees.
    pub fn from_bearing(bearing_deg: f64) -> Self {
        let sector = (normalize_bearing(bearing_deg) / 45.0).round() as usize % 8;
        Self::ORDER[sector]
    }
}

impl std::fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        };
        f.write_str(s)
    }
}

/// Map any angle to [0, 360).
pub fn normalize_bearing(deg: f64) -> f64 {
    let b = deg.rem_euclid(360.0);
    if b >= 360.0 {
        0.0
    } else {
        b
    }
}

/// Great-circle distance in meters.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (p1, p2) = (lat1.to_radians(), lat2.to_radians());
    let dp = p2 - p1;
    let dl = (lng2 - lng1).to_radians();
    let a = (dp / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dl / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

/// Initial great-circle bearing from the first point to the second, degrees in [0, 360).
pub fn bearing_deg(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (p1, p2) = (lat1.to_radians(), lat2.to_radians());
    let dl = (lng2 - lng1).to_radians();
    let y = dl.sin() * p2.cos();
    let x = p1.cos() * p2.sin() - p1.sin() * p2.cos() * dl.cos();
    normalize_bearing(y.atan2(x).to_degrees())
}

/// Equirectangular projection around an origin: x east, y north, meters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalProjection {
    origin_lat: f64,
    origin_lng: f64,
    meters_per_deg_lat: f64,
    meters_per_deg_lng: f64,
}

impl LocalProjection {
    pub fn new(origin_lat: f64, origin_lng: f64) -> Self {
        let meters_per_deg_lat = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        Self {
            origin_lat,
            origin_lng,
            meters_per_deg_lat,
            meters_per_deg_lng: meters_per_deg_lat * origin_lat.to_radians().cos(),
        }
    }

    pub fn to_local(&self, lat: f64, lng: f64) -> (f64, f64) {
        (
            (lng - self.origin_lng) * self.meters_per_deg_lng,
            (lat - self.origin_lat) * self.meters_per_deg_lat,
        )
    }

    /// Inverse of [`to_local`](Self::to_local). Longitude is undefined at the poles.
    pub fn to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        let lng = if self.meters_per_deg_lng.abs() > f64::EPSILON {
            self.origin_lng + x / self.meters_per_deg_lng
        } else {
            self.origin_lng
        };
        (self.origin_lat + y / self.meters_per_deg_lat, lng)
    }
}

/// Bearing of a local offset (x east, y north), degrees clockwise from north.
pub fn local_bearing(x: f64, y: f64) -> f64 {
    normalize_bearing(x.atan2(y).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_one_degree_latitude() {
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_194.9).abs() < 1.0);
        assert_eq!(haversine_m(48.1, 11.5, 48.1, 11.5), 0.0);
    }

    #[test]
    fn bearings() {
        assert!((bearing_deg(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-9);
        assert!((bearing_deg(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((bearing_deg(0.0, 0.0, -1.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((bearing_deg(0.0, 0.0, 0.0, -1.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn compass_points() {
        assert_eq!(CompassPoint::from_bearing(0.0), CompassPoint::N);
        assert_eq!(CompassPoint::from_bearing(359.0), CompassPoint::N);
        assert_eq!(CompassPoint::from_bearing(44.0), CompassPoint::NE);
        assert_eq!(CompassPoint::from_bearing(100.0), CompassPoint::E);
        assert_eq!(CompassPoint::from_bearing(-90.0), CompassPoint::W);
        assert_eq!(CompassPoint::SW.to_string(), "SW");
    }

    #[test]
    fn projection_agrees_with_haversine() {
        let proj = LocalProjection::new(52.52, 13.405);
        let (x, y) = proj.to_local(52.5209, 13.4065);
        let planar = (x * x + y * y).sqrt();
        let great_circle = haversine_m(52.52, 13.405, 52.5209, 13.4065);
        assert!((planar - great_circle).abs() < 0.5);

        let (lat, lng) = proj.to_geo(x, y);
        assert!((lat - 52.5209).abs() < 1e-9);
        assert!((lng - 13.4065).abs() < 1e-9);
    }

    #[test]
    fn local_bearing_quadrants() {
        assert!((local_bearing(0.0, 1.0) - 0.0).abs() < 1e-9);
        assert!((local_bearing(1.0, 0.0) - 90.0).abs() < 1e-9);
        assert!((local_bearing(-1.0, -1.0) - 225.0).abs() < 1e-9);
    }
}
