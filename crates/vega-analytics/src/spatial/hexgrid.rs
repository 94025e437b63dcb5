//! Flat-top hexagonal binning of positions into spatial cell ids.
//!
//! The engine treats cell ids as opaque keys; this grid is how the CLI
//! derives them from positioned samples. Cells are addressed by axial
//! coordinates `(q, r)` and rendered as `"q:r"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::spatial::geo::LocalProjection;

/// Default hexagon size (center to corner), meters.
pub const DEFAULT_CELL_SIZE_M: f64 = 25.0;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Axial hex coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCell {
    pub q: i64,
    pub r: i64,
}

impl fmt::Display for HexCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.q, self.r)
    }
}

impl FromStr for HexCell {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AnalyticsError::InvalidArgument(format!("malformed cell id '{}'", s));
        let (q, r) = s.split_once(':').ok_or_else(invalid)?;
        Ok(HexCell {
            q: q.trim().parse().map_err(|_| invalid())?,
            r: r.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// Hex grid anchored at an origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexGrid {
    pub origin_lat: f64,
    pub origin_lng: f64,
    /// Center-to-corner size, meters.
    pub cell_size_m: f64,
}

impl Default for HexGrid {
    fn default() -> Self {
        Self {
            origin_lat: 0.0,
            origin_lng: 0.0,
            cell_size_m: DEFAULT_CELL_SIZE_M,
        }
    }
}

impl HexGrid {
    pub fn new(origin_lat: f64, origin_lng: f64, cell_size_m: f64) -> AnalyticsResult<Self> {
        let grid = Self {
            origin_lat,
            origin_lng,
            cell_size_m,
        };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if !(self.cell_size_m > 0.0) || !self.cell_size_m.is_finite() {
            return Err(AnalyticsError::config(
                "grid.cell_size_m",
                format!("{} must be positive", self.cell_size_m),
            ));
        }
        let lat_ok = (-90.0..=90.0).contains(&self.origin_lat);
        let lng_ok = (-180.0..=180.0).contains(&self.origin_lng);
        if !lat_ok || !lng_ok {
            return Err(AnalyticsError::config(
                "grid.origin",
                format!("({}, {}) is not a coordinate", self.origin_lat, self.origin_lng),
            ));
        }
        Ok(())
    }

    fn projection(&self) -> LocalProjection {
        LocalProjection::new(self.origin_lat, self.origin_lng)
    }

    /// Cell containing a position.
    pub fn cell_at(&self, lat: f64, lng: f64) -> HexCell {
        let (x, y) = self.projection().to_local(lat, lng);
        let q = (2.0 / 3.0 * x) / self.cell_size_m;
        let r = (-x / 3.0 + SQRT_3 / 3.0 * y) / self.cell_size_m;
        cube_round(q, r)
    }

    /// Cell id string (`"q:r"`) for a position.
    pub fn cell_id(&self, lat: f64, lng: f64) -> String {
        self.cell_at(lat, lng).to_string()
    }

    /// Center of a cell as (lat, lng).
    pub fn cell_center(&self, cell: HexCell) -> (f64, f64) {
        let (q, r) = (cell.q as f64, cell.r as f64);
        let x = self.cell_size_m * 1.5 * q;
        let y = self.cell_size_m * (SQRT_3 / 2.0 * q + SQRT_3 * r);
        self.projection().to_geo(x, y)
    }

    /// Center of a cell given by its id string.
    pub fn cell_center_of(&self, cell_id: &str) -> AnalyticsResult<(f64, f64)> {
        Ok(self.cell_center(cell_id.parse()?))
    }
}

/// Round fractional axial coordinates to the containing hexagon.
fn cube_round(q: f64, r: f64) -> HexCell {
    let s = -q - r;
    let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
    let (dq, dr, ds) = ((rq - q).abs(), (rr - r).abs(), (rs - s).abs());
    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    HexCell {
        q: rq as i64,
        r: rr as i64,
    }
}
