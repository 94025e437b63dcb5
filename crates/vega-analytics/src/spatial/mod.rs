//! Geospatial analysis.
//!
//! Provides:
//! - **geo**: distances, bearings and the local tangent-plane projection
//! - **HexGrid**: position → spatial cell id binning
//! - **LocationBaselines**: per-cell history and anomaly judgment
//! - **analyze_gradient**: planar least-squares dose gradient
//! - **predict_hotspots**: IDW interpolation of unvisited areas
//!
//! The engine only sees cell ids as opaque keys; [`HexGrid`] is one way of
//! producing them.

pub mod geo;
pub mod gradient;
pub mod hexgrid;
pub mod hotspot;
pub mod location;

pub use geo::{bearing_deg, haversine_m, CompassPoint, GeoReading, LocalProjection};
pub use gradient::{analyze_gradient, GradientResult};
pub use hexgrid::{HexCell, HexGrid, DEFAULT_CELL_SIZE_M};
pub use hotspot::{predict_hotspots, HotspotPrediction, HotspotResult, MAX_GRID_NODES};
pub use location::{LocationAnomalyResult, LocationBaselines, LocationStatus};
