//! Seams toward the presentation layer.
//!
//! The core never depends on a rendering engine. A frontend supplies a
//! visibility test and consumes marker/polyline updates through these
//! narrow traits; everything else about the engine stays on its side.

use nalgebra::Vector3;

/// Camera/view-volume test supplied by the frontend. The core only
/// needs a per-position "is likely visible" boolean to pick a cull
/// class; satellites it reports hidden are refreshed less often.
pub trait VisibilityOracle {
    fn is_visible(&self, position_ecf_m: &Vector3<f64>) -> bool;
}

/// Treats the whole population as visible. Default when no camera
/// information is available.
pub struct AlwaysVisible;

impl VisibilityOracle for AlwaysVisible {
    fn is_visible(&self, _position_ecf_m: &Vector3<f64>) -> bool {
        true
    }
}

/// Adapter surface a rendering engine implements: billboard-like
/// markers keyed by catalog number plus one orbit polyline.
pub trait MarkerSink {
    fn upsert_marker(&mut self, catalog_number: &str, position_ecf_m: Vector3<f64>);
    fn remove_marker(&mut self, catalog_number: &str);
    fn set_orbit_polyline(&mut self, points_ecf_m: &[Vector3<f64>]);
    fn clear_orbit_polyline(&mut self);
}
