//! Closed orbit-path polylines.
//!
//! Samples one full orbital period of a satellite and force-closes the
//! loop against perturbation drift. All samples are projected with the
//! single GMST of the reference time: the Earth is frozen for the
//! duration of the loop, otherwise the result is a ground-track spiral
//! instead of a ring.

use chrono::{DateTime, Duration, Utc};
use nalgebra::Vector3;

use crate::frame::{eci_to_ecf, gmst};
use crate::propagator::propagate;
use crate::satellite::Satellite;

/// Fallback period for degenerate element sets with non-positive mean
/// motion, roughly one LEO revolution.
pub const DEFAULT_PERIOD_MINUTES: f64 = 96.0;

pub const DEFAULT_SAMPLES: usize = 180;
pub const MIN_SAMPLES: usize = 45;
pub const MAX_SAMPLES: usize = 360;

/// Orbital period in minutes from mean motion in radians per minute.
pub fn period_minutes(mean_motion_rad_min: f64) -> f64 {
    if mean_motion_rad_min > 0.0 {
        2.0 * std::f64::consts::PI / mean_motion_rad_min
    } else {
        DEFAULT_PERIOD_MINUTES
    }
}

/// One satellite's orbit ring. ECI samples are cached so the ring can
/// be cheaply re-projected into the rotating Earth frame each rendered
/// frame; the `points` field holds the frozen-ring projection at the
/// reference time.
pub struct OrbitPath {
    /// Closed loop in ECF meters at `reference_time`; first == last.
    pub points: Vec<Vector3<f64>>,
    /// Drift-corrected inertial samples in kilometers, also closed.
    eci_points: Vec<Vector3<f64>>,
    pub reference_time: DateTime<Utc>,
}

impl OrbitPath {
    /// Builds the path by sampling `samples` points across one period
    /// starting at `reference_time`. Returns `None` when the satellite
    /// cannot be propagated anywhere along the loop.
    pub fn build(sat: &Satellite, reference_time: DateTime<Utc>, samples: usize) -> Option<Self> {
        let n = samples.clamp(MIN_SAMPLES, MAX_SAMPLES);
        let period_min = period_minutes(sat.mean_motion_rad_min);

        let mut eci_points = Vec::with_capacity(n);
        for i in 0..n {
            let fraction = i as f64 / (n - 1) as f64;
            let t = reference_time
                + Duration::milliseconds((fraction * period_min * 60_000.0) as i64);
            let state = propagate(sat, t)?;
            eci_points.push(Vector3::from(state.position));
        }

        // J2 and drag keep the satellite from returning to its exact
        // starting point after one nominal period; spread the gap over
        // the loop so it closes without a seam.
        let gap = eci_points[n - 1] - eci_points[0];
        for (i, p) in eci_points.iter_mut().enumerate() {
            *p -= gap * (i as f64 / (n - 1) as f64);
        }
        eci_points[n - 1] = eci_points[0];

        let g = gmst(reference_time);
        let points = eci_points.iter().map(|p| eci_to_ecf(*p, g) * 1000.0).collect();

        Some(OrbitPath {
            points,
            eci_points,
            reference_time,
        })
    }

    /// Re-projects the cached inertial samples with the given GMST,
    /// for a ring that follows the rotating Earth frame per frame.
    pub fn reproject(&self, gmst: f64) -> Vec<Vector3<f64>> {
        self.eci_points
            .iter()
            .map(|p| eci_to_ecf(*p, gmst) * 1000.0)
            .collect()
    }
}
