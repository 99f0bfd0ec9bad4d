//! Satellite records and batch initialization.
//!
//! Turns parsed TLE records into propagatable satellites by deriving the
//! SGP4 constants once per element set. Satellites that fail model
//! initialization are dropped individually; a batch never aborts.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use sgp4::Constants;

use crate::tle::TleRecord;

pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Last fully-propagated state for one satellite, in the Earth-fixed
/// frame. Written only by the update scheduler, read by extrapolation
/// and by the presentation layer.
#[derive(Clone, Debug)]
pub struct Kinematics {
    /// ECF position in meters.
    pub position: Vector3<f64>,
    /// ECF velocity in meters per second.
    pub velocity: Vector3<f64>,
    /// Simulation time of the last full propagation.
    pub computed_at: DateTime<Utc>,
    /// Position magnitude at the last full propagation, used to rein in
    /// altitude creep from linear extrapolation.
    pub radius: f64,
}

/// One tracked satellite: identity, propagation model state, and the
/// mutable kinematics cache.
pub struct Satellite {
    /// NORAD catalog number. Stable across the satellite's lifetime.
    pub catalog_number: String,
    pub name: String,
    pub constants: Constants,
    /// Element epoch as minutes since the Unix epoch.
    pub epoch_minutes: f64,
    /// Mean motion in radians per minute, for period derivation.
    pub mean_motion_rad_min: f64,
    pub inclination_deg: f64,
    pub kinematics: Option<Kinematics>,
}

/// Builds satellites from parsed records. Records whose orbital
/// parameters the SGP4 model rejects are logged and skipped; an empty
/// or all-invalid input yields an empty collection, not an error.
pub fn initialize(records: &[TleRecord]) -> Vec<Satellite> {
    let mut satellites = Vec::with_capacity(records.len());
    for record in records {
        let elements = match sgp4::Elements::from_tle(
            Some(record.name.clone()),
            record.line1.as_bytes(),
            record.line2.as_bytes(),
        ) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("dropping {} ({}): {}", record.name, record.catalog_number, e);
                continue;
            }
        };
        let constants = match Constants::from_elements(&elements) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("dropping {} ({}): {}", record.name, record.catalog_number, e);
                continue;
            }
        };
        let epoch_minutes = elements.datetime.and_utc().timestamp_millis() as f64 / 60_000.0;
        satellites.push(Satellite {
            catalog_number: record.catalog_number.clone(),
            name: record.name.clone(),
            constants,
            epoch_minutes,
            mean_motion_rad_min: elements.mean_motion * 2.0 * std::f64::consts::PI
                / MINUTES_PER_DAY,
            inclination_deg: elements.inclination,
            kinematics: None,
        });
    }
    satellites
}
