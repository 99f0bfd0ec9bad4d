//! Reference frame conversions.
//!
//! Greenwich Mean Sidereal Time, the ECI-to-ECF rotation it phases, and
//! WGS84 geodetic coordinates. Propagation works in kilometers; the
//! single kilometers-to-meters conversion for downstream consumers
//! lives here, in [`transform`].

use chrono::{DateTime, Utc};
use nalgebra::Vector3;

use crate::propagator::TemeState;
use crate::satellite::Kinematics;
use crate::tle::SECONDS_PER_DAY;

pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;
pub const GMST_BASE_DEG: f64 = 280.46061837;
pub const GMST_ROTATION_PER_DAY: f64 = 360.98564736629;
pub const GMST_CORRECTION: f64 = 0.000387933;

const WGS84_A_KM: f64 = 6378.137;
const WGS84_F: f64 = 1.0 / 298.257223563;
const WGS84_B_KM: f64 = WGS84_A_KM * (1.0 - WGS84_F);

/// Greenwich Mean Sidereal Time in radians at `t`, the rotation phase
/// between the inertial and Earth-fixed frames.
pub fn gmst(t: DateTime<Utc>) -> f64 {
    let j2000 = DateTime::parse_from_rfc3339("2000-01-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let days = (t - j2000).num_milliseconds() as f64 / (1000.0 * SECONDS_PER_DAY);
    let centuries = days / DAYS_PER_JULIAN_CENTURY;
    let degrees = GMST_BASE_DEG
        + GMST_ROTATION_PER_DAY * days
        + GMST_CORRECTION * centuries * centuries
        - centuries * centuries * centuries / 38710000.0;
    degrees.rem_euclid(360.0).to_radians()
}

/// Rotates an inertial vector into the Earth-fixed frame by `-gmst`
/// about the polar axis. Units are preserved.
pub fn eci_to_ecf(v: Vector3<f64>, gmst: f64) -> Vector3<f64> {
    let (sin_t, cos_t) = gmst.sin_cos();
    Vector3::new(cos_t * v.x + sin_t * v.y, -sin_t * v.x + cos_t * v.y, v.z)
}

/// Inverse of [`eci_to_ecf`] for the same GMST.
pub fn ecf_to_eci(v: Vector3<f64>, gmst: f64) -> Vector3<f64> {
    eci_to_ecf(v, -gmst)
}

/// Full per-satellite transform: inertial kilometers in, Earth-fixed
/// meters out. This is the only place the x1000 scaling happens.
pub fn transform(state: &TemeState, gmst: f64, t: DateTime<Utc>) -> Kinematics {
    let pos_km = Vector3::from(state.position);
    let vel_kms = Vector3::from(state.velocity);
    let position = eci_to_ecf(pos_km, gmst) * 1000.0;
    let velocity = eci_to_ecf(vel_kms, gmst) * 1000.0;
    Kinematics {
        position,
        velocity,
        computed_at: t,
        radius: position.norm(),
    }
}

/// Geodetic coordinates on the WGS84 ellipsoid.
#[derive(Clone, Copy, Debug)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub height_km: f64,
}

/// Derives geodetic coordinates from an inertial position and the GMST
/// of the same instant. The (position, gmst) pair must match: mixing a
/// position with another time's GMST silently shifts the longitude.
pub fn eci_to_geodetic(pos_eci_km: Vector3<f64>, gmst: f64) -> Geodetic {
    ecf_to_geodetic_km(eci_to_ecf(pos_eci_km, gmst))
}

/// Bowring's closed-form ECF-to-geodetic conversion, kilometers in.
pub fn ecf_to_geodetic_km(ecf: Vector3<f64>) -> Geodetic {
    let a = WGS84_A_KM;
    let b = WGS84_B_KM;
    let e2 = 1.0 - (b * b) / (a * a);
    let ep2 = (a * a - b * b) / (b * b);

    let longitude_deg = ecf.y.atan2(ecf.x).to_degrees();

    let p = (ecf.x * ecf.x + ecf.y * ecf.y).sqrt();
    let theta = (ecf.z * a).atan2(p * b);
    let (sin_t, cos_t) = theta.sin_cos();
    let lat = (ecf.z + ep2 * b * sin_t.powi(3)).atan2(p - e2 * a * cos_t.powi(3));

    let sin_lat = lat.sin();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let height_km = if lat.cos().abs() > 1e-8 {
        p / lat.cos() - n
    } else {
        // near-polar: the p/cos(lat) form degenerates
        ecf.z.abs() - b
    };

    Geodetic {
        latitude_deg: lat.to_degrees(),
        longitude_deg,
        height_km,
    }
}

/// Instantaneous speed in meters per second.
pub fn speed(kin: &Kinematics) -> f64 {
    kin.velocity.norm()
}
