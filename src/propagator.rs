//! SGP4/SDP4 propagation wrapper.
//!
//! Pure position/velocity evaluation at an absolute time. The sgp4
//! crate picks the near-Earth or deep-space model internally; this
//! module only handles the time bookkeeping and failure policy.

use chrono::{DateTime, Utc};

use crate::satellite::Satellite;

/// Inertial (TEME) state straight out of the analytic model.
/// Kilometers and kilometers per second; scaling to meters happens at
/// the frame-transform boundary, nowhere else.
#[derive(Clone, Copy, Debug)]
pub struct TemeState {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

pub fn minutes_since_epoch(sat: &Satellite, t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / 60_000.0 - sat.epoch_minutes
}

/// Propagates one satellite to `t`. Returns `None` when the analytic
/// model diverges (decayed orbit, numerical blow-up); callers treat
/// that as "skip this satellite this frame" and keep their last state.
pub fn propagate(sat: &Satellite, t: DateTime<Utc>) -> Option<TemeState> {
    propagate_minutes(&sat.constants, minutes_since_epoch(sat, t))
}

/// Same as [`propagate`] with the epoch offset already computed, for
/// callers that batch over a constants table (the worker thread).
pub fn propagate_minutes(constants: &sgp4::Constants, minutes: f64) -> Option<TemeState> {
    match constants.propagate(sgp4::MinutesSinceEpoch(minutes)) {
        Ok(prediction) => {
            let p = prediction.position;
            let v = prediction.velocity;
            if !p.iter().chain(v.iter()).all(|x| x.is_finite()) {
                return None;
            }
            Some(TemeState { position: p, velocity: v })
        }
        Err(_) => None,
    }
}
