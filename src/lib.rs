//! Satellite constellation tracking core.
//!
//! Everything a globe frontend needs to animate a live constellation:
//! TLE parsing, SGP4/SDP4 propagation, ECI/ECF/geodetic transforms,
//! closed orbit-path generation, and a frame-budgeted update scheduler
//! that keeps tens of thousands of satellites moving under a strict
//! per-frame CPU budget. Rendering itself stays behind the narrow
//! traits in [`render`].

pub mod clock;
pub mod fetch;
pub mod frame;
pub mod orbit_path;
pub mod propagator;
pub mod render;
pub mod satellite;
pub mod scheduler;
pub mod synthetic;
pub mod tle;
pub mod tracker;
pub mod worker;

pub use clock::SimClock;
pub use fetch::{load_constellation, TleGroup};
pub use orbit_path::OrbitPath;
pub use render::{AlwaysVisible, MarkerSink, VisibilityOracle};
pub use satellite::{Kinematics, Satellite};
pub use scheduler::{SchedulerConfig, TickStats, UpdateScheduler};
pub use tle::{parse_tle_text, TleRecord};
pub use tracker::ConstellationTracker;
