//! Frame-budgeted update scheduling.
//!
//! Decides, per animation tick, which satellites get a full SGP4
//! propagation and which ride on dead-reckoning from their cached
//! state. The selected satellite is always exact; everyone else is
//! spread across round-robin batches, with a coarser stride for
//! satellites the frontend reports as not visible.

use chrono::{DateTime, Utc};

use crate::frame::{gmst, transform};
use crate::propagator::propagate;
use crate::render::VisibilityOracle;
use crate::satellite::Satellite;

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Number of round-robin batches B; each visible satellite is fully
    /// repropagated once every B ticks.
    pub batches: usize,
    /// Stride multiplier for satellites the visibility oracle culls.
    pub culled_stride_factor: usize,
    /// Relative magnitude drift at which an extrapolated position is
    /// rescaled back to the cached orbit radius.
    pub radius_drift_threshold: f64,
    /// Dead-reckon off-batch satellites; when false they hold their
    /// last computed position instead.
    pub extrapolate: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            batches: 8,
            culled_stride_factor: 4,
            radius_drift_threshold: 5e-3,
            extrapolate: true,
        }
    }
}

/// What one tick did, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickStats {
    pub full: usize,
    pub extrapolated: usize,
    pub held: usize,
    /// Propagation divergences; the affected caches were left untouched.
    pub failed: usize,
}

pub struct UpdateScheduler {
    config: SchedulerConfig,
    tick: u64,
    force_full: bool,
    last_tick_time: Option<DateTime<Utc>>,
}

impl UpdateScheduler {
    pub fn new(mut config: SchedulerConfig) -> Self {
        config.batches = config.batches.max(1);
        config.culled_stride_factor = config.culled_stride_factor.max(1);
        UpdateScheduler {
            config,
            tick: 0,
            force_full: false,
            last_tick_time: None,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Forces the next tick to repropagate the entire population.
    /// Required after a backward seek: extrapolating forward from a
    /// cache computed for a later time is invalid.
    pub fn force_full_refresh(&mut self) {
        self.force_full = true;
        self.last_tick_time = None;
    }

    /// One scheduling pass over the population at simulation time
    /// `now`. Mutates each satellite's kinematics cache in place and
    /// allocates nothing per satellite.
    pub fn tick(
        &mut self,
        satellites: &mut [Satellite],
        now: DateTime<Utc>,
        selected: Option<usize>,
        oracle: &dyn VisibilityOracle,
    ) -> TickStats {
        let g = gmst(now);
        let b = self.config.batches as u64;
        let tick = self.tick;
        self.tick = self.tick.wrapping_add(1);
        let force_full = std::mem::take(&mut self.force_full);
        let dt_secs = self
            .last_tick_time
            .map(|last| (now - last).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);
        self.last_tick_time = Some(now);

        let mut stats = TickStats::default();
        for (idx, sat) in satellites.iter_mut().enumerate() {
            let is_selected = selected == Some(idx);
            let due = is_selected || force_full || sat.kinematics.is_none() || {
                let visible = sat
                    .kinematics
                    .as_ref()
                    .map(|k| oracle.is_visible(&k.position))
                    .unwrap_or(true);
                let stride = if visible {
                    b
                } else {
                    b * self.config.culled_stride_factor as u64
                };
                idx as u64 % stride == tick % stride
            };

            if due {
                match propagate(sat, now) {
                    Some(state) => {
                        sat.kinematics = Some(transform(&state, g, now));
                        stats.full += 1;
                    }
                    // stale-but-present beats snapping to the origin
                    None => stats.failed += 1,
                }
            } else if self.config.extrapolate {
                // not due implies the cache exists
                let Some(kin) = sat.kinematics.as_mut() else { continue };
                kin.position += kin.velocity * dt_secs;
                let r = kin.position.norm();
                if r > 0.0 && ((r - kin.radius) / kin.radius).abs() > self.config.radius_drift_threshold
                {
                    // linear extrapolation of a curved orbit creeps
                    // outward; snap the magnitude back
                    kin.position *= kin.radius / r;
                }
                stats.extrapolated += 1;
            } else {
                stats.held += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::AlwaysVisible;
    use crate::satellite::{initialize, tests::ISS_TLE};
    use crate::tle::parse_tle_text;
    use chrono::{Duration, TimeZone};
    use nalgebra::Vector3;

    fn population(n: usize) -> Vec<Satellite> {
        let text = vec![ISS_TLE; n].join("\n");
        let sats = initialize(&parse_tle_text(&text));
        assert_eq!(sats.len(), n);
        sats
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 7, 13, 12, 0, 0).unwrap()
    }

    struct NothingVisible;
    impl VisibilityOracle for NothingVisible {
        fn is_visible(&self, _: &Vector3<f64>) -> bool {
            false
        }
    }

    fn config(batches: usize) -> SchedulerConfig {
        SchedulerConfig {
            batches,
            ..SchedulerConfig::default()
        }
    }

    #[test]
    fn first_tick_touches_everyone() {
        let mut sats = population(6);
        let mut sched = UpdateScheduler::new(config(4));
        let stats = sched.tick(&mut sats, start(), None, &AlwaysVisible);
        assert_eq!(stats.full, 6);
        assert!(sats.iter().all(|s| s.kinematics.is_some()));
    }

    #[test]
    fn batches_cover_every_satellite_exactly_once_per_cycle() {
        let b = 4;
        let mut sats = population(8);
        let mut sched = UpdateScheduler::new(config(b));
        let mut now = start();
        sched.tick(&mut sats, now, None, &AlwaysVisible);

        let mut full_counts = vec![0usize; sats.len()];
        for _ in 0..b {
            now += Duration::milliseconds(16);
            let before: Vec<_> = sats
                .iter()
                .map(|s| s.kinematics.as_ref().unwrap().computed_at)
                .collect();
            let stats = sched.tick(&mut sats, now, None, &AlwaysVisible);
            assert_eq!(stats.full, sats.len() / b);
            for (i, sat) in sats.iter().enumerate() {
                if sat.kinematics.as_ref().unwrap().computed_at != before[i] {
                    full_counts[i] += 1;
                }
            }
        }
        assert!(full_counts.iter().all(|&c| c == 1), "{:?}", full_counts);
    }

    #[test]
    fn selected_satellite_is_never_stale() {
        let mut sats = population(8);
        let mut sched = UpdateScheduler::new(config(4));
        let mut now = start();
        // cheap deterministic selection shuffle
        let mut lcg: u64 = 42;
        for _ in 0..1000 {
            now += Duration::milliseconds(16);
            lcg = lcg.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let selected = (lcg >> 33) as usize % sats.len();
            sched.tick(&mut sats, now, Some(selected), &AlwaysVisible);
            let kin = sats[selected].kinematics.as_ref().unwrap();
            assert_eq!(kin.computed_at, now);
        }
    }

    #[test]
    fn backward_seek_forces_full_repropagation() {
        let mut sats = population(8);
        let mut sched = UpdateScheduler::new(config(4));
        let mut now = start();
        for _ in 0..6 {
            now += Duration::milliseconds(16);
            sched.tick(&mut sats, now, None, &AlwaysVisible);
        }
        let back = start() - Duration::minutes(30);
        sched.force_full_refresh();
        let stats = sched.tick(&mut sats, back, None, &AlwaysVisible);
        assert_eq!(stats.full, sats.len());
        for sat in &sats {
            assert_eq!(sat.kinematics.as_ref().unwrap().computed_at, back);
        }
    }

    #[test]
    fn culled_satellites_use_coarser_stride() {
        let b = 2;
        let mut sats = population(8);
        let mut cfg = config(b);
        cfg.culled_stride_factor = 4;
        let mut sched = UpdateScheduler::new(cfg);
        let mut now = start();
        sched.tick(&mut sats, now, None, &NothingVisible);

        // stride is 8 while culled, so one full update per tick
        for _ in 0..8 {
            now += Duration::milliseconds(16);
            let stats = sched.tick(&mut sats, now, None, &NothingVisible);
            assert_eq!(stats.full, 1);
        }
    }

    #[test]
    fn extrapolation_moves_but_keeps_radius() {
        let mut sats = population(2);
        let mut sched = UpdateScheduler::new(config(2));
        let mut now = start();
        sched.tick(&mut sats, now, None, &AlwaysVisible);
        let before = sats[0].kinematics.clone().unwrap();

        // tick 1 refreshes index 1; index 0 dead-reckons over a full minute
        now += Duration::seconds(60);
        let stats = sched.tick(&mut sats, now, None, &AlwaysVisible);
        assert_eq!(stats.extrapolated, 1);
        let after = sats[0].kinematics.as_ref().unwrap();
        assert_ne!(after.position, before.position);
        assert_eq!(after.computed_at, before.computed_at);
        let drift = ((after.position.norm() - after.radius) / after.radius).abs();
        assert!(drift <= sched.config().radius_drift_threshold * 1.01);
    }

    #[test]
    fn hold_mode_leaves_positions_untouched() {
        let mut sats = population(2);
        let mut cfg = config(2);
        cfg.extrapolate = false;
        let mut sched = UpdateScheduler::new(cfg);
        let mut now = start();
        sched.tick(&mut sats, now, None, &AlwaysVisible);
        let before = sats[0].kinematics.clone().unwrap();
        now += Duration::seconds(60);
        let stats = sched.tick(&mut sats, now, None, &AlwaysVisible);
        assert_eq!(stats.held, 1);
        assert_eq!(sats[0].kinematics.as_ref().unwrap().position, before.position);
    }
}
