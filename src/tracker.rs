//! Top-level tracking context.
//!
//! Owns the satellite population, the simulation clock, the current
//! selection, and the update scheduler. Everything is explicit state on
//! this struct; there are no module-level satellites anywhere in the
//! crate. A frontend drives `tick` once per rendered frame and reads
//! the caches back through the accessors or a [`MarkerSink`].

use chrono::{DateTime, Utc};

use crate::clock::SimClock;
use crate::frame::{ecf_to_geodetic_km, gmst, speed, transform, Geodetic};
use crate::orbit_path::{OrbitPath, DEFAULT_SAMPLES};
use crate::propagator::propagate;
use crate::render::{MarkerSink, VisibilityOracle};
use crate::satellite::{initialize, Satellite};
use crate::scheduler::{SchedulerConfig, TickStats, UpdateScheduler};
use crate::tle::TleRecord;
use crate::worker::PropagationWorker;

pub struct ConstellationTracker {
    satellites: Vec<Satellite>,
    scheduler: UpdateScheduler,
    pub clock: SimClock,
    selected: Option<usize>,
    orbit_path: Option<OrbitPath>,
    worker: Option<PropagationWorker>,
}

impl ConstellationTracker {
    pub fn new(records: &[TleRecord], config: SchedulerConfig, start: DateTime<Utc>) -> Self {
        ConstellationTracker {
            satellites: initialize(records),
            scheduler: UpdateScheduler::new(config),
            clock: SimClock::new(start),
            selected: None,
            orbit_path: None,
            worker: None,
        }
    }

    /// Moves whole-population propagation to a background thread. The
    /// per-frame tick then only applies finished batches and keeps the
    /// selected satellite exact on the main thread.
    pub fn enable_worker(&mut self) {
        self.worker = Some(PropagationWorker::new(&self.satellites));
    }

    pub fn satellites(&self) -> &[Satellite] {
        &self.satellites
    }

    pub fn selected(&self) -> Option<&Satellite> {
        self.selected.and_then(|i| self.satellites.get(i))
    }

    pub fn orbit_path(&self) -> Option<&OrbitPath> {
        self.orbit_path.as_ref()
    }

    /// Selects by catalog number (first match on duplicates) and builds
    /// the orbit ring for it. Returns false when the id is unknown.
    pub fn select(&mut self, catalog_number: &str) -> bool {
        let Some(idx) = self
            .satellites
            .iter()
            .position(|s| s.catalog_number == catalog_number)
        else {
            return false;
        };
        self.selected = Some(idx);
        self.orbit_path = OrbitPath::build(&self.satellites[idx], self.clock.current, DEFAULT_SAMPLES);
        if let Some(worker) = &mut self.worker {
            worker.invalidate();
        }
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.orbit_path = None;
        if let Some(worker) = &mut self.worker {
            worker.invalidate();
        }
    }

    /// Jumps the clock. A backward jump forces the next tick to
    /// repropagate the whole population, since the dead-reckoning
    /// caches assume forward time.
    pub fn seek(&mut self, t: DateTime<Utc>) {
        if self.clock.seek(t) {
            self.scheduler.force_full_refresh();
        }
        if let Some(worker) = &mut self.worker {
            worker.invalidate();
        }
        if let Some(idx) = self.selected {
            self.orbit_path = OrbitPath::build(&self.satellites[idx], t, DEFAULT_SAMPLES);
        }
    }

    /// Swaps the population wholesale (fresh element fetch). Selection
    /// survives when the catalog number is still present.
    pub fn replace_population(&mut self, records: &[TleRecord]) {
        let selected_catalog = self.selected().map(|s| s.catalog_number.clone());
        self.satellites = initialize(records);
        self.scheduler.force_full_refresh();
        if self.worker.is_some() {
            self.worker = Some(PropagationWorker::new(&self.satellites));
        }
        self.selected = None;
        self.orbit_path = None;
        if let Some(catalog) = selected_catalog {
            self.select(&catalog);
        }
    }

    /// Advances the clock by `real_dt_secs` of wall time and runs one
    /// scheduling pass. The selected satellite's state is always fully
    /// recomputed before this returns; rendering never observes it
    /// mid-update or stale.
    pub fn tick(&mut self, real_dt_secs: f64, oracle: &dyn VisibilityOracle) -> TickStats {
        self.clock.advance(real_dt_secs);
        let now = self.clock.current;

        if let Some(worker) = &mut self.worker {
            let mut stats = TickStats::default();
            if let Some(batch) = worker.poll() {
                let g = gmst(batch.time);
                for (sat, state) in self.satellites.iter_mut().zip(&batch.states) {
                    match state {
                        Some(state) => {
                            sat.kinematics = Some(transform(state, g, batch.time));
                            stats.full += 1;
                        }
                        None => stats.failed += 1,
                    }
                }
            } else {
                stats.held = self.satellites.len();
            }
            if worker.is_idle() {
                worker.try_request(now);
            }
            // selected satellite stays exact on the main thread
            if let Some(idx) = self.selected {
                let sat = &mut self.satellites[idx];
                if let Some(state) = propagate(sat, now) {
                    sat.kinematics = Some(transform(&state, gmst(now), now));
                    stats.full += 1;
                } else {
                    stats.failed += 1;
                }
            }
            stats
        } else {
            self.scheduler.tick(&mut self.satellites, now, self.selected, oracle)
        }
    }

    /// Geodetic fix and speed of the selected satellite, from its
    /// cached kinematics.
    pub fn selected_fix(&self) -> Option<(Geodetic, f64)> {
        let kin = self.selected()?.kinematics.as_ref()?;
        let geo = ecf_to_geodetic_km(kin.position / 1000.0);
        Some((geo, speed(kin)))
    }

    /// Pushes the frame snapshot at a rendering adapter: one marker per
    /// satellite with a cached position, plus the selected orbit ring.
    pub fn push_frame(&self, sink: &mut dyn MarkerSink) {
        for sat in &self.satellites {
            if let Some(kin) = &sat.kinematics {
                sink.upsert_marker(&sat.catalog_number, kin.position);
            }
        }
        match &self.orbit_path {
            Some(path) => sink.set_orbit_polyline(&path.points),
            None => sink.clear_orbit_polyline(),
        }
    }
}
