//! Off-thread batch propagation.
//!
//! A background thread owns a copy of the population's SGP4 constants
//! and answers "propagate everyone to time t" requests over an mpsc
//! pair. Only one request may be outstanding; results are tagged with a
//! generation counter so a reply computed for a stale selection or seek
//! is discarded instead of racing the current state.

use std::sync::mpsc;
use std::thread;

use chrono::{DateTime, Utc};

use crate::propagator::{propagate_minutes, TemeState};
use crate::satellite::Satellite;

struct Request {
    generation: u64,
    time: DateTime<Utc>,
}

/// Whole-population propagation result, indexed like the population the
/// worker was built from. `None` entries diverged.
pub struct BatchResult {
    pub time: DateTime<Utc>,
    pub states: Vec<Option<TemeState>>,
}

struct Response {
    generation: u64,
    result: BatchResult,
}

pub struct PropagationWorker {
    req_tx: mpsc::Sender<Request>,
    resp_rx: mpsc::Receiver<Response>,
    generation: u64,
    pending: Option<u64>,
}

impl PropagationWorker {
    /// Spawns the worker with a snapshot of the population's model
    /// constants. Rebuild the worker when the population is replaced.
    pub fn new(satellites: &[Satellite]) -> Self {
        let table: Vec<(sgp4::Constants, f64)> = satellites
            .iter()
            .map(|s| (s.constants.clone(), s.epoch_minutes))
            .collect();
        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (resp_tx, resp_rx) = mpsc::channel::<Response>();

        thread::spawn(move || {
            // exits when the request sender is dropped
            while let Ok(req) = req_rx.recv() {
                let t_minutes = req.time.timestamp_millis() as f64 / 60_000.0;
                let states = table
                    .iter()
                    .map(|(constants, epoch)| propagate_minutes(constants, t_minutes - epoch))
                    .collect();
                let response = Response {
                    generation: req.generation,
                    result: BatchResult {
                        time: req.time,
                        states,
                    },
                };
                if resp_tx.send(response).is_err() {
                    break;
                }
            }
        });

        PropagationWorker {
            req_tx,
            resp_rx,
            generation: 0,
            pending: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Issues a batch request unless one is already in flight. The main
    /// thread never blocks on the worker; while busy, callers keep the
    /// previous result.
    pub fn try_request(&mut self, time: DateTime<Utc>) -> bool {
        if self.pending.is_some() {
            return false;
        }
        let generation = self.generation;
        if self
            .req_tx
            .send(Request { generation, time })
            .is_err()
        {
            log::warn!("propagation worker is gone");
            return false;
        }
        self.pending = Some(generation);
        true
    }

    /// Marks any in-flight request as irrelevant (selection change or
    /// seek). Its reply will be dropped on arrival.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Drains finished replies. Returns the result of the outstanding
    /// request if it arrived and is still current; stale replies clear
    /// the pending slot and are discarded.
    pub fn poll(&mut self) -> Option<BatchResult> {
        while let Ok(response) = self.resp_rx.try_recv() {
            if self.pending == Some(response.generation) {
                self.pending = None;
            }
            if response.generation == self.generation {
                return Some(response.result);
            }
            log::debug!(
                "discarding stale propagation batch (generation {})",
                response.generation
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::satellite::{initialize, tests::ISS_TLE};
    use crate::tle::parse_tle_text;
    use chrono::TimeZone;
    use std::time::{Duration, Instant};

    fn wait_for(worker: &mut PropagationWorker) -> Option<BatchResult> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(result) = worker.poll() {
                return Some(result);
            }
            thread::sleep(Duration::from_millis(1));
        }
        None
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 7, 13, 12, 0, 0).unwrap()
    }

    #[test]
    fn answers_batch_request() {
        let sats = initialize(&parse_tle_text(&vec![ISS_TLE; 3].join("\n")));
        let mut worker = PropagationWorker::new(&sats);
        assert!(worker.try_request(t0()));
        assert!(!worker.try_request(t0()), "single outstanding request");
        let result = wait_for(&mut worker).expect("worker reply");
        assert_eq!(result.time, t0());
        assert_eq!(result.states.len(), 3);
        assert!(result.states.iter().all(|s| s.is_some()));
        assert!(worker.is_idle());
    }

    #[test]
    fn invalidated_request_is_discarded() {
        let sats = initialize(&parse_tle_text(ISS_TLE));
        let mut worker = PropagationWorker::new(&sats);
        assert!(worker.try_request(t0()));
        worker.invalidate();
        // the stale reply must be dropped but still free the slot
        let deadline = Instant::now() + Duration::from_secs(5);
        while !worker.is_idle() && Instant::now() < deadline {
            assert!(worker.poll().is_none());
            thread::sleep(Duration::from_millis(1));
        }
        assert!(worker.is_idle());
        assert!(worker.try_request(t0() + chrono::Duration::seconds(1)));
        assert!(wait_for(&mut worker).is_some());
    }

    #[test]
    fn empty_population_round_trips() {
        let mut worker = PropagationWorker::new(&[]);
        assert!(worker.try_request(t0()));
        let result = wait_for(&mut worker).unwrap();
        assert!(result.states.is_empty());
    }
}
