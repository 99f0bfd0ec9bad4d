//! Simulation clock.
//!
//! Absolute simulation time with a playback speed multiplier, a
//! play/pause flag, and manual seeking. Drives every propagation call.

use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Debug)]
pub struct SimClock {
    pub current: DateTime<Utc>,
    /// Simulated seconds per wall-clock second. Negative runs backward.
    pub speed: f64,
    pub animate: bool,
}

impl SimClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        SimClock {
            current: start,
            speed: 1.0,
            animate: true,
        }
    }

    /// Advances by `real_dt_secs` of wall time when playing.
    pub fn advance(&mut self, real_dt_secs: f64) {
        if !self.animate {
            return;
        }
        let sim_ms = real_dt_secs * self.speed * 1000.0;
        self.current += Duration::milliseconds(sim_ms as i64);
    }

    /// Jumps to `t`. Returns true when the jump went backward, which
    /// invalidates forward dead-reckoning caches downstream.
    pub fn seek(&mut self, t: DateTime<Utc>) -> bool {
        let backward = t < self.current;
        self.current = t;
        backward
    }

    pub fn toggle_animate(&mut self) {
        self.animate = !self.animate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn advance_applies_speed() {
        let mut clock = SimClock::new(start());
        clock.speed = 60.0;
        clock.advance(1.0);
        assert_eq!(clock.current, start() + Duration::seconds(60));
    }

    #[test]
    fn paused_clock_holds() {
        let mut clock = SimClock::new(start());
        clock.animate = false;
        clock.advance(10.0);
        assert_eq!(clock.current, start());
    }

    #[test]
    fn seek_reports_direction() {
        let mut clock = SimClock::new(start());
        assert!(!clock.seek(start() + Duration::hours(1)));
        assert!(clock.seek(start()));
        assert_eq!(clock.current, start());
    }

    #[test]
    fn negative_speed_runs_backward() {
        let mut clock = SimClock::new(start());
        clock.speed = -10.0;
        clock.advance(1.0);
        assert!(clock.current < start());
    }
}
