//! Synthetic fallback constellation.
//!
//! Emits a Walker-delta shell as real TLE text (correct columns and
//! checksums) so offline operation feeds the exact same parse and
//! initialization path as live CelesTrak data. Used only to keep the
//! visualization populated when the element source is unreachable; not
//! a correctness-critical model of any real constellation.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::tle::{parse_tle_text, TleRecord};

const MU_EARTH: f64 = 398600.4418; // km^3/s^2
const EARTH_EQ_RADIUS_KM: f64 = 6378.137;

/// First catalog number assigned to synthetic satellites; the 90000+
/// range is reserved for analyst objects and never collides with live
/// data.
const SYNTHETIC_CATALOG_BASE: u32 = 90000;

/// Mean motion in revolutions per day for a circular orbit at
/// `altitude_km`.
fn mean_motion_rev_day(altitude_km: f64) -> f64 {
    let a = EARTH_EQ_RADIUS_KM + altitude_km;
    let n_rad_s = (MU_EARTH / (a * a * a)).sqrt();
    n_rad_s * 86400.0 / (2.0 * std::f64::consts::PI)
}

fn checksum(line: &str) -> u32 {
    line.chars()
        .map(|c| match c {
            '0'..='9' => c as u32 - '0' as u32,
            '-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

fn finish(mut line: String) -> String {
    debug_assert_eq!(line.len(), 68);
    line.push(char::from_digit(checksum(&line), 10).unwrap());
    line
}

/// Generates a Walker-delta shell of `total` satellites spread over
/// `planes` orbital planes and returns it as parsed TLE records.
pub fn walker_delta(
    total: usize,
    planes: usize,
    inclination_deg: f64,
    altitude_km: f64,
    epoch: DateTime<Utc>,
) -> Vec<TleRecord> {
    let planes = planes.max(1);
    let mm = mean_motion_rev_day(altitude_km);
    let yy = epoch.year().rem_euclid(100) as u32;
    let day_fraction = epoch.num_seconds_from_midnight() as f64 / 86400.0;
    let doy = epoch.ordinal() as f64 + day_fraction;

    let mut text = String::new();
    for i in 0..total {
        let plane = i % planes;
        let slot = i / planes;
        let sats_in_plane = total / planes + usize::from(plane < total % planes);
        let catno = SYNTHETIC_CATALOG_BASE + i as u32;

        let raan = 360.0 * plane as f64 / planes as f64;
        // phase factor 1: successive planes offset by one slot step
        let ma = (360.0 * slot as f64 / sats_in_plane.max(1) as f64
            + 360.0 * plane as f64 / total.max(1) as f64)
            .rem_euclid(360.0);

        let line1 = finish(format!(
            "1 {:05}U {:02}{:03}A   {:02}{:012.8}  .00000000  00000-0  00000-0 0  999",
            catno,
            yy,
            plane + 1,
            yy,
            doy
        ));
        let line2 = finish(format!(
            "2 {:05} {:8.4} {:8.4} 0001000 {:8.4} {:8.4} {:11.8}    1",
            catno, inclination_deg, raan, 0.0, ma, mm
        ));
        text.push_str(&format!("SYNTH-{:04}\n{}\n{}\n", i, line1, line2));
    }

    parse_tle_text(&text)
}
