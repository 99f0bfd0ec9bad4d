//! Headless demo: track a constellation at 60 ticks per second and
//! print the selected satellite's geodetic fix once per second.
//!
//! Usage: leo-track [starlink|oneweb|stations|active|synthetic]

use chrono::Utc;

use leo_track::{
    load_constellation, AlwaysVisible, ConstellationTracker, SchedulerConfig, TleGroup,
};

const TICK_SECS: f64 = 1.0 / 60.0;
const RUN_TICKS: usize = 600;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let arg = std::env::args().nth(1).unwrap_or_else(|| "starlink".to_string());
    let records = match arg.as_str() {
        "starlink" => load_constellation(TleGroup::Starlink),
        "oneweb" => load_constellation(TleGroup::OneWeb),
        "stations" => load_constellation(TleGroup::Stations),
        "active" => load_constellation(TleGroup::Active),
        "synthetic" => leo_track::synthetic::walker_delta(500, 20, 53.0, 550.0, Utc::now()),
        other => {
            eprintln!("unknown group '{}', use starlink|oneweb|stations|active|synthetic", other);
            std::process::exit(2);
        }
    };

    let mut tracker = ConstellationTracker::new(&records, SchedulerConfig::default(), Utc::now());
    log::info!(
        "tracking {} satellites ({} element sets)",
        tracker.satellites().len(),
        records.len()
    );
    if tracker.satellites().is_empty() {
        log::warn!("nothing to track");
        return;
    }

    // watch the first satellite, at 60x so a few orbits go by quickly
    let first = tracker.satellites()[0].catalog_number.clone();
    tracker.select(&first);
    tracker.clock.speed = 60.0;

    for tick in 0..RUN_TICKS {
        let stats = tracker.tick(TICK_SECS, &AlwaysVisible);
        if tick % 60 == 0 {
            let sat = tracker.selected().expect("selection persists");
            if let Some((geo, v)) = tracker.selected_fix() {
                println!(
                    "{} | {} ({}) lat {:7.2}° lon {:8.2}° alt {:7.1} km  {:6.0} m/s | full {} extrapolated {}",
                    tracker.clock.current.format("%H:%M:%S"),
                    sat.name,
                    sat.catalog_number,
                    geo.latitude_deg,
                    geo.longitude_deg,
                    geo.height_km,
                    v,
                    stats.full,
                    stats.extrapolated,
                );
            }
        }
    }
}
