//! Simulate command - replay a walk through the engine.
//!
//! The track file is a JSON array of fixes:
//!
//! ```text
//! [
//!   { "latitude": 40.8375, "longitude": 14.2490 },
//!   { "latitude": 40.8380, "longitude": 14.2496, "capture": true }
//! ]
//! ```
//!
//! Region entries are derived from the in-memory monitor: a fix that lands
//! inside a monitored region it was not in before counts as an entry. A fix
//! with `"capture": true` tries to unlock every landmark eligible there.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use geounlock::app::{AppConfig, GeoUnlockApp};
use geounlock::engine::{EngineEvent, EngineHandle};
use geounlock::geo::Coordinate;
use geounlock::geofence::InMemoryRegionMonitor;
use geounlock::ports::{MemoryPersistence, PersistencePort, TracingNotifier};
use serde::Deserialize;
use tokio::sync::broadcast;

use super::common::{format_distance, parse_location};
use crate::error::CliError;
use crate::runner::CliRunner;

/// One fix of a simulated walk.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub capture: bool,
}

/// Read and parse a track file.
pub fn load_track(path: &Path) -> Result<Vec<TrackPoint>, CliError> {
    let contents = fs::read_to_string(path).map_err(|source| CliError::TrackRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::TrackFormat {
        path: path.to_path_buf(),
        source,
    })
}

/// Run the simulate command.
///
/// Unless `persist` is set, unlocks stay in memory and the visited file is
/// left untouched.
pub fn run(runner: &CliRunner, track_path: &Path, persist: bool) -> Result<(), CliError> {
    let track = load_track(track_path)?;
    let fixes = track
        .iter()
        .map(|p| parse_location(p.latitude, p.longitude))
        .collect::<Result<Vec<_>, _>>()?;

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    runtime.block_on(simulate(runner, &track, &fixes, persist))
}

async fn simulate(
    runner: &CliRunner,
    track: &[TrackPoint],
    fixes: &[Coordinate],
    persist: bool,
) -> Result<(), CliError> {
    let config = AppConfig::from_config_file(runner.config());
    let monitor = Arc::new(InMemoryRegionMonitor::new(config.engine.max_regions));
    let persistence: Arc<dyn PersistencePort> = if persist {
        Arc::new(runner.persistence())
    } else {
        Arc::new(MemoryPersistence::with_visited(runner.visited()?))
    };

    let app = GeoUnlockApp::start(config, monitor.clone(), Arc::new(TracingNotifier), persistence)
        .await?;
    let handle = app.handle();
    let mut events = handle.subscribe();

    println!("Replaying {} fixes", fixes.len());
    let mut inside: HashSet<String> = HashSet::new();

    for (step, (point, fix)) in track.iter().zip(fixes).enumerate() {
        println!();
        println!("#{:<3} {}", step + 1, fix);

        handle.update_location(*fix).await?;
        // Barrier: the reply arrives after the fix has been processed
        handle.snapshot().await?;

        let now: HashSet<String> = monitor.regions_containing(*fix).into_iter().collect();
        let entered: BTreeSet<&String> = now.difference(&inside).collect();
        for landmark_id in entered {
            handle.region_entered(landmark_id.as_str()).await?;
        }
        inside = now;

        if point.capture {
            capture_eligible(&handle, *fix).await?;
        }

        let snapshot = handle.snapshot().await?;
        print_events(&mut events);
        println!(
            "     regions: {}  eligible: {}",
            snapshot.active_regions.len(),
            snapshot.eligible.len()
        );
    }

    let snapshot = handle.snapshot().await?;
    println!();
    println!(
        "Done: {} of {} landmarks unlocked",
        snapshot.visited.len(),
        snapshot.landmark_count
    );

    app.shutdown().await?;
    Ok(())
}

async fn capture_eligible(handle: &EngineHandle, fix: Coordinate) -> Result<(), CliError> {
    let snapshot = handle.snapshot().await?;
    for landmark_id in snapshot.eligible {
        let attempt = handle.attempt_unlock(landmark_id.as_str(), Some(fix)).await?;
        if attempt.is_eligible() {
            handle.confirm_unlock(landmark_id.as_str()).await?;
        }
    }
    Ok(())
}

fn print_events(events: &mut broadcast::Receiver<EngineEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => print_event(&event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                println!("     ({} events skipped)", skipped);
            }
            Err(_) => break,
        }
    }
}

fn print_event(event: &EngineEvent) {
    match event {
        EngineEvent::CameIntoProximity { name, .. } => println!("     near {}", name),
        EngineEvent::UnlockEligible {
            landmark_id,
            distance_m,
        } => println!(
            "     can unlock {} ({} away)",
            landmark_id,
            format_distance(*distance_m)
        ),
        EngineEvent::Unlocked { landmark_id } => println!("     unlocked {}", landmark_id),
        EngineEvent::VisitedReset => println!("     visited set reset"),
        EngineEvent::GeofencesChanged {
            started, stopped, ..
        } => {
            if !started.is_empty() || !stopped.is_empty() {
                println!(
                    "     geofences +{} -{}",
                    started.len(),
                    stopped.len()
                );
            }
        }
        EngineEvent::MonitoringDegraded => println!("     region monitoring unavailable"),
    }
}
