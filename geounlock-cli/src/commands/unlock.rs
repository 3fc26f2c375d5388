//! Unlock command - unlock a landmark from a given position.

use std::sync::Arc;

use geounlock::engine::{EnginePorts, GeofenceEngine};
use geounlock::geofence::InMemoryRegionMonitor;
use geounlock::ports::TracingNotifier;
use geounlock::proximity::{UnlockAttempt, UnlockOutcome};

use super::common::{format_distance, parse_location};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the unlock command.
pub fn run(runner: &CliRunner, landmark_id: &str, lat: f64, lon: f64) -> Result<(), CliError> {
    let here = parse_location(lat, lon)?;
    let config = runner.config();

    let ports = EnginePorts::new(
        Arc::new(InMemoryRegionMonitor::new(config.engine.max_regions)),
        Arc::new(TracingNotifier),
        Arc::new(runner.persistence()),
    );
    let mut engine = GeofenceEngine::new(
        config.engine.clone(),
        runner.registry(),
        runner.visited()?,
        ports,
    );

    let distance_m = match engine.attempt_unlock(landmark_id, Some(here))? {
        UnlockAttempt::Eligible { distance_m } => distance_m,
        UnlockAttempt::Ineligible(reason) => {
            return Err(CliError::NotEligible {
                landmark_id: landmark_id.to_string(),
                reason,
            });
        }
    };

    match engine.confirm_unlock(landmark_id)? {
        UnlockOutcome::Unlocked => println!(
            "Unlocked {} ({} away). {} of {} landmarks unlocked.",
            landmark_id,
            format_distance(distance_m),
            engine.visited().len(),
            engine.registry().len()
        ),
        UnlockOutcome::AlreadyUnlocked => println!("{} was already unlocked", landmark_id),
    }

    Ok(())
}
