//! Nearest command - direction to the closest locked landmark.

use geounlock::proximity::ProximityClassifier;

use super::common::{compass_point, format_distance, parse_location};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the nearest command.
pub fn run(runner: &CliRunner, lat: f64, lon: f64) -> Result<(), CliError> {
    let here = parse_location(lat, lon)?;
    let registry = runner.registry();
    let visited = runner.visited()?;
    let classifier = ProximityClassifier::from_config(&runner.config().engine);

    let Some(nearest) = classifier.nearest(registry.landmarks(), &visited, here) else {
        println!("No landmarks known");
        return Ok(());
    };

    let name = registry
        .get(&nearest.landmark_id)
        .map(|l| l.name.as_str())
        .unwrap_or(nearest.landmark_id.as_str());
    let label = if nearest.unlocked {
        "Nearest landmark (all unlocked)"
    } else {
        "Nearest locked landmark"
    };
    println!("{}: {}", label, name);
    println!(
        "  {} {} ({:.0}°)",
        format_distance(nearest.distance_m),
        compass_point(nearest.bearing_deg),
        nearest.bearing_deg
    );

    let nearby = classifier.nearby(registry.landmarks(), here);
    if !nearby.is_empty() {
        println!();
        println!("Nearby:");
        for entry in nearby {
            let unlocked = if visited.contains(&entry.landmark_id) {
                " (unlocked)"
            } else {
                ""
            };
            println!(
                "  {:>8}  {}{}",
                format_distance(entry.distance_m),
                entry.landmark_id,
                unlocked
            );
        }
    }

    Ok(())
}
