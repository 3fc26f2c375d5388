//! Reset command - forget every unlocked landmark.

use std::collections::HashSet;

use geounlock::ports::PersistencePort;
use tracing::warn;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the reset command.
pub fn run(runner: &CliRunner) -> Result<(), CliError> {
    // Reset is the one command allowed to replace an unreadable record
    let previous = runner.visited();
    let persistence = runner.persistence();
    persistence.save_visited(&HashSet::new())?;

    match previous {
        Ok(visited) => println!(
            "Cleared {} unlocked landmark(s) in {}",
            visited.len(),
            persistence.path().display()
        ),
        Err(e) => {
            warn!(error = %e, "Replaced unreadable visited file");
            println!("Replaced unreadable {}", persistence.path().display());
        }
    }
    Ok(())
}
