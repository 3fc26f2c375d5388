//! Landmarks command - list landmarks with their unlock state.

use console::style;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the landmarks command.
pub fn run(runner: &CliRunner, search: Option<&str>) -> Result<(), CliError> {
    let registry = runner.registry();
    let visited = runner.visited()?;

    let matches = registry.search(search.unwrap_or(""));
    if matches.is_empty() {
        println!("No landmarks match '{}'", search.unwrap_or(""));
        return Ok(());
    }

    let unlocked = registry
        .iter()
        .filter(|l| visited.contains(&l.id))
        .count();
    println!("Landmarks ({} of {} unlocked)", unlocked, registry.len());
    println!();

    for landmark in matches {
        let status = landmark.status(&visited);
        let marker = if status.unlocked {
            style("[x]").green()
        } else {
            style("[ ]").dim()
        };
        println!(
            "  {} {} ({})",
            marker,
            style(&landmark.name).bold(),
            landmark.id
        );
        match &landmark.historical_year {
            Some(year) => println!("      {}  since {}", landmark.coordinate(), year),
            None => println!("      {}", landmark.coordinate()),
        }
    }

    Ok(())
}
