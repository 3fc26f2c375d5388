//! Configuration CLI commands.
//!
//! Provides `config path` and `config show` for inspecting the effective
//! configuration.

use std::path::Path;

use clap::Subcommand;
use geounlock::config::ConfigFile;

use crate::error::CliError;
use crate::runner::resolve_config_path;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration (file values over defaults)
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = resolve_config_path(config_path);
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => run_show(&path),
    }
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    let engine = &config.engine;
    let data = &config.data;

    let source = if path.exists() { "" } else { " (not found, defaults)" };
    println!("Configuration: {}{}", path.display(), source);
    println!();

    println!("[geofence]");
    println!("  max_regions = {}", engine.max_regions);
    println!("  notify_radius_m = {}", engine.notify_radius_m);
    println!("  recompute_distance_m = {}", engine.recompute_distance_m);
    println!();

    println!("[proximity]");
    println!("  unlock_radius_m = {}", engine.unlock_radius_m);
    println!("  nearby_radius_m = {}", engine.nearby_radius_m);
    println!("  notify_cooldown_secs = {}", engine.notify_cooldown_secs);
    println!();

    println!("[data]");
    match &data.landmarks_file {
        Some(file) => println!("  landmarks_file = {}", file.display()),
        None => println!("  landmarks_file = (built-in)"),
    }
    println!("  visited_file = {}", data.visited_file.display());

    let deviations = engine.deviations();
    if !deviations.is_empty() {
        println!();
        println!("Non-default radii: {}", deviations.join(", "));
    }

    Ok(())
}
