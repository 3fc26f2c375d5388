//! GeoUnlock CLI - Command-line interface
//!
//! Inspect landmarks, get directions, unlock from a position and replay
//! recorded walks through the geofence engine.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "geounlock")]
#[command(version, about = "Walk to a landmark, capture it, unlock it", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print debug logs to stdout
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List landmarks and whether they are unlocked
    Landmarks {
        /// Only show landmarks whose name contains this text (case-insensitive)
        #[arg(long)]
        search: Option<String>,
    },

    /// Show the nearest locked landmark and what is nearby
    Nearest {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Unlock a landmark if the position is close enough
    Unlock {
        /// Landmark id
        id: String,

        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Forget every unlocked landmark
    Reset,

    /// Replay a JSON track of location fixes through the engine
    Simulate {
        /// Track file (JSON array of {latitude, longitude, capture?})
        track: PathBuf,

        /// Write unlocks to the visited file instead of keeping them in memory
        #[arg(long)]
        persist: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();
    let verbose = cli.verbose;
    let runner = || CliRunner::new(config_path, verbose);

    match cli.command {
        Commands::Landmarks { search } => commands::landmarks::run(&runner()?, search.as_deref()),
        Commands::Nearest { lat, lon } => commands::nearest::run(&runner()?, lat, lon),
        Commands::Unlock { id, lat, lon } => commands::unlock::run(&runner()?, &id, lat, lon),
        Commands::Reset => commands::reset::run(&runner()?),
        Commands::Simulate { track, persist } => {
            commands::simulate::run(&runner()?, &track, persist)
        }
        Commands::Config { command } => commands::config::run(command, config_path),
    }
}
