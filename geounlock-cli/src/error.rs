//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::path::PathBuf;
use std::process;

use geounlock::app::AppError;
use geounlock::config::ConfigError;
use geounlock::engine::EngineError;
use geounlock::geo::CoordError;
use geounlock::ports::PersistenceError;
use geounlock::proximity::IneligibleReason;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid location: {0}")]
    Location(#[from] CoordError),

    #[error("Failed to read track file '{}': {source}", path.display())]
    TrackRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid track file '{}': {source}", path.display())]
    TrackFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Visited state error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    App(#[from] AppError),

    #[error("Failed to create Tokio runtime: {0}")]
    Runtime(std::io::Error),

    #[error("Cannot unlock '{landmark_id}': {reason}")]
    NotEligible {
        landmark_id: String,
        reason: IneligibleReason,
    },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Engine(EngineError::UnknownLandmark(_)) => {
                eprintln!();
                eprintln!("Run 'geounlock landmarks' to list known landmark ids.");
            }
            CliError::NotEligible {
                reason: IneligibleReason::TooFar { .. },
                ..
            } => {
                eprintln!();
                eprintln!("Use 'geounlock nearest --lat <LAT> --lon <LON>' for directions.");
            }
            CliError::Persistence(PersistenceError::Format(_)) => {
                eprintln!();
                eprintln!("The visited file is unreadable and was left untouched.");
                eprintln!("Fix it by hand or run 'geounlock reset' to start over.");
            }
            _ => {}
        }

        let code = match self {
            CliError::NotEligible { .. } => 2,
            _ => 1,
        };
        process::exit(code)
    }
}
