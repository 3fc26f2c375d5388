//! CLI runner for common setup.
//!
//! Encapsulates configuration loading, logging initialization and data
//! loading to reduce duplication across command handlers.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use geounlock::config::{config_file_path, ConfigFile};
use geounlock::landmark::{LandmarkRegistry, RegistrySource};
use geounlock::logging::{default_log_dir, init_logging_full, LoggingGuard, DEFAULT_LOG_FILE};
use geounlock::ports::{JsonFilePersistence, PersistencePort};
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps logging active while the runner exists
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load the configuration and initialize logging.
    ///
    /// Logs always go to the log file. With `verbose` they are also printed
    /// to stdout at debug level.
    pub fn new(config_path: Option<&Path>, verbose: bool) -> Result<Self, CliError> {
        let path = resolve_config_path(config_path);
        let config = ConfigFile::load_from(&path)?;

        let logging_guard = init_logging_full(&default_log_dir(), DEFAULT_LOG_FILE, verbose, verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        info!(config = %path.display(), "GeoUnlock v{}", env!("CARGO_PKG_VERSION"));

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Load landmarks, falling back to the embedded set.
    pub fn registry(&self) -> LandmarkRegistry {
        match &self.config.data.landmarks_file {
            Some(path) => {
                let (registry, source) = LandmarkRegistry::load_or_embedded(path);
                if source == RegistrySource::Embedded {
                    println!(
                        "Note: could not load {}, using built-in landmarks",
                        path.display()
                    );
                }
                registry
            }
            None => LandmarkRegistry::embedded(),
        }
    }

    /// Persistence for the configured visited file.
    pub fn persistence(&self) -> JsonFilePersistence {
        JsonFilePersistence::new(&self.config.data.visited_file)
    }

    /// Load the visited set.
    ///
    /// # Errors
    ///
    /// An unreadable visited file is an error rather than an empty set, so a
    /// later save cannot overwrite unlocks that were already recorded.
    pub fn visited(&self) -> Result<HashSet<String>, CliError> {
        Ok(self.persistence().load_visited()?)
    }
}

/// Config file path: the `--config` argument or the default location.
pub fn resolve_config_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}
