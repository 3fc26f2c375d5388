//! Application configuration for GeoUnlockApp.
//!
//! `AppConfig` combines the engine tunables with the data file locations and
//! the daemon settings needed to bootstrap the application.

use std::path::PathBuf;

use crate::config::{ConfigFile, DataSettings, EngineConfig};
use crate::engine::EngineDaemonConfig;
use crate::ports::JsonFilePersistence;

/// Top-level configuration passed to `GeoUnlockApp::start()`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Engine radii, capacity and thresholds.
    pub engine: EngineConfig,

    /// Landmark JSON file. `None` uses the embedded set.
    pub landmarks_file: Option<PathBuf>,

    /// Visited-state file.
    pub visited_file: PathBuf,

    /// Engine daemon settings.
    pub daemon: EngineDaemonConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data = DataSettings::default();
        Self {
            engine: EngineConfig::default(),
            landmarks_file: data.landmarks_file,
            visited_file: data.visited_file,
            daemon: EngineDaemonConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create application config from the configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            engine: config.engine.clone(),
            landmarks_file: config.data.landmarks_file.clone(),
            visited_file: config.data.visited_file.clone(),
            daemon: EngineDaemonConfig::default(),
        }
    }

    /// Set the landmark data file.
    pub fn with_landmarks_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.landmarks_file = Some(path.into());
        self
    }

    /// Set the visited-state file.
    pub fn with_visited_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.visited_file = path.into();
        self
    }

    /// File-backed persistence for the configured visited file.
    pub fn file_persistence(&self) -> JsonFilePersistence {
        JsonFilePersistence::new(&self.visited_file)
    }
}
