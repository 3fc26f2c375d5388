//! Configuration file handling for `<config dir>/geounlock/config.ini`.
//!
//! A missing file yields defaults. Unknown keys are ignored; a key that is
//! present but unparsable is an error naming the section and key.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;

use super::engine::{EngineConfig, EngineConfigError};

/// Application directory name under the platform config/data dirs.
pub const APP_DIR_NAME: &str = "geounlock";

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default visited-state file name.
pub const VISITED_FILE_NAME: &str = "visited.json";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(#[source] std::io::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Values parse but are inconsistent with each other
    #[error("Invalid engine configuration: {0}")]
    Engine(#[from] EngineConfigError),
}

/// File locations for landmark data and visited state.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    /// Landmark JSON file. `None` uses the embedded set.
    pub landmarks_file: Option<PathBuf>,
    /// Visited-state JSON file.
    pub visited_file: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            landmarks_file: None,
            visited_file: data_directory().join(VISITED_FILE_NAME),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub engine: EngineConfig,
    pub data: DataSettings,
}

impl ConfigFile {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    /// Build configuration from an already parsed INI document.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("geofence")) {
            let engine = &mut config.engine;
            set_parsed(section, "geofence", "max_regions", &mut engine.max_regions)?;
            set_parsed(section, "geofence", "notify_radius_m", &mut engine.notify_radius_m)?;
            set_parsed(
                section,
                "geofence",
                "recompute_distance_m",
                &mut engine.recompute_distance_m,
            )?;
        }

        if let Some(section) = ini.section(Some("proximity")) {
            let engine = &mut config.engine;
            set_parsed(section, "proximity", "unlock_radius_m", &mut engine.unlock_radius_m)?;
            set_parsed(section, "proximity", "nearby_radius_m", &mut engine.nearby_radius_m)?;
            set_parsed(
                section,
                "proximity",
                "notify_cooldown_secs",
                &mut engine.notify_cooldown_secs,
            )?;
        }

        if let Some(section) = ini.section(Some("data")) {
            if let Some(value) = non_empty(section, "landmarks_file") {
                config.data.landmarks_file = Some(PathBuf::from(value));
            }
            if let Some(value) = non_empty(section, "visited_file") {
                config.data.visited_file = PathBuf::from(value);
            }
        }

        config.engine.validate()?;
        Ok(config)
    }

    /// Serialize to an INI document.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        let engine = &self.engine;

        ini.with_section(Some("geofence"))
            .set("max_regions", engine.max_regions.to_string())
            .set("notify_radius_m", engine.notify_radius_m.to_string())
            .set("recompute_distance_m", engine.recompute_distance_m.to_string());

        ini.with_section(Some("proximity"))
            .set("unlock_radius_m", engine.unlock_radius_m.to_string())
            .set("nearby_radius_m", engine.nearby_radius_m.to_string())
            .set("notify_cooldown_secs", engine.notify_cooldown_secs.to_string());

        let landmarks = self
            .data
            .landmarks_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        ini.with_section(Some("data"))
            .set("landmarks_file", landmarks)
            .set("visited_file", self.data.visited_file.display().to_string());

        ini
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(ConfigError::WriteError)
    }
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn set_parsed<T>(
    section: &Properties,
    section_name: &str,
    key: &str,
    target: &mut T,
) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = non_empty(section, key) else {
        return Ok(());
    };
    *target = raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        section: section_name.to_string(),
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Get the path to the config directory.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Get the path to the data directory holding visited state.
pub fn data_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Get the path to the config file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}
