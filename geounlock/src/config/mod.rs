//! Engine tunables and the INI configuration file.

mod engine;
mod file;

pub use engine::{
    EngineConfig, EngineConfigError, DEFAULT_MAX_REGIONS, DEFAULT_NEARBY_RADIUS_M,
    DEFAULT_NOTIFY_COOLDOWN_SECS, DEFAULT_NOTIFY_RADIUS_M, DEFAULT_RECOMPUTE_DISTANCE_M,
    DEFAULT_UNLOCK_RADIUS_M,
};
pub use file::{
    config_directory, config_file_path, data_directory, ConfigError, ConfigFile, DataSettings,
    APP_DIR_NAME, CONFIG_FILE_NAME, VISITED_FILE_NAME,
};
