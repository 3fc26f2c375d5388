//! Application error types.

use thiserror::Error;

use crate::config::EngineConfigError;

/// Errors that can occur during application lifecycle.
#[derive(Debug, Error)]
pub enum AppError {
    /// Engine configuration failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] EngineConfigError),

    /// The engine task panicked or was aborted.
    #[error("Engine task failed: {0}")]
    EngineTask(String),
}
