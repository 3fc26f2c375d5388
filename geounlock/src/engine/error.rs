//! Engine error types.

use thiserror::Error;

/// Errors returned by engine operations.
///
/// Most runtime failures (monitor, notifier, persistence) are logged and
/// absorbed by the engine; only caller mistakes and a stopped daemon surface
/// here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The landmark id is not in the registry.
    #[error("Unknown landmark: {0}")]
    UnknownLandmark(String),

    /// The engine daemon is no longer running.
    #[error("Engine daemon has stopped")]
    DaemonStopped,
}
