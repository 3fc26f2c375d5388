//! Event-driven engine that ties allocation, proximity and the ports together.
//!
//! [`GeofenceEngine`] holds the state and implements every operation
//! synchronously. [`EngineDaemon`] runs it on a single tokio task behind an
//! [`EngineHandle`], which gives the serialized processing order the rest of
//! the crate relies on:
//!
//! - one input is processed at a time, so recomputations never overlap
//! - a fix queued after a visited-set change sees the new set
//! - a backlog of fixes collapses to the newest one

mod controller;
mod daemon;
mod error;
mod events;

pub use controller::{EnginePorts, GeofenceEngine};
pub use daemon::{
    EngineCommand, EngineDaemon, EngineDaemonConfig, EngineHandle,
    DEFAULT_COMMAND_CHANNEL_CAPACITY,
};
pub use error::EngineError;
pub use events::{EngineEvent, EngineSnapshot, DEFAULT_EVENT_CHANNEL_CAPACITY};
