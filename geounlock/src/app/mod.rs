//! Application bootstrap and lifecycle management.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        GeoUnlockApp                          │
//! │                                                              │
//! │  1. EngineConfig ──► validate, warn on non-canonical radii   │
//! │  2. LandmarkRegistry ──► file or embedded fallback           │
//! │  3. PersistencePort ──► visited set (empty on failure)       │
//! │  4. GeofenceEngine ──► initial allocation                    │
//! │  5. EngineDaemon ──► spawned; EngineHandle returned          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::GeoUnlockApp;
pub use config::AppConfig;
pub use error::AppError;
