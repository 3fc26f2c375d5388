//! GeoUnlock - proximity and geofence-slot allocation for landmark unlocking
//!
//! Users unlock a fixed set of landmarks by physically visiting them. This
//! library keeps the nearest locked landmarks inside the platform's limited
//! number of monitored regions, notifies the user when they come close, and
//! decides when a landmark may be unlocked.
//!
//! # Modules
//!
//! - [`geo`]: coordinates, great-circle distance and bearing
//! - [`landmark`]: landmark records and the registry with embedded fallback
//! - [`geofence`]: capacity-bounded region allocation and the monitor port
//! - [`proximity`]: distance bands and the unlock state machine
//! - [`ports`]: notification and visited-set persistence
//! - [`engine`]: the serialized event-driven engine and its daemon
//! - [`app`]: bootstrap and lifecycle
//! - [`config`]: engine tunables and the INI config file
//! - [`logging`]: tracing subscriber setup

pub mod app;
pub mod config;
pub mod engine;
pub mod geo;
pub mod geofence;
pub mod landmark;
pub mod logging;
pub mod ports;
pub mod proximity;

pub use engine::{EngineError, EngineEvent, EngineHandle, GeofenceEngine};
pub use geo::Coordinate;
pub use landmark::{Landmark, LandmarkRegistry};
