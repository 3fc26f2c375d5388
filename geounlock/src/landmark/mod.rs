//! Landmark data: records, the embedded fallback set, and the registry.
//!
//! The registry is owned by the surrounding app and consumed read-only by the
//! engine. It is loaded from a JSON array file; a missing or corrupt file
//! falls back to the embedded set rather than failing.

mod defaults;
mod model;
mod registry;

pub use defaults::{embedded_landmarks, EMBEDDED_LANDMARK_COUNT};
pub use model::{Landmark, LandmarkStatus};
pub use registry::{LandmarkRegistry, RegistryError, RegistrySource};
