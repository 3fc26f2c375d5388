//! Proximity classification and the per-landmark unlock state machine.
//!
//! Proximity is transient: it is derived from the latest location fix and
//! never stored. The only durable transition is to `Unlocked`, which happens
//! through an explicit capture confirmation, never from proximity alone.

mod classifier;
mod state;

pub use classifier::{NearbyLandmark, NearestLandmark, ProximityClassifier};
pub use state::{IneligibleReason, ProximityState, UnlockAttempt, UnlockOutcome, UnlockState};
