//! Unlock state machine types.
//!
//! # State Machine
//!
//! ```text
//! Locked --[distance <= unlock radius]--> ProximityEligible
//! ProximityEligible --[distance > unlock radius]--> Locked
//! Locked | ProximityEligible --[capture confirmed]--> Unlocked (terminal)
//! ```
//!
//! Only `Unlocked` is persisted. The other two are re-derived from the latest
//! location fix every time they are read.

use std::fmt;

/// Distance band of a landmark relative to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProximityState {
    /// Outside the notify radius.
    Far,
    /// Inside the notify radius but outside the unlock radius.
    NotifyZone,
    /// Inside the unlock radius.
    UnlockEligible,
}

/// Per-landmark unlock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnlockState {
    Locked,
    ProximityEligible,
    Unlocked,
}

impl UnlockState {
    /// Human-readable description for logging/UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnlockState::Locked => "Locked",
            UnlockState::ProximityEligible => "Eligible",
            UnlockState::Unlocked => "Unlocked",
        }
    }
}

impl fmt::Display for UnlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an unlock attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IneligibleReason {
    /// No location fix (permission denied or not acquired yet).
    LocationUnavailable,
    /// The user is outside the unlock radius.
    TooFar { distance_m: f64, required_m: f64 },
    /// The landmark is already unlocked.
    AlreadyUnlocked,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::LocationUnavailable => write!(f, "location unavailable"),
            IneligibleReason::TooFar {
                distance_m,
                required_m,
            } => write!(
                f,
                "too far: {:.0} m away, must be within {:.0} m",
                distance_m, required_m
            ),
            IneligibleReason::AlreadyUnlocked => write!(f, "already unlocked"),
        }
    }
}

/// Result of checking whether a landmark can be unlocked right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnlockAttempt {
    /// The capture action may proceed.
    Eligible { distance_m: f64 },
    /// The capture action must not proceed.
    Ineligible(IneligibleReason),
}

impl UnlockAttempt {
    pub fn is_eligible(&self) -> bool {
        matches!(self, UnlockAttempt::Eligible { .. })
    }
}

/// Result of confirming an unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The landmark transitioned to unlocked.
    Unlocked,
    /// The landmark was already unlocked; nothing changed.
    AlreadyUnlocked,
}
