//! Typed engine events and state snapshots.

use crate::geo::Coordinate;
use crate::geofence::{AllocationMode, AllocationReport};

/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events broadcast to UI subscribers.
///
/// Delivery is best-effort: a lagging subscriber loses the oldest events.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The user entered the notify region of a locked landmark.
    CameIntoProximity { landmark_id: String, name: String },

    /// A locked landmark came inside the unlock radius.
    UnlockEligible { landmark_id: String, distance_m: f64 },

    /// A landmark was unlocked.
    Unlocked { landmark_id: String },

    /// The visited set was cleared.
    VisitedReset,

    /// The monitored region set changed.
    GeofencesChanged {
        started: Vec<String>,
        stopped: Vec<String>,
        active_count: usize,
    },

    /// Region monitoring became unavailable.
    MonitoringDegraded,
}

impl EngineEvent {
    pub(crate) fn geofences_changed(report: &AllocationReport) -> Self {
        EngineEvent::GeofencesChanged {
            started: report.started.clone(),
            stopped: report.stopped.clone(),
            active_count: report.active_count,
        }
    }

    /// Landmark the event is about, if any.
    pub fn landmark_id(&self) -> Option<&str> {
        match self {
            EngineEvent::CameIntoProximity { landmark_id, .. }
            | EngineEvent::UnlockEligible { landmark_id, .. }
            | EngineEvent::Unlocked { landmark_id } => Some(landmark_id),
            _ => None,
        }
    }
}

/// Point-in-time view of engine state.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    /// Last location fix.
    pub location: Option<Coordinate>,
    pub mode: AllocationMode,
    /// Monitored landmark ids, sorted.
    pub active_regions: Vec<String>,
    /// Unlocked landmark ids, sorted.
    pub visited: Vec<String>,
    /// Locked landmarks currently inside the unlock radius, sorted.
    pub eligible: Vec<String>,
    pub landmark_count: usize,
}
