//! Platform region-monitoring port and an in-memory implementation.
//!
//! # Contract
//!
//! - `start` of an already-monitored region replaces it and succeeds
//! - `stop` of an unknown region succeeds
//! - `active_regions` reports what the platform is monitoring right now,
//!   including regions left over from an earlier process
//!
//! Entry events flow the other way: the platform adapter forwards them into
//! the engine's event channel (see [`crate::engine::EngineHandle`]).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use thiserror::Error;

use super::MonitoredRegion;
use crate::geo::Coordinate;

/// Errors reported by a region monitor.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MonitorError {
    /// Region monitoring is not supported or not authorized.
    #[error("Region monitoring is unavailable")]
    Unavailable,

    /// The platform refused another region.
    #[error("Region capacity exceeded (max {capacity})")]
    CapacityExceeded { capacity: usize },

    /// Any other platform failure.
    #[error("Platform error: {0}")]
    Platform(String),
}

/// Abstraction over platform geofencing.
///
/// Implementations use interior mutability; the engine serializes all calls.
pub trait RegionMonitorPort: Send + Sync {
    /// Whether circular-region monitoring is usable on this device.
    fn is_available(&self) -> bool;

    /// Begin monitoring a region.
    fn start(&self, region: &MonitoredRegion) -> Result<(), MonitorError>;

    /// Stop monitoring the region for a landmark.
    fn stop(&self, landmark_id: &str) -> Result<(), MonitorError>;

    /// Regions currently being monitored.
    fn active_regions(&self) -> Vec<MonitoredRegion>;
}

/// In-memory region monitor with a hard capacity.
///
/// Serves as the reference implementation for simulations and as a test
/// double: it counts start/stop calls and can be switched unavailable.
#[derive(Debug)]
pub struct InMemoryRegionMonitor {
    capacity: usize,
    available: AtomicBool,
    regions: Mutex<BTreeMap<String, MonitoredRegion>>,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl InMemoryRegionMonitor {
    /// Create an available monitor that accepts at most `capacity` regions.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            available: AtomicBool::new(true),
            regions: Mutex::new(BTreeMap::new()),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        }
    }

    /// Create a monitor that reports monitoring as unsupported.
    pub fn unavailable() -> Self {
        let monitor = Self::new(0);
        monitor.set_available(false);
        monitor
    }

    /// Toggle availability (e.g. permission revoked).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Maximum regions accepted.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of `start` calls since creation or the last counter reset.
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    /// Number of `stop` calls since creation or the last counter reset.
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// Zero the call counters.
    pub fn reset_counters(&self) {
        self.start_calls.store(0, Ordering::SeqCst);
        self.stop_calls.store(0, Ordering::SeqCst);
    }

    /// Ids of monitored regions, sorted.
    pub fn active_ids(&self) -> Vec<String> {
        self.regions.lock().keys().cloned().collect()
    }

    /// Ids of monitored regions whose circle contains `point`, sorted.
    ///
    /// Used to synthesize entry events when replaying a recorded walk.
    pub fn regions_containing(&self, point: Coordinate) -> Vec<String> {
        self.regions
            .lock()
            .values()
            .filter(|r| r.contains(point))
            .map(|r| r.landmark_id.clone())
            .collect()
    }
}

impl RegionMonitorPort for InMemoryRegionMonitor {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn start(&self, region: &MonitoredRegion) -> Result<(), MonitorError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);

        if !self.is_available() {
            return Err(MonitorError::Unavailable);
        }

        let mut regions = self.regions.lock();
        if !regions.contains_key(&region.landmark_id) && regions.len() >= self.capacity {
            return Err(MonitorError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        regions.insert(region.landmark_id.clone(), region.clone().activated());
        Ok(())
    }

    fn stop(&self, landmark_id: &str) -> Result<(), MonitorError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.regions.lock().remove(landmark_id);
        Ok(())
    }

    fn active_regions(&self) -> Vec<MonitoredRegion> {
        self.regions.lock().values().cloned().collect()
    }
}
