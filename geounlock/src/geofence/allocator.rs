//! Capacity-bounded geofence slot allocation.
//!
//! # Algorithm
//!
//! ```text
//! landmarks ──► drop visited ──► rank ──► take K ──► diff vs port ──► stop, then start
//!                                 │
//!                                 ├─ location known: distance asc, id asc
//!                                 └─ no fix yet:     registry order
//! ```
//!
//! Stops are issued before starts, so the platform never holds more than K
//! regions even while a recomputation is in flight. The diff is taken against
//! what the port reports, not against a cached copy, which also sweeps away
//! regions left behind by a previous process.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use super::{MonitoredRegion, RegionMonitorPort};
use crate::config::EngineConfig;
use crate::geo::{distance_meters, Coordinate};
use crate::landmark::Landmark;

/// Whether region monitoring is operating normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationMode {
    /// Regions are being monitored.
    Monitoring,
    /// The platform cannot monitor regions; the active set is empty.
    Degraded,
}

/// Outcome of one recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationReport {
    pub mode: AllocationMode,
    /// Landmark ids whose regions were started.
    pub started: Vec<String>,
    /// Landmark ids whose regions were stopped.
    pub stopped: Vec<String>,
    /// Landmark ids whose start or stop call failed.
    pub failed: Vec<String>,
    /// Regions active after the recomputation.
    pub active_count: usize,
}

impl AllocationReport {
    fn new(mode: AllocationMode) -> Self {
        Self {
            mode,
            started: Vec::new(),
            stopped: Vec::new(),
            failed: Vec::new(),
            active_count: 0,
        }
    }

    /// True if the recomputation issued no start or stop calls.
    pub fn is_noop(&self) -> bool {
        self.started.is_empty() && self.stopped.is_empty()
    }
}

/// Selects and maintains the set of monitored regions.
#[derive(Debug)]
pub struct GeofenceAllocator {
    /// Capacity K.
    capacity: usize,
    /// Radius of each region in meters.
    radius_m: f64,
    /// Committed active set, keyed by landmark id.
    active: BTreeMap<String, MonitoredRegion>,
    /// Mode of the last recomputation.
    mode: AllocationMode,
}

impl GeofenceAllocator {
    /// Create an allocator with capacity `capacity` and region radius `radius_m`.
    pub fn new(capacity: usize, radius_m: f64) -> Self {
        Self {
            capacity,
            radius_m,
            active: BTreeMap::new(),
            mode: AllocationMode::Monitoring,
        }
    }

    /// Create an allocator from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_regions, config.notify_radius_m)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    /// Committed active regions, ordered by landmark id.
    pub fn active(&self) -> impl Iterator<Item = &MonitoredRegion> {
        self.active.values()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, landmark_id: &str) -> bool {
        self.active.contains_key(landmark_id)
    }

    /// Compute the desired region set without touching any monitor.
    ///
    /// Visited landmarks are excluded. With a location, the K nearest remain
    /// (ties broken by id ascending); without one, the first K in registry
    /// order.
    pub fn select(
        &self,
        landmarks: &[Landmark],
        visited: &HashSet<String>,
        location: Option<Coordinate>,
    ) -> Vec<MonitoredRegion> {
        let locked = landmarks.iter().filter(|l| !visited.contains(&l.id));

        let ranked: Vec<&Landmark> = match location {
            Some(at) => {
                let mut with_distance: Vec<(f64, &Landmark)> = locked
                    .map(|l| (distance_meters(at, l.coordinate()), l))
                    .collect();
                with_distance.sort_by(|(da, a), (db, b)| {
                    da.total_cmp(db).then_with(|| a.id.cmp(&b.id))
                });
                with_distance.into_iter().map(|(_, l)| l).collect()
            }
            None => locked.collect(),
        };

        ranked
            .into_iter()
            .take(self.capacity)
            .map(|l| MonitoredRegion::for_landmark(l, self.radius_m))
            .collect()
    }

    /// Recompute the active set and apply the difference to `monitor`.
    ///
    /// Regions that stay selected are not touched. When the monitor is
    /// unavailable the committed set is cleared and the report is
    /// [`AllocationMode::Degraded`]; this is not an error.
    pub fn recompute(
        &mut self,
        monitor: &dyn RegionMonitorPort,
        landmarks: &[Landmark],
        visited: &HashSet<String>,
        location: Option<Coordinate>,
    ) -> AllocationReport {
        if !monitor.is_available() {
            if self.mode != AllocationMode::Degraded {
                warn!("Region monitoring unavailable, geofencing degraded");
            }
            self.mode = AllocationMode::Degraded;
            self.active.clear();
            return AllocationReport::new(AllocationMode::Degraded);
        }

        if self.mode == AllocationMode::Degraded {
            info!("Region monitoring available again");
        }
        self.mode = AllocationMode::Monitoring;

        let desired = self.select(landmarks, visited, location);
        let current = monitor.active_regions();

        let mut report = AllocationReport::new(AllocationMode::Monitoring);

        // Stop everything that is no longer wanted (or whose geometry moved)
        let mut remaining = current.len();
        for region in &current {
            let keep = desired.iter().any(|d| d.same_geometry(region));
            if keep {
                continue;
            }
            match monitor.stop(&region.landmark_id) {
                Ok(()) => {
                    remaining = remaining.saturating_sub(1);
                    report.stopped.push(region.landmark_id.clone());
                }
                Err(e) => {
                    warn!(landmark_id = %region.landmark_id, error = %e, "Failed to stop region");
                    report.failed.push(region.landmark_id.clone());
                }
            }
        }

        for region in &desired {
            let present = current.iter().any(|c| c.same_geometry(region));
            if present {
                continue;
            }
            if remaining >= self.capacity {
                warn!(
                    landmark_id = %region.landmark_id,
                    capacity = self.capacity,
                    "No free region slot, skipping start"
                );
                report.failed.push(region.landmark_id.clone());
                continue;
            }
            match monitor.start(region) {
                Ok(()) => {
                    remaining += 1;
                    report.started.push(region.landmark_id.clone());
                }
                Err(e) => {
                    warn!(landmark_id = %region.landmark_id, error = %e, "Failed to start region");
                    report.failed.push(region.landmark_id.clone());
                }
            }
        }

        self.commit(monitor);
        report.active_count = self.active.len();

        if report.is_noop() {
            debug!(active = report.active_count, "Geofences unchanged");
        } else {
            info!(
                started = report.started.len(),
                stopped = report.stopped.len(),
                active = report.active_count,
                "Geofences updated"
            );
        }

        report
    }

    /// Stop every region the monitor reports and clear the active set.
    ///
    /// Idempotent; safe to call when nothing is monitored.
    pub fn stop_all(&mut self, monitor: &dyn RegionMonitorPort) -> AllocationReport {
        let mut report = AllocationReport::new(self.mode);
        for region in monitor.active_regions() {
            match monitor.stop(&region.landmark_id) {
                Ok(()) => report.stopped.push(region.landmark_id),
                Err(e) => {
                    warn!(landmark_id = %region.landmark_id, error = %e, "Failed to stop region");
                    report.failed.push(region.landmark_id);
                }
            }
        }
        self.active.clear();

        if !report.stopped.is_empty() {
            info!(stopped = report.stopped.len(), "Stopped all geofences");
        }
        report
    }

    /// Record what the monitor holds after a recomputation.
    fn commit(&mut self, monitor: &dyn RegionMonitorPort) {
        self.active = monitor
            .active_regions()
            .into_iter()
            .map(|r| (r.landmark_id.clone(), r.activated()))
            .collect();
    }
}
