//! The geofence engine: state owner for location, visited set and regions.
//!
//! `GeofenceEngine` is a plain synchronous state machine. It never spawns or
//! locks; the [`EngineDaemon`](super::EngineDaemon) owns it on a single task
//! and feeds it one event at a time, which is what keeps recomputations from
//! overlapping.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{EngineError, EngineEvent, EngineSnapshot, DEFAULT_EVENT_CHANNEL_CAPACITY};
use crate::config::EngineConfig;
use crate::geo::{distance_meters, Coordinate};
use crate::geofence::{AllocationMode, AllocationReport, GeofenceAllocator, RegionMonitorPort};
use crate::landmark::LandmarkRegistry;
use crate::ports::{NotificationPort, NotificationRequest, PersistencePort};
use crate::proximity::{
    NearbyLandmark, NearestLandmark, ProximityClassifier, ProximityState, UnlockAttempt,
    UnlockOutcome, UnlockState,
};

/// Outbound adapters the engine talks to.
#[derive(Clone)]
pub struct EnginePorts {
    pub monitor: Arc<dyn RegionMonitorPort>,
    pub notifier: Arc<dyn NotificationPort>,
    pub persistence: Arc<dyn PersistencePort>,
}

impl EnginePorts {
    pub fn new(
        monitor: Arc<dyn RegionMonitorPort>,
        notifier: Arc<dyn NotificationPort>,
        persistence: Arc<dyn PersistencePort>,
    ) -> Self {
        Self {
            monitor,
            notifier,
            persistence,
        }
    }
}

/// Proximity and geofence-slot engine.
pub struct GeofenceEngine {
    config: EngineConfig,
    registry: LandmarkRegistry,
    visited: HashSet<String>,
    /// False while the stored visited record could not be read. The next
    /// write reloads and merges it first so saved unlocks are never lost.
    visited_synced: bool,
    ports: EnginePorts,
    allocator: GeofenceAllocator,
    classifier: ProximityClassifier,

    /// Latest location fix.
    location: Option<Coordinate>,
    /// Location used by the last recomputation.
    allocated_at: Option<Coordinate>,
    /// Locked landmarks inside the unlock radius at the latest fix.
    eligible: BTreeSet<String>,
    /// When each landmark last produced a proximity notification.
    last_notified: HashMap<String, Instant>,

    events: broadcast::Sender<EngineEvent>,
}

impl GeofenceEngine {
    /// Create an engine. No regions are monitored until the first refresh.
    pub fn new(
        config: EngineConfig,
        registry: LandmarkRegistry,
        visited: HashSet<String>,
        ports: EnginePorts,
    ) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);
        Self {
            allocator: GeofenceAllocator::from_config(&config),
            classifier: ProximityClassifier::from_config(&config),
            config,
            registry,
            visited,
            visited_synced: true,
            ports,
            location: None,
            allocated_at: None,
            eligible: BTreeSet::new(),
            last_notified: HashMap::new(),
            events,
        }
    }

    /// Mark the visited set as not loaded from persistence.
    ///
    /// Used when the startup load failed. Before the next save the stored
    /// record is read again and merged in; while it stays unreadable, saves
    /// are skipped instead of overwriting it.
    pub fn with_unsynced_visited(mut self) -> Self {
        self.visited_synced = false;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &LandmarkRegistry {
        &self.registry
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn location(&self) -> Option<Coordinate> {
        self.location
    }

    pub fn mode(&self) -> AllocationMode {
        self.allocator.mode()
    }

    /// Subscribe to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<EngineEvent> {
        self.events.clone()
    }

    /// Recompute the monitored set from the current location and visited set.
    pub fn refresh_geofences(&mut self) -> AllocationReport {
        let previous_mode = self.allocator.mode();
        let report = self.allocator.recompute(
            self.ports.monitor.as_ref(),
            self.registry.landmarks(),
            &self.visited,
            self.location,
        );
        // No anchor after a degraded pass: the first fix after recovery reallocates
        self.allocated_at = match report.mode {
            AllocationMode::Monitoring => self.location,
            AllocationMode::Degraded => None,
        };

        match report.mode {
            AllocationMode::Degraded if previous_mode != AllocationMode::Degraded => {
                self.publish(EngineEvent::MonitoringDegraded);
            }
            AllocationMode::Monitoring if !report.is_noop() => {
                self.publish(EngineEvent::geofences_changed(&report));
            }
            _ => {}
        }
        report
    }

    /// Recompute against a new landmark list and an externally loaded
    /// visited set.
    ///
    /// The visited set is merged into the in-memory one, never replacing it.
    /// Eligibility and cool-down state for landmarks that no longer exist is
    /// dropped. `location`, when given, becomes the latest fix.
    pub fn refresh_with(
        &mut self,
        location: Option<Coordinate>,
        registry: LandmarkRegistry,
        visited: HashSet<String>,
    ) -> AllocationReport {
        info!(
            landmarks = registry.len(),
            visited = visited.len(),
            "Replacing landmarks and visited set"
        );
        self.registry = registry;

        let unsaved = self.visited.difference(&visited).count();
        self.visited.extend(visited);
        self.visited_synced = true;
        if unsaved > 0 {
            self.persist_visited();
        }

        let registry = &self.registry;
        let visited = &self.visited;
        self.eligible
            .retain(|id| registry.contains(id) && !visited.contains(id));
        self.last_notified
            .retain(|id, _| registry.contains(id) && !visited.contains(id));

        if location.is_some() {
            self.location = location;
        }
        if let Some(at) = self.location {
            self.update_eligibility(at);
        }
        self.refresh_geofences()
    }

    /// Record a location fix.
    ///
    /// Unlock eligibility is re-evaluated on every fix. Regions are only
    /// recomputed once the user has moved at least `recompute_distance_m`
    /// since the last recomputation; the report is returned when they were.
    pub fn update_location(&mut self, fix: Coordinate) -> Option<AllocationReport> {
        self.location = Some(fix);
        self.update_eligibility(fix);

        if let Some(previous) = self.allocated_at {
            let moved = distance_meters(previous, fix);
            if moved < self.config.recompute_distance_m {
                debug!(moved_m = moved, "Location change below recompute threshold");
                return None;
            }
        }
        Some(self.refresh_geofences())
    }

    /// Handle a platform "entered region" event.
    ///
    /// Returns true if a notification was requested. Unlocked landmarks and
    /// re-entries inside the cool-down window are ignored.
    pub fn handle_region_enter(&mut self, landmark_id: &str) -> bool {
        let Some(landmark) = self.registry.get(landmark_id) else {
            warn!(landmark_id = %landmark_id, "Entry event for unknown landmark");
            return false;
        };
        if self.visited.contains(landmark_id) {
            debug!(landmark_id = %landmark_id, "Entry event for unlocked landmark ignored");
            return false;
        }

        let now = Instant::now();
        if let Some(last) = self.last_notified.get(landmark_id) {
            if now.duration_since(*last) < self.config.notify_cooldown() {
                debug!(landmark_id = %landmark_id, "Re-entry inside cool-down, suppressed");
                return false;
            }
        }
        self.last_notified.insert(landmark_id.to_string(), now);

        let request = NotificationRequest::proximity(&landmark.id, &landmark.name);
        if let Err(e) = self.ports.notifier.notify(&request) {
            warn!(landmark_id = %landmark_id, error = %e, "Failed to deliver notification");
        }

        info!(landmark_id = %landmark_id, "Came into proximity");
        let event = EngineEvent::CameIntoProximity {
            landmark_id: landmark.id.clone(),
            name: landmark.name.clone(),
        };
        self.publish(event);
        true
    }

    /// Check whether `landmark_id` can be unlocked from `location`.
    pub fn attempt_unlock(
        &self,
        landmark_id: &str,
        location: Option<Coordinate>,
    ) -> Result<UnlockAttempt, EngineError> {
        let landmark = self
            .registry
            .get(landmark_id)
            .ok_or_else(|| EngineError::UnknownLandmark(landmark_id.to_string()))?;
        let attempt = self.classifier.attempt(landmark, &self.visited, location);
        debug!(landmark_id = %landmark_id, attempt = ?attempt, "Unlock attempt");
        Ok(attempt)
    }

    /// Mark a landmark unlocked after a successful capture.
    ///
    /// Idempotent. A persistence failure is logged and the in-memory state
    /// stays authoritative. The regions are recomputed immediately so the
    /// unlocked landmark releases its slot.
    pub fn confirm_unlock(&mut self, landmark_id: &str) -> Result<UnlockOutcome, EngineError> {
        if !self.registry.contains(landmark_id) {
            return Err(EngineError::UnknownLandmark(landmark_id.to_string()));
        }
        if !self.visited.insert(landmark_id.to_string()) {
            debug!(landmark_id = %landmark_id, "Landmark already unlocked");
            return Ok(UnlockOutcome::AlreadyUnlocked);
        }

        self.persist_visited();
        self.eligible.remove(landmark_id);
        self.last_notified.remove(landmark_id);

        info!(landmark_id = %landmark_id, visited = self.visited.len(), "Landmark unlocked");
        self.publish(EngineEvent::Unlocked {
            landmark_id: landmark_id.to_string(),
        });

        self.refresh_geofences();
        Ok(UnlockOutcome::Unlocked)
    }

    /// Clear the visited set, persist it and recompute.
    pub fn reset_visited(&mut self) {
        let cleared = self.visited.len();
        self.visited.clear();
        // An explicit reset is the one write allowed to drop stored entries
        self.visited_synced = true;
        self.persist_visited();
        self.eligible.clear();
        self.last_notified.clear();

        info!(cleared, "Visited set reset");
        self.publish(EngineEvent::VisitedReset);

        self.refresh_geofences();
        if let Some(at) = self.location {
            self.update_eligibility(at);
        }
    }

    /// Stop every monitored region. Idempotent.
    ///
    /// The next location fix or refresh allocates again.
    pub fn stop_all_monitoring(&mut self) -> AllocationReport {
        let report = self.allocator.stop_all(self.ports.monitor.as_ref());
        self.allocated_at = None;
        if !report.stopped.is_empty() {
            self.publish(EngineEvent::geofences_changed(&report));
        }
        report
    }

    /// Unlock state of a landmark at the latest fix.
    pub fn unlock_state(&self, landmark_id: &str) -> Result<UnlockState, EngineError> {
        let landmark = self
            .registry
            .get(landmark_id)
            .ok_or_else(|| EngineError::UnknownLandmark(landmark_id.to_string()))?;
        Ok(self
            .classifier
            .unlock_state(landmark, &self.visited, self.location))
    }

    /// Nearest locked landmark to the latest fix.
    pub fn nearest(&self) -> Option<NearestLandmark> {
        let at = self.location?;
        self.classifier
            .nearest(self.registry.landmarks(), &self.visited, at)
    }

    /// Landmarks within the nearby radius of the latest fix.
    pub fn nearby(&self) -> Vec<NearbyLandmark> {
        match self.location {
            Some(at) => self.classifier.nearby(self.registry.landmarks(), at),
            None => Vec::new(),
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let mut visited: Vec<String> = self.visited.iter().cloned().collect();
        visited.sort();
        EngineSnapshot {
            location: self.location,
            mode: self.allocator.mode(),
            active_regions: self
                .allocator
                .active()
                .map(|r| r.landmark_id.clone())
                .collect(),
            visited,
            eligible: self.eligible.iter().cloned().collect(),
            landmark_count: self.registry.len(),
        }
    }

    /// Re-derive the eligible set and announce landmarks that just entered it.
    fn update_eligibility(&mut self, at: Coordinate) {
        let mut current = BTreeSet::new();
        let mut entered = Vec::new();

        for landmark in self.registry.iter() {
            if self.visited.contains(&landmark.id) {
                continue;
            }
            let distance_m = distance_meters(at, landmark.coordinate());
            if self.classifier.classify(distance_m) != ProximityState::UnlockEligible {
                continue;
            }
            if !self.eligible.contains(&landmark.id) {
                entered.push((landmark.id.clone(), distance_m));
            }
            current.insert(landmark.id.clone());
        }
        self.eligible = current;

        for (landmark_id, distance_m) in entered {
            info!(landmark_id = %landmark_id, distance_m, "Close enough to unlock");
            self.publish(EngineEvent::UnlockEligible {
                landmark_id,
                distance_m,
            });
        }
    }

    fn persist_visited(&mut self) {
        if !self.visited_synced {
            match self.ports.persistence.load_visited() {
                Ok(stored) => {
                    info!(stored = stored.len(), "Visited record readable again, merging");
                    self.visited.extend(stored);
                    self.visited_synced = true;
                    let visited = &self.visited;
                    self.eligible.retain(|id| !visited.contains(id));
                }
                Err(e) => {
                    warn!(error = %e, "Visited record still unreadable, not overwriting it");
                    return;
                }
            }
        }
        if let Err(e) = self.ports.persistence.save_visited(&self.visited) {
            warn!(error = %e, "Failed to persist visited set, keeping in-memory state");
        }
    }

    fn publish(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination;
    use crate::geofence::InMemoryRegionMonitor;
    use crate::landmark::Landmark;
    use crate::ports::{MemoryPersistence, RecordingNotifier};
    use crate::proximity::IneligibleReason;

    struct Fixture {
        engine: GeofenceEngine,
        monitor: Arc<InMemoryRegionMonitor>,
        notifier: Arc<RecordingNotifier>,
        persistence: Arc<MemoryPersistence>,
    }

    fn origin() -> Coordinate {
        Coordinate::new(40.8359, 14.2488).unwrap()
    }

    /// Landmarks `lm00`, `lm01`, ... spaced 100 m apart due north of origin.
    fn landmarks(count: usize) -> Vec<Landmark> {
        (0..count)
            .map(|i| {
                let id = format!("lm{:02}", i);
                Landmark::new(&id, &id, destination(origin(), 0.0, 100.0 * i as f64))
            })
            .collect()
    }

    fn fixture_with(config: EngineConfig, count: usize, monitor: InMemoryRegionMonitor) -> Fixture {
        let monitor = Arc::new(monitor);
        let notifier = Arc::new(RecordingNotifier::new());
        let persistence = Arc::new(MemoryPersistence::new());
        let registry = LandmarkRegistry::new(landmarks(count)).unwrap();
        let ports = EnginePorts::new(monitor.clone(), notifier.clone(), persistence.clone());
        Fixture {
            engine: GeofenceEngine::new(config, registry, HashSet::new(), ports),
            monitor,
            notifier,
            persistence,
        }
    }

    fn fixture(count: usize) -> Fixture {
        fixture_with(EngineConfig::default(), count, InMemoryRegionMonitor::new(20))
    }

    fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[test]
    fn test_first_fix_allocates_nearest() {
        let mut f = fixture(25);
        let report = f.engine.update_location(origin()).unwrap();

        assert_eq!(report.active_count, 20);
        assert_eq!(f.monitor.active_ids().len(), 20);
        assert!(f.monitor.active_ids().contains(&"lm19".to_string()));
        assert!(!f.monitor.active_ids().contains(&"lm20".to_string()));
    }

    #[test]
    fn test_small_move_skips_recompute() {
        let mut f = fixture(5);
        f.engine.update_location(origin());
        f.monitor.reset_counters();

        let nudged = destination(origin(), 90.0, 2.0);
        assert!(f.engine.update_location(nudged).is_none());
        assert_eq!(f.monitor.start_calls(), 0);
        assert_eq!(f.engine.location(), Some(nudged));
    }

    #[test]
    fn test_refresh_twice_is_noop() {
        let mut f = fixture(25);
        f.engine.update_location(origin());
        f.monitor.reset_counters();

        let report = f.engine.refresh_geofences();
        assert!(report.is_noop());
        assert_eq!(f.monitor.start_calls(), 0);
        assert_eq!(f.monitor.stop_calls(), 0);
    }

    #[test]
    fn test_region_enter_notifies_once_within_cooldown() {
        let mut f = fixture(3);
        let mut rx = f.engine.subscribe();

        assert!(f.engine.handle_region_enter("lm01"));
        assert!(!f.engine.handle_region_enter("lm01"));

        assert_eq!(f.notifier.sent().len(), 1);
        assert_eq!(f.notifier.sent()[0].title, "You're near lm01");
        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![EngineEvent::CameIntoProximity {
                landmark_id: "lm01".to_string(),
                name: "lm01".to_string(),
            }]
        );
    }

    #[test]
    fn test_region_enter_without_cooldown_notifies_again() {
        let config = EngineConfig::default().with_notify_cooldown_secs(0);
        let mut f = fixture_with(config, 3, InMemoryRegionMonitor::new(20));

        assert!(f.engine.handle_region_enter("lm01"));
        assert!(f.engine.handle_region_enter("lm01"));
        assert_eq!(f.notifier.sent().len(), 2);
    }

    #[test]
    fn test_region_enter_ignored_for_unlocked_or_unknown() {
        let mut f = fixture(3);
        f.engine.confirm_unlock("lm00").unwrap();

        assert!(!f.engine.handle_region_enter("lm00"));
        assert!(!f.engine.handle_region_enter("nope"));
        assert!(f.notifier.sent().is_empty());
    }

    #[test]
    fn test_notification_failure_still_broadcasts() {
        let mut f = fixture(3);
        let mut rx = f.engine.subscribe();
        f.notifier.set_failing(true);

        assert!(f.engine.handle_region_enter("lm02"));
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn test_confirm_unlock_persists_and_releases_slot() {
        let mut f = fixture(5);
        f.engine.update_location(origin());
        assert!(f.monitor.active_ids().contains(&"lm02".to_string()));
        let mut rx = f.engine.subscribe();

        let outcome = f.engine.confirm_unlock("lm02").unwrap();

        assert_eq!(outcome, UnlockOutcome::Unlocked);
        assert!(f.persistence.stored().contains("lm02"));
        assert!(!f.monitor.active_ids().contains(&"lm02".to_string()));
        let events = drain(&mut rx);
        assert_eq!(
            events[0],
            EngineEvent::Unlocked {
                landmark_id: "lm02".to_string()
            }
        );
        assert!(matches!(events[1], EngineEvent::GeofencesChanged { .. }));
    }

    #[test]
    fn test_confirm_unlock_is_idempotent() {
        let mut f = fixture(5);
        f.engine.confirm_unlock("lm01").unwrap();
        f.monitor.reset_counters();

        let outcome = f.engine.confirm_unlock("lm01").unwrap();

        assert_eq!(outcome, UnlockOutcome::AlreadyUnlocked);
        assert_eq!(f.persistence.save_count(), 1);
        assert_eq!(f.monitor.start_calls() + f.monitor.stop_calls(), 0);
        assert_eq!(f.engine.visited().len(), 1);
    }

    #[test]
    fn test_confirm_unknown_landmark() {
        let mut f = fixture(2);
        assert_eq!(
            f.engine.confirm_unlock("ghost"),
            Err(EngineError::UnknownLandmark("ghost".to_string()))
        );
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let mut f = fixture(3);
        f.persistence.set_failing(true);

        assert_eq!(f.engine.confirm_unlock("lm00"), Ok(UnlockOutcome::Unlocked));
        assert!(f.engine.visited().contains("lm00"));
        assert_eq!(f.engine.unlock_state("lm00"), Ok(UnlockState::Unlocked));
    }

    #[test]
    fn test_attempt_unlock_reasons() {
        let mut f = fixture(3);
        let at_lm01 = destination(origin(), 0.0, 100.0);

        assert_eq!(
            f.engine.attempt_unlock("lm01", None),
            Ok(UnlockAttempt::Ineligible(IneligibleReason::LocationUnavailable))
        );
        assert!(f
            .engine
            .attempt_unlock("lm01", Some(at_lm01))
            .unwrap()
            .is_eligible());
        assert!(matches!(
            f.engine.attempt_unlock("lm02", Some(at_lm01)),
            Ok(UnlockAttempt::Ineligible(IneligibleReason::TooFar { .. }))
        ));

        f.engine.confirm_unlock("lm01").unwrap();
        assert_eq!(
            f.engine.attempt_unlock("lm01", Some(at_lm01)),
            Ok(UnlockAttempt::Ineligible(IneligibleReason::AlreadyUnlocked))
        );
        assert!(f.engine.attempt_unlock("ghost", Some(at_lm01)).is_err());
    }

    #[test]
    fn test_unlock_eligible_fires_once_and_rearms() {
        let mut f = fixture(3);
        let mut rx = f.engine.subscribe();
        let near_lm01 = destination(origin(), 0.0, 90.0);

        f.engine.update_location(near_lm01);
        f.engine.update_location(destination(near_lm01, 90.0, 1.0));
        let eligible: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::UnlockEligible { .. }))
            .collect();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].landmark_id(), Some("lm01"));

        // Leave (50 m from both lm00 and lm01), then come back
        f.engine.update_location(destination(origin(), 0.0, 50.0));
        assert!(f.engine.snapshot().eligible.is_empty());
        f.engine.update_location(near_lm01);
        let again = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::UnlockEligible { .. }))
            .count();
        assert_eq!(again, 1);
    }

    #[test]
    fn test_reset_visited_restores_regions() {
        let mut f = fixture(3);
        f.engine.update_location(origin());
        f.engine.confirm_unlock("lm00").unwrap();
        f.engine.confirm_unlock("lm01").unwrap();
        assert_eq!(f.monitor.active_ids(), vec!["lm02"]);
        let mut rx = f.engine.subscribe();

        f.engine.reset_visited();

        assert!(f.engine.visited().is_empty());
        assert!(f.persistence.stored().is_empty());
        assert_eq!(f.monitor.active_ids().len(), 3);
        let events = drain(&mut rx);
        assert_eq!(events[0], EngineEvent::VisitedReset);
        // Standing on lm00 again makes it eligible
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::UnlockEligible { .. })
                && e.landmark_id() == Some("lm00")));
    }

    #[test]
    fn test_degraded_monitoring_still_allows_unlock() {
        let mut f = fixture_with(EngineConfig::default(), 3, InMemoryRegionMonitor::unavailable());
        let mut rx = f.engine.subscribe();

        let report = f.engine.update_location(origin()).unwrap();
        assert_eq!(report.mode, AllocationMode::Degraded);
        f.engine.refresh_geofences();

        let degraded = drain(&mut rx)
            .into_iter()
            .filter(|e| *e == EngineEvent::MonitoringDegraded)
            .count();
        assert_eq!(degraded, 1);
        assert!(f
            .engine
            .attempt_unlock("lm00", Some(origin()))
            .unwrap()
            .is_eligible());
        assert_eq!(f.engine.confirm_unlock("lm00"), Ok(UnlockOutcome::Unlocked));
    }

    #[test]
    fn test_stop_all_then_fix_reallocates() {
        let mut f = fixture(4);
        f.engine.update_location(origin());

        let report = f.engine.stop_all_monitoring();
        assert_eq!(report.stopped.len(), 4);
        assert!(f.monitor.active_ids().is_empty());
        assert!(f.engine.stop_all_monitoring().stopped.is_empty());

        let report = f.engine.update_location(origin()).unwrap();
        assert_eq!(report.started.len(), 4);
    }

    #[test]
    fn test_nearest_and_nearby_need_location() {
        let mut f = fixture(10);
        assert!(f.engine.nearest().is_none());
        assert!(f.engine.nearby().is_empty());

        f.engine.update_location(destination(origin(), 0.0, 20.0));
        assert_eq!(f.engine.nearest().unwrap().landmark_id, "lm00");
        // lm00..lm05 lie within 500 m (lm05 is 480 m north)
        assert_eq!(f.engine.nearby().len(), 6);
    }

    #[test]
    fn test_unsynced_visited_merges_stored_record_before_saving() {
        let persistence = Arc::new(MemoryPersistence::with_visited(["lm00"]));
        let ports = EnginePorts::new(
            Arc::new(InMemoryRegionMonitor::new(20)),
            Arc::new(RecordingNotifier::new()),
            persistence.clone(),
        );
        let registry = LandmarkRegistry::new(landmarks(3)).unwrap();
        let mut engine =
            GeofenceEngine::new(EngineConfig::default(), registry, HashSet::new(), ports)
                .with_unsynced_visited();

        // Still unreadable: the stored record is left alone
        persistence.set_failing(true);
        engine.confirm_unlock("lm01").unwrap();
        persistence.set_failing(false);
        assert_eq!(persistence.stored(), HashSet::from(["lm00".to_string()]));
        assert_eq!(persistence.save_count(), 0);

        // Readable again: stored and in-memory unlocks are combined
        engine.confirm_unlock("lm02").unwrap();
        let expected: HashSet<String> = ["lm00", "lm01", "lm02"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(persistence.stored(), expected);
        assert_eq!(engine.visited(), &expected);
        assert_eq!(engine.unlock_state("lm00"), Ok(UnlockState::Unlocked));
    }

    #[test]
    fn test_reset_overwrites_unsynced_record() {
        let persistence = Arc::new(MemoryPersistence::with_visited(["lm00"]));
        let ports = EnginePorts::new(
            Arc::new(InMemoryRegionMonitor::new(20)),
            Arc::new(RecordingNotifier::new()),
            persistence.clone(),
        );
        let registry = LandmarkRegistry::new(landmarks(3)).unwrap();
        let mut engine =
            GeofenceEngine::new(EngineConfig::default(), registry, HashSet::new(), ports)
                .with_unsynced_visited();

        engine.reset_visited();

        assert!(persistence.stored().is_empty());
        assert!(engine.visited().is_empty());
    }

    #[test]
    fn test_refresh_with_new_landmarks_stops_removed_region() {
        let mut f = fixture(4);
        f.engine.update_location(origin());
        f.engine.handle_region_enter("lm03");
        assert!(f.monitor.active_ids().contains(&"lm03".to_string()));

        let report = f.engine.refresh_with(
            None,
            LandmarkRegistry::new(landmarks(3)).unwrap(),
            HashSet::new(),
        );

        assert_eq!(report.stopped, vec!["lm03".to_string()]);
        assert!(report.started.is_empty());
        assert_eq!(f.monitor.active_ids(), vec!["lm00", "lm01", "lm02"]);
        assert_eq!(f.engine.snapshot().landmark_count, 3);
        assert!(!f.engine.handle_region_enter("lm03"));
    }

    #[test]
    fn test_refresh_with_merges_visited_and_moves() {
        let mut f = fixture(4);
        f.engine.update_location(origin());
        f.engine.confirm_unlock("lm00").unwrap();
        let at_lm02 = destination(origin(), 0.0, 200.0);

        f.engine.refresh_with(
            Some(at_lm02),
            LandmarkRegistry::new(landmarks(4)).unwrap(),
            HashSet::from(["lm01".to_string()]),
        );

        let snapshot = f.engine.snapshot();
        assert_eq!(snapshot.visited, vec!["lm00", "lm01"]);
        assert_eq!(snapshot.location, Some(at_lm02));
        assert_eq!(snapshot.eligible, vec!["lm02"]);
        assert_eq!(f.monitor.active_ids(), vec!["lm02", "lm03"]);
        // lm00 was only in memory, so the merged set was written back
        assert!(f.persistence.stored().contains("lm00"));
    }

    #[test]
    fn test_first_fix_after_recovery_reallocates() {
        let mut f = fixture(3);
        f.monitor.set_available(false);
        let report = f.engine.update_location(origin()).unwrap();
        assert_eq!(report.mode, AllocationMode::Degraded);

        f.monitor.set_available(true);
        let nudged = destination(origin(), 90.0, 1.0);
        let report = f.engine.update_location(nudged).unwrap();

        assert_eq!(report.mode, AllocationMode::Monitoring);
        assert_eq!(report.started.len(), 3);
        assert_eq!(f.monitor.active_ids().len(), 3);
    }
}
