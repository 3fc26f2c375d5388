//! Application bootstrap implementation.
//!
//! `GeoUnlockApp` wires the registry, the visited set and the ports into a
//! [`GeofenceEngine`], runs it on an [`EngineDaemon`] and owns the daemon's
//! lifetime.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::engine::{EngineDaemon, EngineHandle, EnginePorts, GeofenceEngine};
use crate::geofence::RegionMonitorPort;
use crate::landmark::{LandmarkRegistry, RegistrySource};
use crate::ports::{NotificationPort, PersistencePort};

/// Running GeoUnlock application.
///
/// # Example
///
/// ```ignore
/// use geounlock::app::{AppConfig, GeoUnlockApp};
///
/// let app = GeoUnlockApp::start(config, monitor, notifier, persistence).await?;
///
/// let handle = app.handle();
/// handle.update_location(here).await?;
///
/// app.shutdown().await?;
/// ```
pub struct GeoUnlockApp {
    handle: EngineHandle,
    shutdown: CancellationToken,
    daemon: JoinHandle<GeofenceEngine>,
    registry_source: RegistrySource,
}

impl GeoUnlockApp {
    /// Start the application on the current tokio runtime.
    ///
    /// This method:
    /// 1. Validates the engine configuration and flags non-canonical radii
    /// 2. Loads landmarks, falling back to the embedded set
    /// 3. Loads the visited set. On failure it starts empty and the engine
    ///    reloads and merges the stored record before its first save
    /// 4. Allocates the initial geofences and spawns the engine daemon
    ///
    /// # Errors
    ///
    /// Returns an error if the engine configuration is invalid.
    pub async fn start(
        config: AppConfig,
        monitor: Arc<dyn RegionMonitorPort>,
        notifier: Arc<dyn NotificationPort>,
        persistence: Arc<dyn PersistencePort>,
    ) -> Result<Self, AppError> {
        info!("Starting GeoUnlock engine");

        // 1. Configuration
        config.engine.validate()?;
        config.engine.log_deviations();

        // 2. Landmarks
        let (registry, registry_source) = match &config.landmarks_file {
            Some(path) => LandmarkRegistry::load_or_embedded(path),
            None => (LandmarkRegistry::embedded(), RegistrySource::Embedded),
        };

        // 3. Visited set
        let (visited, visited_loaded) = match persistence.load_visited() {
            Ok(visited) => (visited, true),
            Err(e) => {
                warn!(error = %e, "Failed to load visited set, starting empty");
                (HashSet::new(), false)
            }
        };

        info!(
            landmarks = registry.len(),
            source = ?registry_source,
            visited = visited.len(),
            "Engine state loaded"
        );

        // 4. Engine and daemon
        let ports = EnginePorts::new(monitor, notifier, persistence);
        let mut engine = GeofenceEngine::new(config.engine.clone(), registry, visited, ports);
        if !visited_loaded {
            engine = engine.with_unsynced_visited();
        }
        engine.refresh_geofences();

        let (daemon, handle) = EngineDaemon::new(engine, config.daemon.clone());
        let shutdown = CancellationToken::new();
        let daemon = tokio::spawn(daemon.run(shutdown.clone()));

        Ok(Self {
            handle,
            shutdown,
            daemon,
            registry_source,
        })
    }

    /// Handle for issuing commands and subscribing to events.
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Where the landmark set came from.
    pub fn registry_source(&self) -> RegistrySource {
        self.registry_source
    }

    /// Stop the daemon, releasing every monitored region.
    pub async fn shutdown(self) -> Result<(), AppError> {
        info!("Shutting down GeoUnlock engine");
        self.shutdown.cancel();
        self.daemon
            .await
            .map_err(|e| AppError::EngineTask(e.to_string()))?;
        info!("GeoUnlock engine shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::geofence::InMemoryRegionMonitor;
    use crate::landmark::EMBEDDED_LANDMARK_COUNT;
    use crate::ports::{MemoryPersistence, TracingNotifier};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_start_with_embedded_landmarks() {
        let monitor = Arc::new(InMemoryRegionMonitor::new(20));
        let persistence = Arc::new(MemoryPersistence::with_visited(["castel_ovo"]));

        let app = GeoUnlockApp::start(
            AppConfig::default(),
            monitor.clone(),
            Arc::new(TracingNotifier),
            persistence,
        )
        .await
        .unwrap();

        assert_eq!(app.registry_source(), RegistrySource::Embedded);
        let snapshot = app.handle().snapshot().await.unwrap();
        assert_eq!(snapshot.landmark_count, EMBEDDED_LANDMARK_COUNT);
        assert_eq!(snapshot.visited, vec!["castel_ovo"]);
        assert_eq!(monitor.active_ids().len(), EMBEDDED_LANDMARK_COUNT - 1);

        app.shutdown().await.unwrap();
        assert!(monitor.active_ids().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_landmarks_file_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("landmarks.json");
        std::fs::write(&path, "[{ broken").unwrap();

        let app = GeoUnlockApp::start(
            AppConfig::default().with_landmarks_file(&path),
            Arc::new(InMemoryRegionMonitor::new(20)),
            Arc::new(TracingNotifier),
            Arc::new(MemoryPersistence::new()),
        )
        .await
        .unwrap();

        assert_eq!(app.registry_source(), RegistrySource::Embedded);
        assert_eq!(
            app.handle().snapshot().await.unwrap().landmark_count,
            EMBEDDED_LANDMARK_COUNT
        );
        app.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_visited_load_failure_starts_empty() {
        let persistence = Arc::new(MemoryPersistence::with_visited(["castel_ovo"]));
        persistence.set_failing(true);

        let app = GeoUnlockApp::start(
            AppConfig::default(),
            Arc::new(InMemoryRegionMonitor::new(20)),
            Arc::new(TracingNotifier),
            persistence,
        )
        .await
        .unwrap();

        assert!(app.handle().snapshot().await.unwrap().visited.is_empty());
        app.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unlock_after_failed_load_keeps_stored_unlocks() {
        let persistence = Arc::new(MemoryPersistence::with_visited(["castel_ovo"]));
        persistence.set_failing(true);

        let app = GeoUnlockApp::start(
            AppConfig::default(),
            Arc::new(InMemoryRegionMonitor::new(20)),
            Arc::new(TracingNotifier),
            persistence.clone(),
        )
        .await
        .unwrap();
        persistence.set_failing(false);

        let handle = app.handle();
        handle.confirm_unlock("castel_nuovo").await.unwrap();

        let stored = persistence.stored();
        assert!(stored.contains("castel_ovo"));
        assert!(stored.contains("castel_nuovo"));
        assert_eq!(
            handle.snapshot().await.unwrap().visited,
            vec!["castel_nuovo", "castel_ovo"]
        );
        app.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = AppConfig::default();
        config.engine = EngineConfig::default().with_max_regions(0);

        let result = GeoUnlockApp::start(
            config,
            Arc::new(InMemoryRegionMonitor::new(20)),
            Arc::new(TracingNotifier),
            Arc::new(MemoryPersistence::new()),
        )
        .await;

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
