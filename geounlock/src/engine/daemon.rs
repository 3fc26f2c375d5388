//! Engine daemon: serializes every engine input onto one task.
//!
//! The [`EngineDaemon`] owns the [`GeofenceEngine`] exclusively and drains a
//! command channel. Producers (location source, region monitor adapter, UI)
//! hold cloneable [`EngineHandle`]s.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        EngineDaemon                          │
//! │                                                              │
//! │  Location ──┐                                                │
//! │  Entered  ──┼──► mpsc ──► ┌────────────┐                     │
//! │  Commands ──┘             │  Coalesce  │ consecutive fixes   │
//! │                           └─────┬──────┘ → latest only       │
//! │                                 ▼                            │
//! │                          ┌──────────────┐                    │
//! │                          │GeofenceEngine│──► broadcast       │
//! │                          └──────┬───────┘    EngineEvent     │
//! │                                 ▼                            │
//! │                           oneshot reply                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use geounlock::engine::{EngineDaemon, EngineDaemonConfig};
//!
//! let (daemon, handle) = EngineDaemon::new(engine, EngineDaemonConfig::default());
//!
//! let shutdown = CancellationToken::new();
//! tokio::spawn(daemon.run(shutdown.clone()));
//!
//! handle.update_location(here).await?;
//! let attempt = handle.attempt_unlock("castel_ovo", Some(here)).await?;
//! ```

use std::collections::HashSet;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{EngineError, EngineEvent, EngineSnapshot, GeofenceEngine};
use crate::geo::Coordinate;
use crate::geofence::AllocationReport;
use crate::landmark::LandmarkRegistry;
use crate::proximity::{NearbyLandmark, NearestLandmark, UnlockAttempt, UnlockOutcome};

// =============================================================================
// Configuration
// =============================================================================

/// Default capacity of the command channel.
pub const DEFAULT_COMMAND_CHANNEL_CAPACITY: usize = 256;

/// Configuration for the engine daemon.
#[derive(Clone, Debug)]
pub struct EngineDaemonConfig {
    /// Command channel capacity.
    pub channel_capacity: usize,
}

impl Default for EngineDaemonConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_COMMAND_CHANNEL_CAPACITY,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

type Reply<T> = oneshot::Sender<T>;

/// Inputs accepted by the daemon.
#[derive(Debug)]
pub enum EngineCommand {
    Location(Coordinate),
    RegionEntered(String),
    Refresh(Reply<AllocationReport>),
    RefreshWith {
        location: Option<Coordinate>,
        registry: LandmarkRegistry,
        visited: HashSet<String>,
        reply: Reply<AllocationReport>,
    },
    AttemptUnlock {
        landmark_id: String,
        location: Option<Coordinate>,
        reply: Reply<Result<UnlockAttempt, EngineError>>,
    },
    ConfirmUnlock {
        landmark_id: String,
        reply: Reply<Result<UnlockOutcome, EngineError>>,
    },
    ResetVisited(Reply<()>),
    StopAllMonitoring(Reply<AllocationReport>),
    Nearest(Reply<Option<NearestLandmark>>),
    Nearby(Reply<Vec<NearbyLandmark>>),
    Snapshot(Reply<EngineSnapshot>),
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable client for a running [`EngineDaemon`].
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    events: broadcast::Sender<EngineEvent>,
}

impl EngineHandle {
    /// Subscribe to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// True once the daemon has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Queue a location fix. Fixes are coalesced if the daemon falls behind.
    pub async fn update_location(&self, fix: Coordinate) -> Result<(), EngineError> {
        self.send(EngineCommand::Location(fix)).await
    }

    /// Deliver a platform "entered region" event.
    pub async fn region_entered(&self, landmark_id: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineCommand::RegionEntered(landmark_id.into()))
            .await
    }

    pub async fn refresh_geofences(&self) -> Result<AllocationReport, EngineError> {
        self.request(EngineCommand::Refresh).await
    }

    /// Swap in a new landmark list, merge a visited set and recompute.
    pub async fn refresh_with(
        &self,
        location: Option<Coordinate>,
        registry: LandmarkRegistry,
        visited: HashSet<String>,
    ) -> Result<AllocationReport, EngineError> {
        self.request(|reply| EngineCommand::RefreshWith {
            location,
            registry,
            visited,
            reply,
        })
        .await
    }

    /// Check eligibility. `None` means no location is available.
    pub async fn attempt_unlock(
        &self,
        landmark_id: impl Into<String>,
        location: Option<Coordinate>,
    ) -> Result<UnlockAttempt, EngineError> {
        let landmark_id = landmark_id.into();
        self.request(|reply| EngineCommand::AttemptUnlock {
            landmark_id,
            location,
            reply,
        })
        .await?
    }

    pub async fn confirm_unlock(
        &self,
        landmark_id: impl Into<String>,
    ) -> Result<UnlockOutcome, EngineError> {
        let landmark_id = landmark_id.into();
        self.request(|reply| EngineCommand::ConfirmUnlock { landmark_id, reply })
            .await?
    }

    pub async fn reset_visited(&self) -> Result<(), EngineError> {
        self.request(EngineCommand::ResetVisited).await
    }

    pub async fn stop_all_monitoring(&self) -> Result<AllocationReport, EngineError> {
        self.request(EngineCommand::StopAllMonitoring).await
    }

    pub async fn nearest(&self) -> Result<Option<NearestLandmark>, EngineError> {
        self.request(EngineCommand::Nearest).await
    }

    pub async fn nearby(&self) -> Result<Vec<NearbyLandmark>, EngineError> {
        self.request(EngineCommand::Nearby).await
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, EngineError> {
        self.request(EngineCommand::Snapshot).await
    }

    async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::DaemonStopped)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> EngineCommand,
    ) -> Result<T, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| EngineError::DaemonStopped)
    }
}

// =============================================================================
// Daemon
// =============================================================================

/// Long-running owner of the engine.
pub struct EngineDaemon {
    engine: GeofenceEngine,
    command_rx: mpsc::Receiver<EngineCommand>,
}

impl EngineDaemon {
    /// Creates the daemon and a handle for producers.
    pub fn new(engine: GeofenceEngine, config: EngineDaemonConfig) -> (Self, EngineHandle) {
        let (commands, command_rx) = mpsc::channel(config.channel_capacity);
        let handle = EngineHandle {
            commands,
            events: engine.event_sender(),
        };
        (Self { engine, command_rx }, handle)
    }

    /// Runs until `shutdown` fires or every handle is dropped.
    ///
    /// All monitored regions are stopped on the way out. Returns the engine
    /// so the caller can inspect final state.
    pub async fn run(self, shutdown: CancellationToken) -> GeofenceEngine {
        info!("Engine daemon starting");

        let Self {
            mut engine,
            mut command_rx,
        } = self;

        loop {
            let command = tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Engine daemon shutting down");
                    break;
                }

                command = command_rx.recv() => command,
            };

            match command {
                Some(EngineCommand::Location(fix)) => {
                    Self::handle_location(&mut engine, fix, &mut command_rx);
                }
                Some(command) => Self::handle_command(&mut engine, command),
                None => {
                    debug!("All engine handles dropped");
                    break;
                }
            }
        }

        engine.stop_all_monitoring();
        info!("Engine daemon stopped");
        engine
    }

    /// Apply the newest of any consecutively queued fixes.
    ///
    /// A non-location command found while draining is handled right after,
    /// so ordering relative to other inputs is preserved.
    fn handle_location(
        engine: &mut GeofenceEngine,
        mut fix: Coordinate,
        command_rx: &mut mpsc::Receiver<EngineCommand>,
    ) {
        let mut skipped = 0usize;
        let mut deferred = None;

        while let Ok(next) = command_rx.try_recv() {
            match next {
                EngineCommand::Location(newer) => {
                    fix = newer;
                    skipped += 1;
                }
                other => {
                    deferred = Some(other);
                    break;
                }
            }
        }

        if skipped > 0 {
            debug!(skipped, "Coalesced location fixes");
        }
        engine.update_location(fix);

        if let Some(command) = deferred {
            Self::handle_command(engine, command);
        }
    }

    fn handle_command(engine: &mut GeofenceEngine, command: EngineCommand) {
        // A dropped reply receiver only means the caller stopped waiting
        match command {
            EngineCommand::Location(fix) => {
                engine.update_location(fix);
            }
            EngineCommand::RegionEntered(landmark_id) => {
                engine.handle_region_enter(&landmark_id);
            }
            EngineCommand::Refresh(reply) => {
                let _ = reply.send(engine.refresh_geofences());
            }
            EngineCommand::RefreshWith {
                location,
                registry,
                visited,
                reply,
            } => {
                let _ = reply.send(engine.refresh_with(location, registry, visited));
            }
            EngineCommand::AttemptUnlock {
                landmark_id,
                location,
                reply,
            } => {
                let _ = reply.send(engine.attempt_unlock(&landmark_id, location));
            }
            EngineCommand::ConfirmUnlock { landmark_id, reply } => {
                let _ = reply.send(engine.confirm_unlock(&landmark_id));
            }
            EngineCommand::ResetVisited(reply) => {
                engine.reset_visited();
                let _ = reply.send(());
            }
            EngineCommand::StopAllMonitoring(reply) => {
                let _ = reply.send(engine.stop_all_monitoring());
            }
            EngineCommand::Nearest(reply) => {
                let _ = reply.send(engine.nearest());
            }
            EngineCommand::Nearby(reply) => {
                let _ = reply.send(engine.nearby());
            }
            EngineCommand::Snapshot(reply) => {
                let _ = reply.send(engine.snapshot());
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
