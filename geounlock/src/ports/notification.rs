//! Local notification port.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

/// Errors from a notification backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NotifyError {
    /// The user has not granted notification permission.
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The backend rejected the request.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// A single local notification to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub landmark_id: String,
    pub title: String,
    pub body: String,
}

impl NotificationRequest {
    /// The proximity notification for a landmark.
    pub fn proximity(landmark_id: impl Into<String>, landmark_name: &str) -> Self {
        Self {
            landmark_id: landmark_id.into(),
            title: format!("You're near {}", landmark_name),
            body: "Get closer and capture it to unlock this landmark.".to_string(),
        }
    }
}

/// Fire-and-forget delivery of local notifications.
///
/// Callers log failures and carry on; a failed notification never blocks
/// an engine transition.
pub trait NotificationPort: Send + Sync {
    fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError>;
}

/// Notifier that writes each request to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationPort for TracingNotifier {
    fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        info!(
            landmark_id = %request.landmark_id,
            title = %request.title,
            "Notification: {}",
            request.body
        );
        Ok(())
    }
}

/// Notifier that records requests, for simulations and tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationRequest>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent delivery fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Requests delivered so far, oldest first.
    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().clone()
    }
}

impl NotificationPort for RecordingNotifier {
    fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("injected failure".to_string()));
        }
        self.sent.lock().push(request.clone());
        Ok(())
    }
}
