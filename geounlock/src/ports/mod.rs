//! Outbound ports for notifications and visited-set storage.
//!
//! Region monitoring lives with the allocator in [`crate::geofence`].

mod notification;
mod persistence;

pub use notification::{
    NotificationPort, NotificationRequest, NotifyError, RecordingNotifier, TracingNotifier,
};
pub use persistence::{
    JsonFilePersistence, MemoryPersistence, PersistenceError, PersistencePort, VISITED_KEY,
};
