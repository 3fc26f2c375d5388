//! Visited-set persistence port and adapters.
//!
//! The on-disk format is a single JSON object:
//!
//! ```text
//! { "visited_landmarks_v1": ["castel_ovo", "piazza_dante"] }
//! ```
//!
//! Order is irrelevant and duplicates collapse on load. Writes go to a
//! temporary sibling file which is then renamed over the target, so a crash
//! mid-write leaves the previous file intact.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Key under which the visited IDs are stored.
pub const VISITED_KEY: &str = "visited_landmarks_v1";

/// Errors from a persistence backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid visited-set data: {0}")]
    Format(#[from] serde_json::Error),

    /// Injected failure from a test double.
    #[error("Persistence backend unavailable")]
    Unavailable,
}

/// Storage for the set of unlocked landmark IDs.
pub trait PersistencePort: Send + Sync {
    /// Load the visited set. A store that has never been written is empty.
    fn load_visited(&self) -> Result<HashSet<String>, PersistenceError>;

    /// Replace the stored visited set.
    fn save_visited(&self, visited: &HashSet<String>) -> Result<(), PersistenceError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct VisitedDocument {
    #[serde(rename = "visited_landmarks_v1", default)]
    visited: Vec<String>,
}

/// JSON file persistence.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PersistencePort for JsonFilePersistence {
    fn load_visited(&self) -> Result<HashSet<String>, PersistenceError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No visited file yet");
                return Ok(HashSet::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let doc: VisitedDocument = serde_json::from_str(&contents)?;
        Ok(doc.visited.into_iter().collect())
    }

    fn save_visited(&self, visited: &HashSet<String>) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let sorted: BTreeSet<&String> = visited.iter().collect();
        let doc = VisitedDocument {
            visited: sorted.into_iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&doc)?;

        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), count = visited.len(), "Saved visited set");
        Ok(())
    }
}

/// In-memory persistence with failure injection.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    visited: Mutex<HashSet<String>>,
    saves: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-populated visited set.
    pub fn with_visited<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::default();
        *store.visited.lock() = ids.into_iter().map(Into::into).collect();
        store
    }

    /// Make every subsequent load and save fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Copy of the stored set.
    pub fn stored(&self) -> HashSet<String> {
        self.visited.lock().clone()
    }
}

impl PersistencePort for MemoryPersistence {
    fn load_visited(&self) -> Result<HashSet<String>, PersistenceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable);
        }
        Ok(self.visited.lock().clone())
    }

    fn save_visited(&self, visited: &HashSet<String>) -> Result<(), PersistenceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable);
        }
        *self.visited.lock() = visited.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonFilePersistence::new(temp.path().join("visited.json"));
        assert!(store.load_visited().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = JsonFilePersistence::new(temp.path().join("nested/visited.json"));

        store.save_visited(&set(&["b", "a"])).unwrap();
        assert_eq!(store.load_visited().unwrap(), set(&["a", "b"]));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_file_format_uses_versioned_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("visited.json");
        let store = JsonFilePersistence::new(&path);

        store.save_visited(&set(&["piazza_dante", "castel_ovo"])).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw[VISITED_KEY],
            serde_json::json!(["castel_ovo", "piazza_dante"])
        );
    }

    #[test]
    fn test_duplicates_collapse_on_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("visited.json");
        fs::write(&path, r#"{"visited_landmarks_v1": ["a", "a", "b"]}"#).unwrap();

        let store = JsonFilePersistence::new(&path);
        assert_eq!(store.load_visited().unwrap(), set(&["a", "b"]));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("visited.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFilePersistence::new(&path);
        assert!(matches!(
            store.load_visited(),
            Err(PersistenceError::Format(_))
        ));
    }

    #[test]
    fn test_memory_persistence_failure_injection() {
        let store = MemoryPersistence::with_visited(["a"]);
        assert_eq!(store.load_visited().unwrap(), set(&["a"]));

        store.set_failing(true);
        assert!(store.save_visited(&set(&["b"])).is_err());
        assert_eq!(store.save_count(), 0);

        store.set_failing(false);
        store.save_visited(&set(&["b"])).unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.stored(), set(&["b"]));
    }
}
