//! Read-only landmark registry with embedded fallback.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::defaults::embedded_landmarks;
use super::{Landmark, LandmarkStatus};
use crate::geo::CoordError;

/// Errors that can occur while loading a landmark file.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The file could not be read.
    #[error("Failed to read landmark file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid landmark array.
    #[error("Malformed landmark data: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two entries share the same id.
    #[error("Duplicate landmark id: {0}")]
    DuplicateId(String),

    /// An entry has an out-of-range coordinate.
    #[error("Landmark {id} has an invalid coordinate: {source}")]
    InvalidCoordinate {
        id: String,
        #[source]
        source: CoordError,
    },
}

/// Where the registry contents came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrySource {
    /// Loaded from the landmark data file.
    File,
    /// The data file was missing or corrupt; the embedded set is in use.
    Embedded,
}

/// Immutable list of known landmarks, in data-file order.
///
/// A registry is replaced wholesale on refresh, never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkRegistry {
    landmarks: Vec<Landmark>,
}

impl LandmarkRegistry {
    /// Build a registry from already-validated landmarks.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate ids or invalid coordinates.
    pub fn new(landmarks: Vec<Landmark>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(landmarks.len());
        for landmark in &landmarks {
            if !seen.insert(landmark.id.as_str()) {
                return Err(RegistryError::DuplicateId(landmark.id.clone()));
            }
            landmark
                .coordinate()
                .validate()
                .map_err(|source| RegistryError::InvalidCoordinate {
                    id: landmark.id.clone(),
                    source,
                })?;
        }
        Ok(Self { landmarks })
    }

    /// The built-in landmark set.
    pub fn embedded() -> Self {
        Self {
            landmarks: embedded_landmarks(),
        }
    }

    /// Parse a JSON landmark array.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let landmarks: Vec<Landmark> = serde_json::from_str(json)?;
        Self::new(landmarks)
    }

    /// Strictly load a landmark file.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Load a landmark file, falling back to the embedded set on any error.
    ///
    /// A missing or corrupt file is logged, never surfaced to the caller.
    pub fn load_or_embedded(path: &Path) -> (Self, RegistrySource) {
        match Self::from_path(path) {
            Ok(registry) => {
                info!(
                    path = %path.display(),
                    count = registry.len(),
                    "Loaded landmark file"
                );
                (registry, RegistrySource::File)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Landmark file unavailable, using embedded landmarks"
                );
                (Self::embedded(), RegistrySource::Embedded)
            }
        }
    }

    /// Look up a landmark by id.
    pub fn get(&self, id: &str) -> Option<&Landmark> {
        self.landmarks.iter().find(|l| l.id == id)
    }

    /// Returns true if a landmark with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All landmarks in registry order.
    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Iterate landmarks in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.landmarks.iter()
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Landmarks paired with their unlock flag.
    pub fn statuses<'a>(
        &'a self,
        visited: &'a HashSet<String>,
    ) -> impl Iterator<Item = LandmarkStatus<'a>> + 'a {
        self.landmarks.iter().map(move |l| l.status(visited))
    }

    /// Landmarks not in the visited set, in registry order.
    pub fn locked<'a>(
        &'a self,
        visited: &'a HashSet<String>,
    ) -> impl Iterator<Item = &'a Landmark> + 'a {
        self.landmarks
            .iter()
            .filter(move |l| !visited.contains(&l.id))
    }

    /// Case-insensitive name filter. An empty or blank query matches all.
    pub fn search(&self, query: &str) -> Vec<&Landmark> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.landmarks.iter().collect();
        }
        self.landmarks
            .iter()
            .filter(|l| l.name.to_lowercase().contains(&query))
            .collect()
    }
}

impl Default for LandmarkRegistry {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::EMBEDDED_LANDMARK_COUNT;
    use std::fs;

    const TWO_LANDMARKS: &str = r#"[
        {"id": "a", "name": "Alpha Tower", "description": "", "latitude": 10.0,
         "longitude": 20.0, "mainImageName": "A", "gallery": []},
        {"id": "b", "name": "Beta Gate", "description": "", "latitude": 11.0,
         "longitude": 21.0, "mainImageName": "B", "gallery": ["B1"], "historicalYear": "1500"}
    ]"#;

    #[test]
    fn test_from_json_preserves_order() {
        let registry = LandmarkRegistry::from_json_str(TWO_LANDMARKS).unwrap();
        let ids: Vec<_> = registry.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let json = r#"[
            {"id": "a", "name": "A", "description": "", "latitude": 1.0, "longitude": 1.0, "mainImageName": "", "gallery": []},
            {"id": "a", "name": "A2", "description": "", "latitude": 2.0, "longitude": 2.0, "mainImageName": "", "gallery": []}
        ]"#;
        assert!(matches!(
            LandmarkRegistry::from_json_str(json),
            Err(RegistryError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn test_invalid_coordinate_rejected() {
        let json = r#"[{"id": "a", "name": "A", "description": "", "latitude": 95.0,
            "longitude": 1.0, "mainImageName": "", "gallery": []}]"#;
        assert!(matches!(
            LandmarkRegistry::from_json_str(json),
            Err(RegistryError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("landmarks.json");
        fs::write(&path, TWO_LANDMARKS).unwrap();

        let (registry, source) = LandmarkRegistry::load_or_embedded(&path);
        assert_eq!(source, RegistrySource::File);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("landmarks.json");
        fs::write(&path, "{ not json").unwrap();

        let (registry, source) = LandmarkRegistry::load_or_embedded(&path);
        assert_eq!(source, RegistrySource::Embedded);
        assert_eq!(registry.len(), EMBEDDED_LANDMARK_COUNT);
    }

    #[test]
    fn test_missing_file_falls_back_to_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, source) =
            LandmarkRegistry::load_or_embedded(&dir.path().join("missing.json"));
        assert_eq!(source, RegistrySource::Embedded);
        assert_eq!(registry, LandmarkRegistry::embedded());
    }

    #[test]
    fn test_locked_and_statuses() {
        let registry = LandmarkRegistry::from_json_str(TWO_LANDMARKS).unwrap();
        let visited: HashSet<String> = ["a".to_string()].into_iter().collect();

        let locked: Vec<_> = registry.locked(&visited).map(|l| l.id.as_str()).collect();
        assert_eq!(locked, vec!["b"]);

        let unlocked: Vec<_> = registry
            .statuses(&visited)
            .filter(|s| s.unlocked)
            .map(|s| s.landmark.id.as_str())
            .collect();
        assert_eq!(unlocked, vec!["a"]);
    }

    #[test]
    fn test_search_case_insensitive() {
        let registry = LandmarkRegistry::from_json_str(TWO_LANDMARKS).unwrap();
        assert_eq!(registry.search("GATE").len(), 1);
        assert_eq!(registry.search("  ").len(), 2);
        assert!(registry.search("castle").is_empty());
    }

    #[test]
    fn test_get_and_contains() {
        let registry = LandmarkRegistry::embedded();
        assert!(registry.contains("castel_nuovo"));
        assert_eq!(
            registry.get("piazza_dante").map(|l| l.name.as_str()),
            Some("Piazza Dante")
        );
        assert!(registry.get("nope").is_none());
    }
}
