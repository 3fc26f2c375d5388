//! Landmark records as they appear in the landmark data file.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// A historic site that can be unlocked by visiting it.
///
/// Field names follow the data file (`mainImageName`, `historicalYear`).
/// Whether a landmark is unlocked is not part of the record; it is derived
/// from the visited set via [`Landmark::status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmark {
    /// Stable unique key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short description shown on the detail screen.
    pub description: String,
    /// Latitude in WGS84 degrees.
    pub latitude: f64,
    /// Longitude in WGS84 degrees.
    pub longitude: f64,
    /// Asset key of the hero image.
    pub main_image_name: String,
    /// Asset keys of gallery images.
    #[serde(default)]
    pub gallery: Vec<String>,
    /// Free-form period label ("1279", "18th century").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_year: Option<String>,
}

impl Landmark {
    /// Create a landmark with empty presentation fields.
    ///
    /// Useful for building registries programmatically and in tests.
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            main_image_name: String::new(),
            gallery: Vec::new(),
            historical_year: None,
        }
    }

    /// The landmark position.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Pair this landmark with its unlock flag.
    pub fn status(&self, visited: &HashSet<String>) -> LandmarkStatus<'_> {
        LandmarkStatus {
            landmark: self,
            unlocked: visited.contains(&self.id),
        }
    }
}

/// Read view of a landmark together with its derived unlock flag.
#[derive(Debug, Clone, Copy)]
pub struct LandmarkStatus<'a> {
    pub landmark: &'a Landmark,
    pub unlocked: bool,
}
