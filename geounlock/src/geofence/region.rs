//! Monitored region type.

use std::fmt;

use crate::geo::{distance_meters, Coordinate};
use crate::landmark::Landmark;

/// A circular region around a locked landmark.
///
/// Regions are identified by their landmark id. Two regions for the same
/// landmark with a different center or radius are different geometries and
/// the allocator restarts the monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredRegion {
    /// Landmark this region watches (also the platform region identifier).
    pub landmark_id: String,
    /// Region center.
    pub center: Coordinate,
    /// Region radius in meters.
    pub radius_m: f64,
    /// Whether the platform is currently monitoring this region.
    pub active: bool,
}

impl MonitoredRegion {
    /// Create an inactive region centered on a landmark.
    pub fn for_landmark(landmark: &Landmark, radius_m: f64) -> Self {
        Self {
            landmark_id: landmark.id.clone(),
            center: landmark.coordinate(),
            radius_m,
            active: false,
        }
    }

    /// Copy of this region flagged as active.
    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }

    /// True if both regions describe the same circle for the same landmark.
    pub fn same_geometry(&self, other: &MonitoredRegion) -> bool {
        self.landmark_id == other.landmark_id
            && self.center == other.center
            && self.radius_m == other.radius_m
    }

    /// True if the point lies inside the region (boundary inclusive).
    pub fn contains(&self, point: Coordinate) -> bool {
        distance_meters(self.center, point) <= self.radius_m
    }
}

impl fmt::Display for MonitoredRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} r={:.0}m",
            self.landmark_id, self.center, self.radius_m
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination;

    fn landmark() -> Landmark {
        Landmark::new("castel_nuovo", "Castel Nuovo", Coordinate::new(40.83865, 14.254779).unwrap())
    }

    #[test]
    fn test_for_landmark_is_inactive() {
        let region = MonitoredRegion::for_landmark(&landmark(), 100.0);
        assert_eq!(region.landmark_id, "castel_nuovo");
        assert!(!region.active);
        assert!(region.clone().activated().active);
    }

    #[test]
    fn test_same_geometry_ignores_active_flag() {
        let a = MonitoredRegion::for_landmark(&landmark(), 100.0);
        let b = a.clone().activated();
        assert!(a.same_geometry(&b));

        let c = MonitoredRegion::for_landmark(&landmark(), 150.0);
        assert!(!a.same_geometry(&c));
    }

    #[test]
    fn test_contains() {
        let region = MonitoredRegion::for_landmark(&landmark(), 100.0);
        assert!(region.contains(destination(region.center, 45.0, 99.0)));
        assert!(!region.contains(destination(region.center, 45.0, 101.0)));
    }
}
