//! Distance-based proximity classification.

use std::collections::HashSet;

use super::{IneligibleReason, ProximityState, UnlockAttempt, UnlockState};
use crate::config::EngineConfig;
use crate::geo::{bearing_degrees, distance_meters, Coordinate};
use crate::landmark::Landmark;

/// Slack added to radius comparisons so that a point placed exactly on the
/// boundary is not rejected by floating-point rounding.
const BOUNDARY_TOLERANCE_M: f64 = 1e-6;

/// The closest landmark to the user, with direction.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestLandmark {
    pub landmark_id: String,
    pub distance_m: f64,
    /// Initial bearing from the user to the landmark, `[0, 360)`.
    pub bearing_deg: f64,
    pub unlocked: bool,
}

/// A landmark inside the nearby highlight radius.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyLandmark {
    pub landmark_id: String,
    pub distance_m: f64,
}

/// Classifies landmarks by distance against the configured radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityClassifier {
    unlock_radius_m: f64,
    notify_radius_m: f64,
    nearby_radius_m: f64,
}

impl ProximityClassifier {
    pub fn new(unlock_radius_m: f64, notify_radius_m: f64, nearby_radius_m: f64) -> Self {
        Self {
            unlock_radius_m,
            notify_radius_m,
            nearby_radius_m,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.unlock_radius_m,
            config.notify_radius_m,
            config.nearby_radius_m,
        )
    }

    pub fn unlock_radius_m(&self) -> f64 {
        self.unlock_radius_m
    }

    /// Band for a distance in meters. Boundaries are inclusive.
    pub fn classify(&self, distance_m: f64) -> ProximityState {
        if within(distance_m, self.unlock_radius_m) {
            ProximityState::UnlockEligible
        } else if within(distance_m, self.notify_radius_m) {
            ProximityState::NotifyZone
        } else {
            ProximityState::Far
        }
    }

    /// Band of a landmark for a user location.
    pub fn state_for(&self, landmark: &Landmark, at: Coordinate) -> ProximityState {
        self.classify(distance_meters(at, landmark.coordinate()))
    }

    /// Current unlock state of a landmark.
    pub fn unlock_state(
        &self,
        landmark: &Landmark,
        visited: &HashSet<String>,
        location: Option<Coordinate>,
    ) -> UnlockState {
        if visited.contains(&landmark.id) {
            return UnlockState::Unlocked;
        }
        match location {
            Some(at) if self.state_for(landmark, at) == ProximityState::UnlockEligible => {
                UnlockState::ProximityEligible
            }
            _ => UnlockState::Locked,
        }
    }

    /// Decide whether the capture action may proceed.
    ///
    /// A missing location is reported separately from being too far.
    pub fn attempt(
        &self,
        landmark: &Landmark,
        visited: &HashSet<String>,
        location: Option<Coordinate>,
    ) -> UnlockAttempt {
        if visited.contains(&landmark.id) {
            return UnlockAttempt::Ineligible(IneligibleReason::AlreadyUnlocked);
        }
        let Some(at) = location else {
            return UnlockAttempt::Ineligible(IneligibleReason::LocationUnavailable);
        };

        let distance_m = distance_meters(at, landmark.coordinate());
        if within(distance_m, self.unlock_radius_m) {
            UnlockAttempt::Eligible { distance_m }
        } else {
            UnlockAttempt::Ineligible(IneligibleReason::TooFar {
                distance_m,
                required_m: self.unlock_radius_m,
            })
        }
    }

    /// The nearest locked landmark, or the nearest overall once all are unlocked.
    pub fn nearest(
        &self,
        landmarks: &[Landmark],
        visited: &HashSet<String>,
        at: Coordinate,
    ) -> Option<NearestLandmark> {
        let any_locked = landmarks.iter().any(|l| !visited.contains(&l.id));

        landmarks
            .iter()
            .filter(|l| !any_locked || !visited.contains(&l.id))
            .map(|l| (distance_meters(at, l.coordinate()), l))
            .min_by(|(da, a), (db, b)| da.total_cmp(db).then_with(|| a.id.cmp(&b.id)))
            .map(|(distance_m, l)| NearestLandmark {
                landmark_id: l.id.clone(),
                distance_m,
                bearing_deg: bearing_degrees(at, l.coordinate()),
                unlocked: visited.contains(&l.id),
            })
    }

    /// Landmarks within the nearby radius, closest first.
    pub fn nearby(&self, landmarks: &[Landmark], at: Coordinate) -> Vec<NearbyLandmark> {
        let mut out: Vec<NearbyLandmark> = landmarks
            .iter()
            .map(|l| NearbyLandmark {
                landmark_id: l.id.clone(),
                distance_m: distance_meters(at, l.coordinate()),
            })
            .filter(|n| within(n.distance_m, self.nearby_radius_m))
            .collect();
        out.sort_by(|a, b| {
            a.distance_m
                .total_cmp(&b.distance_m)
                .then_with(|| a.landmark_id.cmp(&b.landmark_id))
        });
        out
    }
}

impl Default for ProximityClassifier {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

fn within(distance_m: f64, radius_m: f64) -> bool {
    distance_m <= radius_m + BOUNDARY_TOLERANCE_M
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination;

    fn user() -> Coordinate {
        Coordinate::new(40.84735, 14.26789).unwrap()
    }

    fn landmark_at(id: &str, bearing: f64, distance_m: f64) -> Landmark {
        Landmark::new(id, id, destination(user(), bearing, distance_m))
    }

    #[test]
    fn test_classify_bands() {
        let c = ProximityClassifier::default();
        assert_eq!(c.classify(0.0), ProximityState::UnlockEligible);
        assert_eq!(c.classify(30.0), ProximityState::UnlockEligible);
        assert_eq!(c.classify(30.5), ProximityState::NotifyZone);
        assert_eq!(c.classify(100.0), ProximityState::NotifyZone);
        assert_eq!(c.classify(100.5), ProximityState::Far);
    }

    #[test]
    fn test_attempt_exactly_at_unlock_radius_is_eligible() {
        let c = ProximityClassifier::default();
        let lm = landmark_at("edge", 0.0, 30.0);

        let attempt = c.attempt(&lm, &HashSet::new(), Some(user()));
        assert!(attempt.is_eligible(), "got {:?}", attempt);
    }

    #[test]
    fn test_attempt_too_far() {
        let c = ProximityClassifier::default();
        let lm = landmark_at("far", 90.0, 45.0);

        match c.attempt(&lm, &HashSet::new(), Some(user())) {
            UnlockAttempt::Ineligible(IneligibleReason::TooFar {
                distance_m,
                required_m,
            }) => {
                assert!((distance_m - 45.0).abs() < 1e-3);
                assert_eq!(required_m, 30.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_attempt_without_location() {
        let c = ProximityClassifier::default();
        let lm = landmark_at("x", 0.0, 1.0);
        assert_eq!(
            c.attempt(&lm, &HashSet::new(), None),
            UnlockAttempt::Ineligible(IneligibleReason::LocationUnavailable)
        );
    }

    #[test]
    fn test_attempt_already_unlocked() {
        let c = ProximityClassifier::default();
        let lm = landmark_at("x", 0.0, 1.0);
        let visited: HashSet<String> = ["x".to_string()].into_iter().collect();
        assert_eq!(
            c.attempt(&lm, &visited, Some(user())),
            UnlockAttempt::Ineligible(IneligibleReason::AlreadyUnlocked)
        );
    }

    #[test]
    fn test_unlock_state_transitions() {
        let c = ProximityClassifier::default();
        let lm = landmark_at("x", 180.0, 20.0);
        let mut visited = HashSet::new();

        assert_eq!(c.unlock_state(&lm, &visited, None), UnlockState::Locked);
        assert_eq!(
            c.unlock_state(&lm, &visited, Some(user())),
            UnlockState::ProximityEligible
        );
        let away = destination(user(), 0.0, 200.0);
        assert_eq!(c.unlock_state(&lm, &visited, Some(away)), UnlockState::Locked);

        visited.insert("x".to_string());
        assert_eq!(c.unlock_state(&lm, &visited, Some(away)), UnlockState::Unlocked);
    }

    #[test]
    fn test_nearest_prefers_locked() {
        let c = ProximityClassifier::default();
        let landmarks = vec![landmark_at("close", 0.0, 50.0), landmark_at("far", 90.0, 800.0)];
        let visited: HashSet<String> = ["close".to_string()].into_iter().collect();

        let nearest = c.nearest(&landmarks, &visited, user()).unwrap();
        assert_eq!(nearest.landmark_id, "far");
        assert!(!nearest.unlocked);
        assert!((nearest.bearing_deg - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_nearest_falls_back_to_all_when_everything_unlocked() {
        let c = ProximityClassifier::default();
        let landmarks = vec![landmark_at("close", 0.0, 50.0), landmark_at("far", 90.0, 800.0)];
        let visited: HashSet<String> = landmarks.iter().map(|l| l.id.clone()).collect();

        let nearest = c.nearest(&landmarks, &visited, user()).unwrap();
        assert_eq!(nearest.landmark_id, "close");
        assert!(nearest.unlocked);
    }

    #[test]
    fn test_nearest_empty() {
        let c = ProximityClassifier::default();
        assert!(c.nearest(&[], &HashSet::new(), user()).is_none());
    }

    #[test]
    fn test_nearby_sorted_and_bounded() {
        let c = ProximityClassifier::default();
        let landmarks = vec![
            landmark_at("b", 0.0, 400.0),
            landmark_at("a", 90.0, 120.0),
            landmark_at("c", 180.0, 650.0),
        ];

        let ids: Vec<_> = c
            .nearby(&landmarks, user())
            .into_iter()
            .map(|n| n.landmark_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
