//! Tunables for geofence allocation and proximity classification.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

// ==================== Geofence Defaults ====================

/// Default maximum number of simultaneously monitored regions.
///
/// Mobile platforms cap active circular regions per app at 20.
pub const DEFAULT_MAX_REGIONS: usize = 20;

/// Default radius of each monitored region in meters.
///
/// Entering this radius makes the platform deliver an "entered region" event.
pub const DEFAULT_NOTIFY_RADIUS_M: f64 = 100.0;

/// Default minimum movement in meters before a new fix triggers reallocation.
pub const DEFAULT_RECOMPUTE_DISTANCE_M: f64 = 5.0;

// ==================== Proximity Defaults ====================

/// Default radius in meters within which a landmark may be unlocked.
pub const DEFAULT_UNLOCK_RADIUS_M: f64 = 30.0;

/// Default radius in meters within which a landmark is highlighted as nearby.
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 500.0;

/// Default window in seconds during which a repeated region entry for the
/// same landmark does not produce another notification.
pub const DEFAULT_NOTIFY_COOLDOWN_SECS: u64 = 60;

/// Invalid engine configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineConfigError {
    /// Capacity must allow at least one region.
    #[error("max_regions must be at least 1")]
    ZeroCapacity,

    /// A radius is zero, negative or not finite.
    #[error("{name} must be a positive number of meters, got {value}")]
    InvalidRadius { name: &'static str, value: f64 },

    /// The unlock radius does not fit inside the notify radius.
    #[error("unlock_radius_m ({unlock}) must not exceed notify_radius_m ({notify})")]
    UnlockOutsideNotify { unlock: f64, notify: f64 },
}

/// Configuration for the geofence engine.
///
/// Every radius is a named constant by default. Deviations from the
/// defaults are allowed but reported by [`EngineConfig::log_deviations`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Capacity K: maximum simultaneously monitored regions.
    pub max_regions: usize,

    /// Monitored-region radius in meters.
    pub notify_radius_m: f64,

    /// Unlock eligibility radius in meters (inclusive).
    pub unlock_radius_m: f64,

    /// "Nearby" highlight radius in meters.
    pub nearby_radius_m: f64,

    /// Re-entry notification suppression window in seconds.
    pub notify_cooldown_secs: u64,

    /// Minimum movement in meters that counts as a meaningful location change.
    pub recompute_distance_m: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_regions: DEFAULT_MAX_REGIONS,
            notify_radius_m: DEFAULT_NOTIFY_RADIUS_M,
            unlock_radius_m: DEFAULT_UNLOCK_RADIUS_M,
            nearby_radius_m: DEFAULT_NEARBY_RADIUS_M,
            notify_cooldown_secs: DEFAULT_NOTIFY_COOLDOWN_SECS,
            recompute_distance_m: DEFAULT_RECOMPUTE_DISTANCE_M,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the region capacity.
    pub fn with_max_regions(mut self, max_regions: usize) -> Self {
        self.max_regions = max_regions;
        self
    }

    /// Set the monitored-region radius.
    pub fn with_notify_radius_m(mut self, meters: f64) -> Self {
        self.notify_radius_m = meters;
        self
    }

    /// Set the unlock radius.
    pub fn with_unlock_radius_m(mut self, meters: f64) -> Self {
        self.unlock_radius_m = meters;
        self
    }

    /// Set the nearby highlight radius.
    pub fn with_nearby_radius_m(mut self, meters: f64) -> Self {
        self.nearby_radius_m = meters;
        self
    }

    /// Set the notification cool-down.
    pub fn with_notify_cooldown_secs(mut self, secs: u64) -> Self {
        self.notify_cooldown_secs = secs;
        self
    }

    /// Set the movement threshold for reallocation.
    pub fn with_recompute_distance_m(mut self, meters: f64) -> Self {
        self.recompute_distance_m = meters;
        self
    }

    /// Notification cool-down as a Duration.
    pub fn notify_cooldown(&self) -> Duration {
        Duration::from_secs(self.notify_cooldown_secs)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.max_regions == 0 {
            return Err(EngineConfigError::ZeroCapacity);
        }

        for (name, value) in [
            ("notify_radius_m", self.notify_radius_m),
            ("unlock_radius_m", self.unlock_radius_m),
            ("nearby_radius_m", self.nearby_radius_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineConfigError::InvalidRadius { name, value });
            }
        }

        if !self.recompute_distance_m.is_finite() || self.recompute_distance_m < 0.0 {
            return Err(EngineConfigError::InvalidRadius {
                name: "recompute_distance_m",
                value: self.recompute_distance_m,
            });
        }

        if self.unlock_radius_m > self.notify_radius_m {
            return Err(EngineConfigError::UnlockOutsideNotify {
                unlock: self.unlock_radius_m,
                notify: self.notify_radius_m,
            });
        }

        Ok(())
    }

    /// Names of radii that differ from the canonical defaults.
    pub fn deviations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.unlock_radius_m != DEFAULT_UNLOCK_RADIUS_M {
            out.push("unlock_radius_m");
        }
        if self.notify_radius_m != DEFAULT_NOTIFY_RADIUS_M {
            out.push("notify_radius_m");
        }
        if self.nearby_radius_m != DEFAULT_NEARBY_RADIUS_M {
            out.push("nearby_radius_m");
        }
        out
    }

    /// Warn about every radius that deviates from its canonical value.
    pub fn log_deviations(&self) {
        for name in self.deviations() {
            let (configured, canonical) = match name {
                "unlock_radius_m" => (self.unlock_radius_m, DEFAULT_UNLOCK_RADIUS_M),
                "notify_radius_m" => (self.notify_radius_m, DEFAULT_NOTIFY_RADIUS_M),
                _ => (self.nearby_radius_m, DEFAULT_NEARBY_RADIUS_M),
            };
            warn!(
                setting = name,
                configured, canonical, "Radius deviates from canonical value"
            );
        }
    }
}
