//! Accuracy-aware arrival detection.

use rider_core::config::ArrivalConfig;
use rider_geo::{GeoPoint, LocatedReading, haversine_meters};

/// Decides whether a reading is close enough to a target to count as arrived.
///
/// The radius is `max(accuracy * accuracy_multiplier, min_threshold_m)`, so a
/// poor fix widens it and a very precise one never shrinks it below the floor.
/// Stateless: nothing is cached or debounced between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalDetector {
    accuracy_multiplier: f64,
    min_threshold_m: f64,
}

impl ArrivalDetector {
    /// Build a detector from validated configuration
    pub fn new(config: ArrivalConfig) -> Self {
        Self {
            accuracy_multiplier: config.accuracy_multiplier,
            min_threshold_m: config.min_threshold_m,
        }
    }

    /// Arrival radius in meters for a reading with the given accuracy
    pub fn threshold_meters(&self, accuracy: f64) -> f64 {
        (accuracy * self.accuracy_multiplier).max(self.min_threshold_m)
    }

    /// True when `current` lies within the arrival radius of `target`.
    ///
    /// A missing reading or a missing target is never an arrival.
    pub fn has_arrived(&self, current: Option<&LocatedReading>, target: Option<&GeoPoint>) -> bool {
        let (Some(current), Some(target)) = (current, target) else {
            return false;
        };
        haversine_meters(&current.point, target) <= self.threshold_meters(current.accuracy)
    }
}

impl Default for ArrivalDetector {
    fn default() -> Self {
        Self::new(ArrivalConfig::default())
    }
}

impl From<&ArrivalConfig> for ArrivalDetector {
    fn from(config: &ArrivalConfig) -> Self {
        Self::new(*config)
    }
}
