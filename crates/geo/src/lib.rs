//! Geodesic utilities for rider delivery tracking.
//!
//! This crate provides:
//! - Great-circle (haversine) distance in meters
//! - Human-readable distance strings for order cards
//! - Coordinate parsing for the pair layouts the order backend emits
//!
//! # Example
//!
//! ```
//! use rider_geo::{distance_meters, format_distance, GeoPoint};
//!
//! let shop = GeoPoint::new(28.4595, 77.0266);
//! let drop_off = GeoPoint::new(28.4677, 77.0714);
//!
//! let meters = distance_meters(Some(&shop), Some(&drop_off));
//! assert_eq!(format_distance(meters), "4.47 km");
//! ```

mod coordinates;
mod error;
mod haversine;

pub use coordinates::{CoordinateOrder, GeoJsonPoint, point_from_pair};
pub use error::{GeoError, GeoErrorCode, Result};
pub use haversine::{EARTH_RADIUS_M, distance_meters, format_distance, haversine_meters};

use serde::{Deserialize, Serialize};

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180)
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a new point.
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns true if both components are finite and in range.
    #[inline]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.lat.to_radians(), self.lng.to_radians())
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

/// A position fix reported by the device location provider.
///
/// Consumed read-only; the provider is the only producer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocatedReading {
    /// Where the device is
    #[serde(flatten)]
    pub point: GeoPoint,
    /// Accuracy radius in meters (68% confidence), never negative
    pub accuracy: f64,
    /// Fix time in epoch milliseconds
    pub timestamp: i64,
}

impl LocatedReading {
    /// Creates a reading, clamping a negative or NaN accuracy to zero.
    pub fn new(point: GeoPoint, accuracy: f64, timestamp: i64) -> Self {
        Self {
            point,
            accuracy: if accuracy > 0.0 { accuracy } else { 0.0 },
            timestamp,
        }
    }
}

/// Anything that sits at a single geographic point.
pub trait Positioned {
    /// The point this value is located at.
    fn position(&self) -> GeoPoint;
}

impl Positioned for GeoPoint {
    #[inline]
    fn position(&self) -> GeoPoint {
        *self
    }
}

impl Positioned for LocatedReading {
    #[inline]
    fn position(&self) -> GeoPoint {
        self.point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_creation() {
        let point = GeoPoint::new(28.4595, 77.0266);
        assert_eq!(point.lat, 28.4595);
        assert_eq!(point.lng, 77.0266);
    }

    #[test]
    fn test_point_validation() {
        assert!(GeoPoint::new(0.0, 0.0).is_valid());
        assert!(GeoPoint::new(90.0, 180.0).is_valid());
        assert!(GeoPoint::new(-90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_reading_clamps_accuracy() {
        let reading = LocatedReading::new(GeoPoint::new(1.0, 2.0), -4.0, 0);
        assert_eq!(reading.accuracy, 0.0);
        let reading = LocatedReading::new(GeoPoint::new(1.0, 2.0), f64::NAN, 0);
        assert_eq!(reading.accuracy, 0.0);
    }

    #[test]
    fn test_reading_json_is_flat() {
        let reading = LocatedReading::new(GeoPoint::new(28.46, 77.03), 12.5, 1_700_000_000_000);
        let json = serde_json::to_value(reading).unwrap();
        assert_eq!(json["lat"], 28.46);
        assert_eq!(json["accuracy"], 12.5);

        let back: LocatedReading = serde_json::from_value(json).unwrap();
        assert_eq!(back.point, reading.point);
    }
}
