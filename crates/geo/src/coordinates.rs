//! Coordinate decoding for order backend payloads.
//!
//! The backend is inconsistent about axis order:
//! - Shop locations are GeoJSON points: `{"type": "Point", "coordinates": [lng, lat]}`
//! - Delivery addresses carry a bare `[lat, lng]` pair

use crate::{GeoError, GeoPoint, Result};
use serde::{Deserialize, Serialize};

/// Axis order of a raw coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateOrder {
    /// `[latitude, longitude]`
    LatLng,
    /// `[longitude, latitude]` (GeoJSON)
    LngLat,
}

/// GeoJSON Point format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    /// Should be "Point"
    #[serde(rename = "type", default)]
    pub point_type: Option<String>,
    /// [longitude, latitude] array
    pub coordinates: Vec<f64>,
}

impl GeoJsonPoint {
    /// Converts to a validated [`GeoPoint`].
    pub fn to_geo_point(&self) -> Result<GeoPoint> {
        point_from_pair(&self.coordinates, CoordinateOrder::LngLat)
    }
}

/// Builds a validated point from a two-element pair in the given axis order.
///
/// # Example
/// ```
/// use rider_geo::{point_from_pair, CoordinateOrder};
///
/// let point = point_from_pair(&[77.0266, 28.4595], CoordinateOrder::LngLat).unwrap();
/// assert_eq!(point.lat, 28.4595);
/// ```
pub fn point_from_pair(pair: &[f64], order: CoordinateOrder) -> Result<GeoPoint> {
    let [first, second] = pair else {
        return Err(GeoError::InvalidPair(pair.len()));
    };

    let point = match order {
        CoordinateOrder::LatLng => GeoPoint::new(*first, *second),
        CoordinateOrder::LngLat => GeoPoint::new(*second, *first),
    };

    if !point.is_valid() {
        return Err(GeoError::InvalidCoordinate(format!(
            "lat {} / lng {} out of range",
            point.lat, point.lng
        )));
    }

    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeoErrorCode;
    use serde_json::json;

    #[test]
    fn test_parse_geojson_point() {
        let value = json!({
            "type": "Point",
            "coordinates": [77.0266, 28.4595]
        });

        let point: GeoJsonPoint = serde_json::from_value(value).unwrap();
        let point = point.to_geo_point().unwrap();
        assert!((point.lat - 28.4595).abs() < 0.0001);
        assert!((point.lng - 77.0266).abs() < 0.0001);
    }

    #[test]
    fn test_parse_geojson_without_type() {
        let value = json!({ "coordinates": [77.0266, 28.4595] });

        let point: GeoJsonPoint = serde_json::from_value(value).unwrap();
        assert!(point.point_type.is_none());
        assert!((point.to_geo_point().unwrap().lat - 28.4595).abs() < 0.0001);
    }

    #[test]
    fn test_lat_lng_pair() {
        let point = point_from_pair(&[28.4677, 77.0714], CoordinateOrder::LatLng).unwrap();
        assert_eq!(point, GeoPoint::new(28.4677, 77.0714));
    }

    #[test]
    fn test_wrong_arity() {
        let err = point_from_pair(&[28.4677], CoordinateOrder::LatLng).unwrap_err();
        assert_eq!(err, GeoError::InvalidPair(1));
        assert_eq!(err.code(), GeoErrorCode::InvalidPair);
    }

    #[test]
    fn test_swapped_axes_rejected() {
        // A [lng, lat] pair read as [lat, lng] puts 139.6 in the latitude slot.
        let err = point_from_pair(&[139.6503, 35.6762], CoordinateOrder::LatLng).unwrap_err();
        assert_eq!(err.code(), GeoErrorCode::InvalidCoordinate);
    }
}
