//! Haversine distance calculation.
//!
//! The Haversine formula calculates the great-circle distance between two points
//! on a sphere given their longitudes and latitudes.

use crate::{GeoPoint, Positioned};

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculates the great-circle distance between two points in meters.
///
/// # Example
/// ```
/// use rider_geo::{haversine_meters, GeoPoint};
///
/// let shop = GeoPoint::new(28.4595, 77.0266);
/// let flat = GeoPoint::new(28.4945, 77.0935);
///
/// let distance = haversine_meters(&shop, &flat);
/// assert!((distance - 7609.0).abs() < 5.0);
/// ```
#[inline]
pub fn haversine_meters(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    // Rounding can push near-antipodal inputs a hair past 1.
    let a = ((d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2))
        .min(1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance in meters between two optional positions.
///
/// A missing point on either side yields `0.0` instead of an error, so a zero
/// result does not by itself mean "co-located": callers that care must check
/// for `None` first.
///
/// # Example
/// ```
/// use rider_geo::{distance_meters, GeoPoint};
///
/// let point = GeoPoint::new(28.4595, 77.0266);
/// assert_eq!(distance_meters(Some(&point), None::<&GeoPoint>), 0.0);
/// ```
#[inline]
pub fn distance_meters<A, B>(a: Option<&A>, b: Option<&B>) -> f64
where
    A: Positioned + ?Sized,
    B: Positioned + ?Sized,
{
    match (a, b) {
        (Some(a), Some(b)) => haversine_meters(&a.position(), &b.position()),
        _ => 0.0,
    }
}

/// Formats a distance for display: `"1.50 km"` from 1000 m up, `"999 m"` below.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        format!("{:.0} m", meters.round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocatedReading;
    use proptest::prelude::*;

    const SHOP: GeoPoint = GeoPoint { lat: 28.4595, lng: 77.0266 };
    const SUSHANT_LOK: GeoPoint = GeoPoint { lat: 28.4677, lng: 77.0714 };
    const BERLIN: GeoPoint = GeoPoint { lat: 52.5200, lng: 13.4050 };
    const PARIS: GeoPoint = GeoPoint { lat: 48.8566, lng: 2.3522 };

    #[test]
    fn test_gurgaon_known_distance() {
        let distance = haversine_meters(&SHOP, &SUSHANT_LOK);
        // Expected: ~4.47 km
        assert!((4400.0..4550.0).contains(&distance), "Shop-Sushant Lok: {distance}");
    }

    #[test]
    fn test_berlin_to_paris() {
        let distance = haversine_meters(&BERLIN, &PARIS);
        // Expected: ~878 km
        assert!((distance - 878_000.0).abs() < 5_000.0, "Berlin-Paris: {distance}");
    }

    #[test]
    fn test_same_point_zero_distance() {
        assert_eq!(haversine_meters(&SHOP, &SHOP), 0.0);
    }

    #[test]
    fn test_missing_point_is_zero() {
        assert_eq!(distance_meters(None::<&GeoPoint>, Some(&SHOP)), 0.0);
        assert_eq!(distance_meters(Some(&SHOP), None::<&GeoPoint>), 0.0);
        assert_eq!(distance_meters::<GeoPoint, GeoPoint>(None, None), 0.0);
    }

    #[test]
    fn test_reading_and_point_mix() {
        let reading = LocatedReading::new(SHOP, 8.0, 0);
        let d1 = distance_meters(Some(&reading), Some(&SUSHANT_LOK));
        let d2 = haversine_meters(&SHOP, &SUSHANT_LOK);
        assert_eq!(d1, d2);
    }

    #[test]
    fn test_format_boundaries() {
        assert!(format_distance(999.0).ends_with(" m"));
        assert!(format_distance(1000.0).ends_with(" km"));
        assert_eq!(format_distance(1500.0), "1.50 km");
        assert_eq!(format_distance(999.0), "999 m");
        assert_eq!(format_distance(42.5), "43 m");
        assert_eq!(format_distance(0.0), "0 m");
    }

    fn point() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lng)| GeoPoint::new(lat, lng))
    }

    proptest! {
        #[test]
        fn prop_symmetric(a in point(), b in point()) {
            let d1 = haversine_meters(&a, &b);
            let d2 = haversine_meters(&b, &a);
            prop_assert!((d1 - d2).abs() < 1e-6, "{} vs {}", d1, d2);
        }

        #[test]
        fn prop_identity(a in point()) {
            prop_assert_eq!(haversine_meters(&a, &a), 0.0);
        }

        #[test]
        fn prop_bounded_by_half_circumference(a in point(), b in point()) {
            let d = haversine_meters(&a, &b);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_M + 1.0);
        }
    }
}
