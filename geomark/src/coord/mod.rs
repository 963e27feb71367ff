//! Geodesic distance and geofence predicates.
//!
//! Latitude/longitude degrees are not isometric, so all distances here are
//! great-circle distances computed with the haversine formula on a spherical
//! earth. For the short radii used by proximity notifications the spherical
//! model is accurate to well under a metre.

mod geofence;

pub use geofence::Geofence;

use serde::{Deserialize, Serialize};

/// Earth radius in metres used for haversine distances.
///
/// Matches the equatorial WGS84 radius so distances agree with common
/// JavaScript and mobile geodesy libraries.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Radius around a marker inside which the user counts as "near" (metres).
pub const NOTIFICATION_RADIUS_METERS: f64 = 100.0;

/// Valid latitude range in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Valid latitude range in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Valid longitude range in degrees.
pub const MIN_LON: f64 = -180.0;
/// Valid longitude range in degrees.
pub const MAX_LON: f64 = 180.0;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both coordinates are finite and inside their valid ranges.
    pub fn is_valid(&self) -> bool {
        is_valid_coordinate(self.latitude, self.longitude)
    }

    /// Great-circle distance to another point in metres.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// Check that a latitude/longitude pair is finite and in range.
#[inline]
pub fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (MIN_LAT..=MAX_LAT).contains(&lat)
        && (MIN_LON..=MAX_LON).contains(&lon)
}

/// Haversine great-circle distance between two points, in metres.
///
/// Returns NaN if any input is NaN; callers that need a total predicate
/// should use [`is_near`].
#[inline]
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // Clamp guards against rounding pushing `a` past 1.0 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

/// Whether the user is within [`NOTIFICATION_RADIUS_METERS`] of a marker.
///
/// The boundary is inclusive. Non-finite inputs are never near anything.
#[inline]
pub fn is_near(user_lat: f64, user_lon: f64, marker_lat: f64, marker_lon: f64) -> bool {
    is_within_radius(
        user_lat,
        user_lon,
        marker_lat,
        marker_lon,
        NOTIFICATION_RADIUS_METERS,
    )
}

/// Whether two points are within `radius_meters` of each other (inclusive).
#[inline]
pub fn is_within_radius(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    radius_meters: f64,
) -> bool {
    let distance = distance_meters(lat1, lon1, lat2, lon2);
    // NaN compares false, so malformed input falls out as "not near"
    distance <= radius_meters
}

/// Offset a point due north (positive) or south (negative) by `meters`.
///
/// Useful for building test fixtures at an exact distance from a marker.
pub fn offset_north(point: GeoPoint, meters: f64) -> GeoPoint {
    let dlat = (meters / EARTH_RADIUS_METERS).to_degrees();
    GeoPoint::new(point.latitude + dlat, point.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PERM: GeoPoint = GeoPoint::new(58.0, 56.0);

    #[test]
    fn test_same_point_is_near() {
        assert!(is_near(58.0, 56.0, 58.0, 56.0));
        assert_eq!(distance_meters(58.0, 56.0, 58.0, 56.0), 0.0);
    }

    #[test]
    fn test_just_inside_radius() {
        let user = offset_north(PERM, 99.9);
        let distance = user.distance_to(&PERM);
        assert!((distance - 99.9).abs() < 0.01, "got {}", distance);
        assert!(is_near(user.latitude, user.longitude, PERM.latitude, PERM.longitude));
    }

    #[test]
    fn test_just_outside_radius() {
        let user = offset_north(PERM, 100.1);
        assert!(!is_near(user.latitude, user.longitude, PERM.latitude, PERM.longitude));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        assert!(is_within_radius(0.0, 0.0, 0.0, 0.0, 0.0));
        let user = offset_north(PERM, 50.0);
        let exact = user.distance_to(&PERM);
        assert!(is_within_radius(
            user.latitude,
            user.longitude,
            PERM.latitude,
            PERM.longitude,
            exact
        ));
    }

    #[test]
    fn test_longitude_degrees_shrink_with_latitude() {
        // One degree of longitude is ~111km at the equator but ~59km at 58°N
        let equator = distance_meters(0.0, 0.0, 0.0, 1.0);
        let north = distance_meters(58.0, 56.0, 58.0, 57.0);
        assert!((equator - 111_319.0).abs() < 100.0, "got {}", equator);
        assert!(north < equator * 0.6, "got {}", north);
    }

    #[test]
    fn test_known_distance_moscow_perm() {
        // Moscow (55.7558, 37.6173) to Perm (58.0105, 56.2502) is ~1150 km
        let d = distance_meters(55.7558, 37.6173, 58.0105, 56.2502);
        assert!(d > 1_140_000.0 && d < 1_160_000.0, "got {}", d);
    }

    #[test]
    fn test_nan_is_never_near() {
        assert!(!is_near(f64::NAN, 56.0, 58.0, 56.0));
        assert!(!is_near(58.0, 56.0, 58.0, f64::INFINITY));
    }

    #[test]
    fn test_valid_coordinate() {
        assert!(is_valid_coordinate(58.0, 56.0));
        assert!(is_valid_coordinate(-90.0, 180.0));
        assert!(!is_valid_coordinate(90.1, 0.0));
        assert!(!is_valid_coordinate(0.0, -180.5));
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", GeoPoint::new(58.007124, 56.188173)),
            "58.00712, 56.18817"
        );
    }

    proptest! {
        #[test]
        fn prop_distance_symmetric(
            lat1 in -89.0f64..89.0, lon1 in -179.0f64..179.0,
            lat2 in -89.0f64..89.0, lon2 in -179.0f64..179.0,
        ) {
            let ab = distance_meters(lat1, lon1, lat2, lon2);
            let ba = distance_meters(lat2, lon2, lat1, lon1);
            prop_assert!(ab >= 0.0);
            prop_assert!((ab - ba).abs() < 1e-6);
        }

        #[test]
        fn prop_point_is_near_itself(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
            prop_assert!(is_near(lat, lon, lat, lon));
        }
    }
}
