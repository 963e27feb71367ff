//! Circular geofence around a point.

use super::{GeoPoint, NOTIFICATION_RADIUS_METERS};

/// A circular region defined by a center and a radius in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    /// Center of the fence.
    pub center: GeoPoint,
    /// Radius in metres (boundary inclusive).
    pub radius_meters: f64,
}

impl Geofence {
    /// Create a geofence with an explicit radius.
    pub fn new(center: GeoPoint, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
        }
    }

    /// Create a geofence with the default notification radius.
    pub fn around(center: GeoPoint) -> Self {
        Self::new(center, NOTIFICATION_RADIUS_METERS)
    }

    /// Whether `point` lies inside the fence (inclusive).
    pub fn contains(&self, point: &GeoPoint) -> bool {
        super::is_within_radius(
            point.latitude,
            point.longitude,
            self.center.latitude,
            self.center.longitude,
            self.radius_meters,
        )
    }
}
