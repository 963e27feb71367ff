//! Location samples emitted by the tracker.

use chrono::{DateTime, Utc};

use crate::coord::GeoPoint;

/// A single position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// When the fix was taken.
    pub timestamp: DateTime<Utc>,
    /// Horizontal accuracy in metres, if the source reports it.
    pub accuracy: Option<f64>,
    /// True for a synthesized fallback rather than a real sensor fix.
    pub mocked: bool,
}

impl LocationSample {
    /// A real fix taken now.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::with_timestamp(latitude, longitude, Utc::now())
    }

    /// A real fix with an explicit timestamp.
    pub fn with_timestamp(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            accuracy: None,
            mocked: false,
        }
    }

    /// A synthesized fix at `position`, flagged as mocked.
    pub fn fallback(position: GeoPoint) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            timestamp: Utc::now(),
            accuracy: None,
            mocked: true,
        }
    }

    /// Attach a horizontal accuracy.
    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = Some(meters);
        self
    }

    /// The sample's position.
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}
