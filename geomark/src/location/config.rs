//! Location tracking configuration.

use std::str::FromStr;
use std::time::Duration;

use crate::coord::GeoPoint;

/// Default minimum time between forwarded samples.
pub const DEFAULT_TIME_INTERVAL: Duration = Duration::from_millis(2000);

/// Default minimum displacement (metres) that forwards a sample early.
pub const DEFAULT_DISTANCE_INTERVAL_METERS: f64 = 5.0;

/// Position used for the fallback sample when no fix is available at start.
pub const DEFAULT_POSITION: GeoPoint = GeoPoint::new(58.007124, 56.188173);

/// Requested accuracy class, passed through to the platform source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationAccuracy {
    Lowest,
    Low,
    #[default]
    Balanced,
    High,
    Highest,
    BestForNavigation,
}

impl LocationAccuracy {
    /// Config-file name.
    pub fn name(&self) -> &'static str {
        match self {
            LocationAccuracy::Lowest => "lowest",
            LocationAccuracy::Low => "low",
            LocationAccuracy::Balanced => "balanced",
            LocationAccuracy::High => "high",
            LocationAccuracy::Highest => "highest",
            LocationAccuracy::BestForNavigation => "navigation",
        }
    }
}

impl FromStr for LocationAccuracy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lowest" => Ok(LocationAccuracy::Lowest),
            "low" => Ok(LocationAccuracy::Low),
            "balanced" => Ok(LocationAccuracy::Balanced),
            "high" => Ok(LocationAccuracy::High),
            "highest" => Ok(LocationAccuracy::Highest),
            "navigation" | "best_for_navigation" => Ok(LocationAccuracy::BestForNavigation),
            other => Err(format!("unknown accuracy '{}'", other)),
        }
    }
}

/// Cadence and fallback settings for [`super::LocationTracker`].
#[derive(Debug, Clone, PartialEq)]
pub struct LocationConfig {
    /// Accuracy requested from the source.
    pub accuracy: LocationAccuracy,
    /// Forward a sample once at least this much time has passed.
    pub time_interval: Duration,
    /// Forward a sample once the user has moved at least this far (metres).
    pub distance_interval_meters: f64,
    /// Position for the mocked fallback sample.
    pub default_position: GeoPoint,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            accuracy: LocationAccuracy::default(),
            time_interval: DEFAULT_TIME_INTERVAL,
            distance_interval_meters: DEFAULT_DISTANCE_INTERVAL_METERS,
            default_position: DEFAULT_POSITION,
        }
    }
}

impl LocationConfig {
    /// Set the time threshold.
    pub fn with_time_interval(mut self, interval: Duration) -> Self {
        self.time_interval = interval;
        self
    }

    /// Set the distance threshold in metres.
    pub fn with_distance_interval(mut self, meters: f64) -> Self {
        self.distance_interval_meters = meters;
        self
    }

    /// Set the fallback position.
    pub fn with_default_position(mut self, position: GeoPoint) -> Self {
        self.default_position = position;
        self
    }

    /// Set the requested accuracy.
    pub fn with_accuracy(mut self, accuracy: LocationAccuracy) -> Self {
        self.accuracy = accuracy;
        self
    }
}
