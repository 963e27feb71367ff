//! Application configuration for `GeomarkApp`.
//!
//! Combines the component configurations needed to bootstrap the app and
//! translates them from the user's config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ConfigFile, StoreSettings};
use crate::coord::GeoPoint;
use crate::engine::EngineConfig;
use crate::location::LocationConfig;
use crate::store::RetryConfig;

/// Top-level configuration passed to `GeomarkApp::start()`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Tracker cadence and fallback position.
    pub location: LocationConfig,

    /// Proximity radius and notification title.
    pub engine: EngineConfig,

    /// SQLite database file.
    pub store_path: PathBuf,

    /// Retry policy for opening the database.
    pub store_retry: RetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            location: LocationConfig::default(),
            engine: EngineConfig::default(),
            store_path: StoreSettings::default().path,
            store_retry: RetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build from the user's config file.
    pub fn from_config_file(file: &ConfigFile) -> Self {
        let location = LocationConfig::default()
            .with_accuracy(file.location.accuracy)
            .with_time_interval(Duration::from_millis(file.location.time_interval_ms))
            .with_distance_interval(file.location.distance_interval_m)
            .with_default_position(GeoPoint::new(
                file.location.default_latitude,
                file.location.default_longitude,
            ));

        let engine = EngineConfig {
            radius_meters: file.proximity.radius_m,
            title: file.proximity.title.clone(),
        };

        Self {
            location,
            engine,
            store_path: file.store.path.clone(),
            store_retry: RetryConfig::default(),
        }
    }

    /// Override the database location.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Override the open retry policy.
    pub fn with_store_retry(mut self, retry: RetryConfig) -> Self {
        self.store_retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationAccuracy;

    #[test]
    fn test_from_default_file_matches_default() {
        let config = AppConfig::from_config_file(&ConfigFile::default());
        let default = AppConfig::default();
        assert_eq!(config.location, default.location);
        assert_eq!(config.engine, default.engine);
        assert_eq!(config.store_path, default.store_path);
    }

    #[test]
    fn test_from_config_file_translates_units() {
        let mut file = ConfigFile::default();
        file.location.time_interval_ms = 750;
        file.location.accuracy = LocationAccuracy::High;
        file.proximity.radius_m = 30.0;
        file.store.path = PathBuf::from("/tmp/m.db");

        let config = AppConfig::from_config_file(&file);
        assert_eq!(config.location.time_interval, Duration::from_millis(750));
        assert_eq!(config.location.accuracy, LocationAccuracy::High);
        assert_eq!(config.engine.radius_meters, 30.0);
        assert_eq!(config.store_path, PathBuf::from("/tmp/m.db"));
    }
}
