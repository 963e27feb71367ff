//! Addressable configuration keys (`section.key`) for get/set from the CLI.

use std::str::FromStr;

use super::{display_path, expand_tilde, ConfigError, ConfigFile};
use crate::coord::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::location::LocationAccuracy;

/// Every setting in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    LocationAccuracy,
    LocationTimeIntervalMs,
    LocationDistanceIntervalM,
    LocationDefaultLatitude,
    LocationDefaultLongitude,
    ProximityRadiusM,
    ProximityTitle,
    StorePath,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::LocationAccuracy,
            ConfigKey::LocationTimeIntervalMs,
            ConfigKey::LocationDistanceIntervalM,
            ConfigKey::LocationDefaultLatitude,
            ConfigKey::LocationDefaultLongitude,
            ConfigKey::ProximityRadiusM,
            ConfigKey::ProximityTitle,
            ConfigKey::StorePath,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingDirectory,
        ]
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::LocationAccuracy
            | ConfigKey::LocationTimeIntervalMs
            | ConfigKey::LocationDistanceIntervalM
            | ConfigKey::LocationDefaultLatitude
            | ConfigKey::LocationDefaultLongitude => "location",
            ConfigKey::ProximityRadiusM | ConfigKey::ProximityTitle => "proximity",
            ConfigKey::StorePath => "store",
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => "logging",
        }
    }

    /// Key within the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::LocationAccuracy => "accuracy",
            ConfigKey::LocationTimeIntervalMs => "time_interval_ms",
            ConfigKey::LocationDistanceIntervalM => "distance_interval_m",
            ConfigKey::LocationDefaultLatitude => "default_latitude",
            ConfigKey::LocationDefaultLongitude => "default_longitude",
            ConfigKey::ProximityRadiusM => "radius_m",
            ConfigKey::ProximityTitle => "title",
            ConfigKey::StorePath => "path",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value rendered as text. Empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::LocationAccuracy => config.location.accuracy.name().to_string(),
            ConfigKey::LocationTimeIntervalMs => config.location.time_interval_ms.to_string(),
            ConfigKey::LocationDistanceIntervalM => config.location.distance_interval_m.to_string(),
            ConfigKey::LocationDefaultLatitude => config.location.default_latitude.to_string(),
            ConfigKey::LocationDefaultLongitude => config.location.default_longitude.to_string(),
            ConfigKey::ProximityRadiusM => config.proximity.radius_m.to_string(),
            ConfigKey::ProximityTitle => config.proximity.title.clone(),
            ConfigKey::StorePath => display_path(&config.store.path),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_deref()
                .map(display_path)
                .unwrap_or_default(),
        }
    }

    /// Parse `value` and store it in `config`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::LocationAccuracy => {
                config.location.accuracy = value
                    .parse::<LocationAccuracy>()
                    .map_err(|reason| self.invalid(value, reason))?;
            }
            ConfigKey::LocationTimeIntervalMs => {
                config.location.time_interval_ms = value
                    .parse::<u64>()
                    .map_err(|e| self.invalid(value, e.to_string()))?;
            }
            ConfigKey::LocationDistanceIntervalM => {
                config.location.distance_interval_m = self.parse_range(value, 0.0, f64::MAX)?;
            }
            ConfigKey::LocationDefaultLatitude => {
                config.location.default_latitude = self.parse_range(value, MIN_LAT, MAX_LAT)?;
            }
            ConfigKey::LocationDefaultLongitude => {
                config.location.default_longitude = self.parse_range(value, MIN_LON, MAX_LON)?;
            }
            ConfigKey::ProximityRadiusM => {
                let radius = self.parse_range(value, 0.0, f64::MAX)?;
                if radius == 0.0 {
                    return Err(self.invalid(value, "radius must be positive"));
                }
                config.proximity.radius_m = radius;
            }
            ConfigKey::ProximityTitle => {
                if value.is_empty() {
                    return Err(self.invalid(value, "title cannot be empty"));
                }
                config.proximity.title = value.to_string();
            }
            ConfigKey::StorePath => {
                if value.is_empty() {
                    return Err(self.invalid(value, "path cannot be empty"));
                }
                config.store.path = expand_tilde(value);
            }
            ConfigKey::LoggingLevel => {
                config.logging.level = if value.is_empty() {
                    "info".to_string()
                } else {
                    value.to_string()
                };
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = if value.is_empty() {
                    None
                } else {
                    Some(expand_tilde(value))
                };
            }
        }
        Ok(())
    }

    fn parse_range(&self, value: &str, min: f64, max: f64) -> Result<f64, ConfigError> {
        let parsed = value
            .parse::<f64>()
            .map_err(|e| self.invalid(value, e.to_string()))?;
        if !parsed.is_finite() || parsed < min || parsed > max {
            return Err(self.invalid(value, format!("must be between {} and {}", min, max)));
        }
        Ok(parsed)
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_names() {
        assert_eq!(
            "proximity.radius_m".parse::<ConfigKey>().unwrap(),
            ConfigKey::ProximityRadiusM
        );
        assert_eq!(
            " Store.Path ".parse::<ConfigKey>().unwrap(),
            ConfigKey::StorePath
        );
        assert!(matches!(
            "proximity.colour".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_every_key_round_trips_through_text() {
        let config = ConfigFile::default();
        let mut copy = ConfigFile::default();
        for key in ConfigKey::all() {
            key.set(&mut copy, &key.get(&config)).unwrap();
        }
        assert_eq!(copy, config);
    }

    #[test]
    fn test_set_validates() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::ProximityRadiusM.set(&mut config, "0").is_err());
        assert!(ConfigKey::ProximityRadiusM.set(&mut config, "-5").is_err());
        assert!(ConfigKey::LocationDefaultLatitude.set(&mut config, "91").is_err());
        assert!(ConfigKey::LocationTimeIntervalMs.set(&mut config, "soon").is_err());
        assert!(ConfigKey::ProximityTitle.set(&mut config, "  ").is_err());
        assert_eq!(config, ConfigFile::default());

        ConfigKey::ProximityRadiusM.set(&mut config, "42.5").unwrap();
        assert_eq!(config.proximity.radius_m, 42.5);
    }

    #[test]
    fn test_empty_log_directory_disables_file_logging() {
        let mut config = ConfigFile::default();
        ConfigKey::LoggingDirectory.set(&mut config, "").unwrap();
        assert!(config.logging.directory.is_none());
        assert_eq!(ConfigKey::LoggingDirectory.get(&config), "");
    }

    #[test]
    fn test_display_matches_name() {
        for key in ConfigKey::all() {
            assert_eq!(key.to_string(), key.name());
        }
    }
}
