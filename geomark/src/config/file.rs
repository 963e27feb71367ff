//! INI-backed configuration file.

use std::path::{Path, PathBuf};

use ini::Ini;
use tracing::debug;

use super::{config_directory, config_file_path, ConfigError, ConfigKey};
use crate::coord::NOTIFICATION_RADIUS_METERS;
use crate::engine::DEFAULT_NOTIFICATION_TITLE;
use crate::location::{
    LocationAccuracy, DEFAULT_DISTANCE_INTERVAL_METERS, DEFAULT_POSITION, DEFAULT_TIME_INTERVAL,
};

/// `[location]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    pub accuracy: LocationAccuracy,
    pub time_interval_ms: u64,
    pub distance_interval_m: f64,
    pub default_latitude: f64,
    pub default_longitude: f64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            accuracy: LocationAccuracy::default(),
            time_interval_ms: DEFAULT_TIME_INTERVAL.as_millis() as u64,
            distance_interval_m: DEFAULT_DISTANCE_INTERVAL_METERS,
            default_latitude: DEFAULT_POSITION.latitude,
            default_longitude: DEFAULT_POSITION.longitude,
        }
    }
}

/// `[proximity]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximitySettings {
    pub radius_m: f64,
    pub title: String,
}

impl Default for ProximitySettings {
    fn default() -> Self {
        Self {
            radius_m: NOTIFICATION_RADIUS_METERS,
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: config_directory().join("markers.db"),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for rolling log files. `None` disables file logging.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: Some(config_directory().join("logs")),
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub location: LocationSettings,
    pub proximity: ProximitySettings,
    pub store: StoreSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default path. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    /// Parse from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to the default path, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.to_ini().write_to_file(path)?;
        debug!(path = %path.display(), "Config file saved");
        Ok(())
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini
    }
}
