//! User configuration stored in `~/.geomark/config.ini`.
//!
//! ```ini
//! [location]
//! accuracy = balanced
//! time_interval_ms = 2000
//! distance_interval_m = 5
//! default_latitude = 58.007124
//! default_longitude = 56.188173
//!
//! [proximity]
//! radius_m = 100
//! title = You are near a marker!
//!
//! [store]
//! path = ~/.geomark/markers.db
//!
//! [logging]
//! level = info
//! directory = ~/.geomark/logs
//! ```
//!
//! Missing files, sections and keys fall back to defaults. Unparseable values
//! are errors so typos do not silently revert to defaults.

mod file;
mod keys;

pub use file::{
    ConfigFile, LocationSettings, LoggingSettings, ProximitySettings, StoreSettings,
};
pub use keys::ConfigKey;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name of the per-user directory under the home directory.
pub const CONFIG_DIR_NAME: &str = ".geomark";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors from loading, saving or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid INI.
    #[error("Failed to parse config file: {0}")]
    Parse(String),

    /// A value could not be interpreted.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// The key is not a known setting.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

impl From<ini::Error> for ConfigError {
    fn from(e: ini::Error) -> Self {
        match e {
            ini::Error::Io(io) => ConfigError::Io(io),
            ini::Error::Parse(parse) => ConfigError::Parse(parse.to_string()),
        }
    }
}

/// Per-user geomark directory (`~/.geomark`).
///
/// Falls back to the current directory when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Render a path with the home directory shortened to `~`.
pub fn display_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_path_under_directory() {
        let path = config_file_path();
        assert!(path.ends_with(Path::new(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/tmp/x.db"), PathBuf::from("/tmp/x.db"));
        assert_eq!(expand_tilde("relative.db"), PathBuf::from("relative.db"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/a/b.db"), home.join("a/b.db"));
            assert_eq!(display_path(&home.join("a/b.db")), "~/a/b.db");
        }
    }
}
