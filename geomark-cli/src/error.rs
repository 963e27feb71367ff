//! CLI error type.

use std::fmt;

use geomark::app::AppError;
use geomark::config::ConfigError;
use geomark::location::LocationError;
use geomark::logging::LoggingError;
use geomark::store::StoreError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem.
    Config(String),

    /// Marker store failure.
    Store(StoreError),

    /// Application startup failure.
    App(AppError),

    /// Track file could not be used.
    Track(LocationError),

    /// Logging could not be set up.
    Logging(LoggingError),

    /// The async runtime could not be created.
    Runtime(String),

    /// The referenced record does not exist.
    NotFound(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Store(e) => write!(f, "{}", e),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Track(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "Failed to create async runtime: {}", msg),
            CliError::NotFound(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Store(e) => Some(e),
            CliError::App(e) => Some(e),
            CliError::Track(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Config(_) | CliError::Runtime(_) | CliError::NotFound(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<LocationError> for CliError {
    fn from(e: LocationError) -> Self {
        CliError::Track(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err: CliError = ConfigError::UnknownKey("store.colour".to_string()).into();
        assert!(err.to_string().starts_with("Configuration error"));
        assert!(err.to_string().contains("store.colour"));
    }

    #[test]
    fn test_store_error_keeps_source() {
        let err: CliError = StoreError::Unavailable.into();
        assert!(std::error::Error::source(&err).is_some());
    }
}
