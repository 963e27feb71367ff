//! Application error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::store::StoreError;

/// Errors that can occur during application lifecycle.
#[derive(Debug, Error)]
pub enum AppError {
    /// The proximity engine could not be built.
    #[error("Failed to build proximity engine: {0}")]
    Engine(#[from] EngineError),

    /// The marker store could not be opened.
    #[error("Failed to open marker store: {0}")]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::from(EngineError::InvalidRadius(-1.0));
        assert!(err.to_string().contains("proximity engine"));
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_app_error_from_store_error() {
        let err: AppError = StoreError::Unavailable.into();
        assert!(matches!(err, AppError::Store(StoreError::Unavailable)));
    }
}
