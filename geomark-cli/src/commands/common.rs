//! Common helpers shared across CLI commands.

use std::future::Future;
use std::path::PathBuf;

use geomark::config::{ConfigFile, LoggingSettings};
use geomark::logging::{init_logging, LogGuard};
use geomark::store::SqliteMarkerStore;
use tracing::warn;

use crate::error::CliError;

/// Load config.ini, falling back to defaults with a warning when it is broken.
pub fn load_config() -> ConfigFile {
    match ConfigFile::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("warning: ignoring config file: {}", e);
            ConfigFile::default()
        }
    }
}

/// Resolve the database path: CLI flag first, then config.
pub fn resolve_db_path(cli_db: Option<PathBuf>, config: &ConfigFile) -> PathBuf {
    cli_db.unwrap_or_else(|| config.store.path.clone())
}

/// Quiet logging for one-shot commands: warnings to stderr, no log file.
pub fn init_quiet_logging() -> Result<LogGuard, CliError> {
    let settings = LoggingSettings {
        level: "warn".to_string(),
        directory: None,
    };
    Ok(init_logging(&settings)?)
}

/// Open the marker database.
pub fn open_store(cli_db: Option<PathBuf>) -> Result<SqliteMarkerStore, CliError> {
    let config = load_config();
    let path = resolve_db_path(cli_db, &config);
    SqliteMarkerStore::open(&path).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Could not open marker database");
        CliError::Store(e)
    })
}

/// Run a future to completion on a fresh runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    Ok(runtime.block_on(future))
}
