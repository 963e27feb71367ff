//! Application bootstrap and lifecycle management.
//!
//! [`GeomarkApp`] owns the startup sequence and graceful shutdown so hosts
//! (the CLI, tests, an embedding UI) do not wire components by hand.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          GeomarkApp                           │
//! │                                                               │
//! │  1. ProximityEngine ◄── Notifier                              │
//! │  2. StoreHandle ◄────── SqliteMarkerStore (background, retry) │
//! │  3. ProximityMonitor task (owns engine, reads StoreHandle)    │
//! │  4. LocationTracker ──► monitor sample channel                │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::GeomarkApp;
pub use config::AppConfig;
pub use error::AppError;
