//! Geomark - location-aware map markers with proximity notifications
//!
//! This library provides the core of a marker tool: users drop markers on a map,
//! attach photos, and get notified the first time they walk within a fixed radius
//! of each marker.
//!
//! # Architecture
//!
//! ```text
//! LocationSource ──► LocationTracker ──► ProximityMonitor ──► ProximityEngine ──► Notifier
//!                    (cadence, order)    (one handler task)   (dedup state)
//!                                               ▲
//!                                        MarkerStore (fresh marker list per sample)
//! ```
//!
//! The engine is the only component with non-trivial state. Everything else is a
//! thin collaborator behind a trait so hosts can plug in their own platform
//! services.

pub mod app;
pub mod config;
pub mod coord;
pub mod engine;
pub mod location;
pub mod logging;
pub mod marker;
pub mod monitor;
pub mod notify;
pub mod store;

/// Library version, taken from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
