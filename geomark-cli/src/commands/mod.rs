//! CLI command implementations.

pub mod common;
pub mod config;
pub mod images;
pub mod markers;
pub mod watch;
