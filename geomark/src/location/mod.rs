//! Location tracking.
//!
//! A [`LocationSource`] wraps the platform location service. The
//! [`LocationTracker`] sits on top of it and turns the raw stream into a live,
//! ordered sequence of [`LocationSample`]s with a guaranteed first fix.
//!
//! # Example
//!
//! ```ignore
//! use geomark::location::{LocationConfig, LocationTracker, TrackerState};
//!
//! let tracker = LocationTracker::new(source, LocationConfig::default());
//! match tracker.start(move |sample| { let _ = tx.send(sample); }).await {
//!     TrackerState::Tracking => {}
//!     TrackerState::PermissionDenied => eprintln!("location permission not granted"),
//!     other => eprintln!("tracking unavailable: {:?}", other),
//! }
//!
//! // Later: no callbacks after this returns
//! tracker.stop();
//! ```

mod cadence;
mod config;
mod manual;
mod replay;
mod sample;
mod tracker;

pub use cadence::{CadenceFilter, Rejection};
pub use config::{
    LocationAccuracy, LocationConfig, DEFAULT_DISTANCE_INTERVAL_METERS, DEFAULT_POSITION,
    DEFAULT_TIME_INTERVAL,
};
pub use manual::ManualLocationSource;
pub use replay::ReplayLocationSource;
pub use sample::LocationSample;
pub use tracker::{LocationTracker, TrackerState};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from a location source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// Location permission was not granted.
    #[error("Location permission not granted")]
    PermissionDenied,

    /// The platform could not provide a position.
    #[error("Location unavailable: {0}")]
    Unavailable(String),

    /// Subscribing to updates failed.
    #[error("Failed to subscribe to location updates: {0}")]
    Subscribe(String),

    /// A track file could not be read or parsed.
    #[error("Invalid track: {0}")]
    InvalidTrack(String),
}

/// Handle to an active location subscription.
pub trait LocationSubscription: Send {
    /// Unsubscribe. After this returns the source sends nothing more.
    fn remove(&mut self);
}

/// Platform location service.
pub trait LocationSource: Send + Sync + 'static {
    /// Ask for foreground location permission. Returns whether it is granted.
    fn request_permission(&self) -> BoxFuture<'_, bool>;

    /// One-shot position fetch. `None` when no fix is available.
    fn current_position(&self, accuracy: LocationAccuracy) -> BoxFuture<'_, Option<LocationSample>>;

    /// Start continuous updates, delivered into `tx`.
    fn subscribe(
        &self,
        config: LocationConfig,
        tx: mpsc::UnboundedSender<LocationSample>,
    ) -> BoxFuture<'_, Result<Box<dyn LocationSubscription>, LocationError>>;
}
