//! Update cadence and ordering for location samples.
//!
//! A sample is forwarded when either threshold is met since the last forwarded
//! sample:
//!
//! - at least `time_interval` has elapsed, or
//! - the position moved at least `distance_interval_meters`.
//!
//! Samples stamped earlier than the last forwarded one are dropped so
//! consumers never see time go backwards.

use std::time::Duration;

use tracing::trace;

use super::{LocationConfig, LocationSample};

/// Why a sample was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Older than the last forwarded sample.
    OutOfOrder,
    /// Neither the time nor the distance threshold was met.
    TooSoon,
}

/// Stateful filter applied to the raw source stream.
#[derive(Debug, Clone)]
pub struct CadenceFilter {
    time_interval: Duration,
    distance_interval_meters: f64,
    last: Option<LocationSample>,
}

impl CadenceFilter {
    /// Create a filter from tracker configuration.
    pub fn new(config: &LocationConfig) -> Self {
        Self {
            time_interval: config.time_interval,
            distance_interval_meters: config.distance_interval_meters,
            last: None,
        }
    }

    /// Decide whether to forward `sample`. Accepted samples become the new reference.
    pub fn check(&mut self, sample: &LocationSample) -> Result<(), Rejection> {
        let Some(last) = self.last else {
            self.last = Some(*sample);
            return Ok(());
        };

        if sample.timestamp < last.timestamp {
            trace!(
                last = %last.timestamp,
                sample = %sample.timestamp,
                "Dropping out-of-order location sample"
            );
            return Err(Rejection::OutOfOrder);
        }

        let elapsed = (sample.timestamp - last.timestamp)
            .to_std()
            .unwrap_or(Duration::ZERO);
        let moved = last.position().distance_to(&sample.position());

        if elapsed >= self.time_interval || moved >= self.distance_interval_meters {
            self.last = Some(*sample);
            Ok(())
        } else {
            Err(Rejection::TooSoon)
        }
    }

    /// Convenience wrapper around [`check`](Self::check).
    pub fn accept(&mut self, sample: &LocationSample) -> bool {
        self.check(sample).is_ok()
    }

    /// The last forwarded sample.
    pub fn last(&self) -> Option<&LocationSample> {
        self.last.as_ref()
    }
}
