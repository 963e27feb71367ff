//! Location source that replays a recorded track.
//!
//! Track files hold one `latitude,longitude` pair per line. Blank lines and
//! lines starting with `#` are ignored.
//!
//! ```text
//! # walk past the bridge
//! 58.0100, 56.2300
//! 58.0102, 56.2301
//! ```

use std::path::Path;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{
    LocationAccuracy, LocationConfig, LocationError, LocationSample, LocationSource,
    LocationSubscription,
};
use crate::coord::GeoPoint;

/// Default delay between replayed fixes.
pub const DEFAULT_REPLAY_PACE: Duration = Duration::from_secs(1);

/// Replays a fixed list of positions at a steady pace.
#[derive(Debug, Clone)]
pub struct ReplayLocationSource {
    track: Vec<GeoPoint>,
    pace: Duration,
    initial_fix: bool,
}

impl ReplayLocationSource {
    /// Replay `track` with the default pace. The first point doubles as the current fix.
    pub fn new(track: Vec<GeoPoint>) -> Self {
        Self {
            track,
            pace: DEFAULT_REPLAY_PACE,
            initial_fix: true,
        }
    }

    /// Parse a track from text.
    pub fn parse(text: &str) -> Result<Self, LocationError> {
        let mut track = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (lat, lon) = line.split_once(',').ok_or_else(|| {
                LocationError::InvalidTrack(format!("line {}: expected 'lat,lon'", index + 1))
            })?;
            let point = GeoPoint::new(
                parse_degrees(lat, index)?,
                parse_degrees(lon, index)?,
            );
            if !point.is_valid() {
                return Err(LocationError::InvalidTrack(format!(
                    "line {}: coordinate out of range",
                    index + 1
                )));
            }
            track.push(point);
        }
        Ok(Self::new(track))
    }

    /// Read and parse a track file.
    pub fn from_file(path: &Path) -> Result<Self, LocationError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| LocationError::InvalidTrack(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    /// Delay between fixes.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Whether the one-shot fetch returns the first track point.
    ///
    /// When disabled the tracker falls back to its default position.
    pub fn with_initial_fix(mut self, enabled: bool) -> Self {
        self.initial_fix = enabled;
        self
    }

    /// Points in the track.
    pub fn track(&self) -> &[GeoPoint] {
        &self.track
    }

    /// Delay between fixes.
    pub fn pace(&self) -> Duration {
        self.pace
    }
}

fn parse_degrees(value: &str, index: usize) -> Result<f64, LocationError> {
    value.trim().parse::<f64>().map_err(|e| {
        LocationError::InvalidTrack(format!("line {}: '{}': {}", index + 1, value.trim(), e))
    })
}

struct ReplaySubscription {
    cancel: CancellationToken,
}

impl LocationSubscription for ReplaySubscription {
    fn remove(&mut self) {
        self.cancel.cancel();
    }
}

impl Drop for ReplaySubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl LocationSource for ReplayLocationSource {
    fn request_permission(&self) -> BoxFuture<'_, bool> {
        async { true }.boxed()
    }

    fn current_position(&self, _accuracy: LocationAccuracy) -> BoxFuture<'_, Option<LocationSample>> {
        let fix = if self.initial_fix {
            self.track
                .first()
                .map(|p| LocationSample::new(p.latitude, p.longitude))
        } else {
            None
        };
        async move { fix }.boxed()
    }

    fn subscribe(
        &self,
        _config: LocationConfig,
        tx: mpsc::UnboundedSender<LocationSample>,
    ) -> BoxFuture<'_, Result<Box<dyn LocationSubscription>, LocationError>> {
        let track = self.track.clone();
        let pace = self.pace;
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            info!(points = track.len(), "Replaying location track");
            for point in track {
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        debug!("Track replay cancelled");
                        return;
                    }
                    _ = tokio::time::sleep(pace) => {}
                }
                if tx
                    .send(LocationSample::new(point.latitude, point.longitude))
                    .is_err()
                {
                    return;
                }
            }
            info!("Track replay finished");
        });

        async move { Ok(Box::new(ReplaySubscription { cancel }) as Box<dyn LocationSubscription>) }
            .boxed()
    }
}
