//! Location tracker lifecycle.
//!
//! The tracker owns one subscription to a [`LocationSource`] and a single pump
//! task that drains the source channel, applies the [`CadenceFilter`] and calls
//! the subscriber callback. The callback lives in its own lock: [`stop`] takes
//! that lock before returning, so once `stop` returns no callback is running
//! and none will run again.
//!
//! The callback must not call back into the tracker.
//!
//! [`stop`]: LocationTracker::stop

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    CadenceFilter, LocationConfig, LocationSample, LocationSource, LocationSubscription,
};

type Callback = Box<dyn FnMut(LocationSample) + Send>;

/// Observable tracker state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    /// Not tracking.
    Idle,
    /// `start` is in progress.
    Starting,
    /// Receiving updates.
    Tracking,
    /// The user did not grant location permission.
    PermissionDenied,
    /// Tracking could not be started.
    Failed(String),
}

impl TrackerState {
    /// Whether the tracker is running or about to.
    pub fn is_active(&self) -> bool {
        matches!(self, TrackerState::Starting | TrackerState::Tracking)
    }
}

struct TrackerInner {
    state: TrackerState,
    subscription: Option<Box<dyn LocationSubscription>>,
    pump: Option<JoinHandle<()>>,
    last_sample: Option<LocationSample>,
    /// Bumped by every `stop`, lets an in-flight `start` notice it was cancelled.
    generation: u64,
}

/// Wraps a location source with idempotent start/stop and sample sequencing.
pub struct LocationTracker<S: LocationSource> {
    source: Arc<S>,
    config: LocationConfig,
    inner: Arc<Mutex<TrackerInner>>,
    callback: Arc<Mutex<Option<Callback>>>,
}

impl<S: LocationSource> std::fmt::Debug for LocationTracker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationTracker")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<S: LocationSource> LocationTracker<S> {
    /// Create an idle tracker.
    pub fn new(source: Arc<S>, config: LocationConfig) -> Self {
        Self {
            source,
            config,
            inner: Arc::new(Mutex::new(TrackerInner {
                state: TrackerState::Idle,
                subscription: None,
                pump: None,
                last_sample: None,
                generation: 0,
            })),
            callback: Arc::new(Mutex::new(None)),
        }
    }

    /// Current state.
    pub fn state(&self) -> TrackerState {
        self.inner.lock().state.clone()
    }

    /// The last sample delivered to the callback.
    pub fn last_sample(&self) -> Option<LocationSample> {
        self.inner.lock().last_sample
    }

    /// Tracker configuration.
    pub fn config(&self) -> &LocationConfig {
        &self.config
    }

    /// Start tracking and deliver samples to `on_update`.
    ///
    /// Calling `start` while already started is a no-op. The first delivered
    /// sample is the platform's current fix or, if there is none, a mocked
    /// fallback at the configured default position.
    pub async fn start<F>(&self, on_update: F) -> TrackerState
    where
        F: FnMut(LocationSample) + Send + 'static,
    {
        let generation = {
            let mut inner = self.inner.lock();
            if inner.state.is_active() {
                info!(state = ?inner.state, "Location tracking already started");
                return inner.state.clone();
            }
            inner.state = TrackerState::Starting;
            inner.generation
        };

        if !self.source.request_permission().await {
            warn!("Location permission not granted");
            return self.finish_start(generation, TrackerState::PermissionDenied);
        }
        if self.cancelled(generation) {
            return self.state();
        }

        *self.callback.lock() = Some(Box::new(on_update));
        let mut filter = CadenceFilter::new(&self.config);

        let initial = match self.source.current_position(self.config.accuracy).await {
            Some(fix) => fix,
            None => {
                info!(
                    position = %self.config.default_position,
                    "No location fix available, using default position"
                );
                LocationSample::fallback(self.config.default_position)
            }
        };
        if self.cancelled(generation) {
            self.callback.lock().take();
            return self.state();
        }
        filter.check(&initial).ok();
        Self::deliver(&self.inner, &self.callback, initial);

        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = match self.source.subscribe(self.config.clone(), tx).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(error = %e, "Failed to start location tracking");
                self.callback.lock().take();
                return self.finish_start(generation, TrackerState::Failed(e.to_string()));
            }
        };

        let pump = tokio::spawn(Self::pump(
            rx,
            filter,
            Arc::clone(&self.inner),
            Arc::clone(&self.callback),
        ));

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            // stop() ran while we were subscribing
            drop(inner);
            let mut subscription = subscription;
            subscription.remove();
            pump.abort();
            self.callback.lock().take();
            return self.state();
        }
        inner.subscription = Some(subscription);
        inner.pump = Some(pump);
        inner.state = TrackerState::Tracking;
        info!(
            time_interval_ms = self.config.time_interval.as_millis() as u64,
            distance_interval_m = self.config.distance_interval_meters,
            "Location tracking started"
        );
        TrackerState::Tracking
    }

    /// Stop tracking. No-op when not started.
    ///
    /// Unsubscribes from the source synchronously; when this returns the
    /// callback will not be invoked again.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        inner.generation = inner.generation.wrapping_add(1);

        if !inner.state.is_active() {
            debug!(state = ?inner.state, "Location tracking not running");
            return;
        }

        if let Some(mut subscription) = inner.subscription.take() {
            subscription.remove();
        }
        if let Some(pump) = inner.pump.take() {
            pump.abort();
        }
        inner.state = TrackerState::Idle;
        drop(inner);

        // Waits for an in-flight callback to finish
        self.callback.lock().take();
        info!("Location tracking stopped");
    }

    fn cancelled(&self, generation: u64) -> bool {
        self.inner.lock().generation != generation
    }

    fn finish_start(&self, generation: u64, state: TrackerState) -> TrackerState {
        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.state = state.clone();
            state
        } else {
            inner.state.clone()
        }
    }

    async fn pump(
        mut rx: mpsc::UnboundedReceiver<LocationSample>,
        mut filter: CadenceFilter,
        inner: Arc<Mutex<TrackerInner>>,
        callback: Arc<Mutex<Option<Callback>>>,
    ) {
        while let Some(sample) = rx.recv().await {
            if filter.accept(&sample) {
                debug!(
                    lat = sample.latitude,
                    lon = sample.longitude,
                    "Location updated"
                );
                Self::deliver(&inner, &callback, sample);
            }
        }
        debug!("Location source closed");
    }

    fn deliver(
        inner: &Mutex<TrackerInner>,
        callback: &Mutex<Option<Callback>>,
        sample: LocationSample,
    ) {
        let mut slot = callback.lock();
        if let Some(on_update) = slot.as_mut() {
            inner.lock().last_sample = Some(sample);
            on_update(sample);
        }
    }
}

impl<S: LocationSource> Drop for LocationTracker<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{offset_north, GeoPoint};
    use crate::location::{ManualLocationSource, DEFAULT_POSITION};
    use std::time::Duration;

    fn collector() -> (
        Arc<Mutex<Vec<LocationSample>>>,
        impl FnMut(LocationSample) + Send + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |s| sink.lock().push(s))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_start_emits_fallback_when_no_fix() {
        let source = Arc::new(ManualLocationSource::new());
        let tracker = LocationTracker::new(Arc::clone(&source), LocationConfig::default());
        let (seen, on_update) = collector();

        assert_eq!(tracker.start(on_update).await, TrackerState::Tracking);

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].mocked);
        assert_eq!(seen[0].position(), DEFAULT_POSITION);
    }

    #[tokio::test]
    async fn test_start_uses_real_fix() {
        let source = Arc::new(ManualLocationSource::new());
        source.set_current_fix(Some(LocationSample::new(53.5, 9.7)));
        let tracker = LocationTracker::new(Arc::clone(&source), LocationConfig::default());
        let (seen, on_update) = collector();

        tracker.start(on_update).await;

        let first = seen.lock()[0];
        assert!(!first.mocked);
        assert_eq!(first.position(), GeoPoint::new(53.5, 9.7));
    }

    #[tokio::test]
    async fn test_permission_denied_is_a_state() {
        let source = Arc::new(ManualLocationSource::new());
        source.set_permission(false);
        let tracker = LocationTracker::new(Arc::clone(&source), LocationConfig::default());
        let (seen, on_update) = collector();

        assert_eq!(tracker.start(on_update).await, TrackerState::PermissionDenied);
        assert_eq!(tracker.state(), TrackerState::PermissionDenied);
        assert!(seen.lock().is_empty());
        assert!(!source.is_subscribed());
    }

    #[tokio::test]
    async fn test_subscribe_failure_is_a_state() {
        let source = Arc::new(ManualLocationSource::new());
        source.set_fail_subscribe(true);
        let tracker = LocationTracker::new(Arc::clone(&source), LocationConfig::default());
        let (_seen, on_update) = collector();

        assert!(matches!(
            tracker.start(on_update).await,
            TrackerState::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let source = Arc::new(ManualLocationSource::new());
        let tracker = LocationTracker::new(Arc::clone(&source), LocationConfig::default());
        let (seen, on_update) = collector();
        let (seen_second, on_update_second) = collector();

        tracker.start(on_update).await;
        assert_eq!(tracker.start(on_update_second).await, TrackerState::Tracking);

        assert_eq!(source.subscribe_count(), 1);
        assert_eq!(seen.lock().len(), 1);
        assert!(seen_second.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let source = Arc::new(ManualLocationSource::new());
        let tracker = LocationTracker::new(source, LocationConfig::default());
        tracker.stop();
        tracker.stop();
        assert_eq!(tracker.state(), TrackerState::Idle);
    }

    #[tokio::test]
    async fn test_updates_flow_through_cadence() {
        let source = Arc::new(ManualLocationSource::new());
        let home = GeoPoint::new(58.0, 56.0);
        source.set_current_fix(Some(LocationSample::new(home.latitude, home.longitude)));
        let tracker = LocationTracker::new(Arc::clone(&source), LocationConfig::default());
        let (seen, on_update) = collector();
        tracker.start(on_update).await;

        // Same place right away: filtered
        source.push(LocationSample::new(home.latitude, home.longitude));
        // Moved 20m: forwarded
        let moved = offset_north(home, 20.0);
        source.push(LocationSample::new(moved.latitude, moved.longitude));
        settle().await;

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].position(), moved);
        assert_eq!(tracker.last_sample().map(|s| s.position()), Some(moved));
    }

    #[tokio::test]
    async fn test_no_updates_after_stop() {
        let source = Arc::new(ManualLocationSource::new());
        let tracker = LocationTracker::new(
            Arc::clone(&source),
            LocationConfig::default().with_distance_interval(0.0),
        );
        let (seen, on_update) = collector();
        tracker.start(on_update).await;

        tracker.stop();
        assert!(!source.is_subscribed());
        assert_eq!(tracker.state(), TrackerState::Idle);

        let count = seen.lock().len();
        source.push(LocationSample::new(1.0, 1.0));
        settle().await;
        assert_eq!(seen.lock().len(), count);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let source = Arc::new(ManualLocationSource::new());
        let tracker = LocationTracker::new(Arc::clone(&source), LocationConfig::default());
        let (_seen, on_update) = collector();
        tracker.start(on_update).await;
        tracker.stop();

        let (seen, on_update) = collector();
        assert_eq!(tracker.start(on_update).await, TrackerState::Tracking);
        assert_eq!(source.subscribe_count(), 2);
        assert_eq!(seen.lock().len(), 1);
    }
}
