//! Application bootstrap implementation.
//!
//! `GeomarkApp` wires the store, engine, monitor and tracker in the right
//! order and tears them down in reverse.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::engine::ProximityEngine;
use crate::location::{LocationSource, LocationTracker, TrackerState};
use crate::marker::MarkerLink;
use crate::monitor::{MonitorHandle, ProximityMonitor};
use crate::notify::Notifier;
use crate::store::{SqliteMarkerStore, StoreHandle, StoreResult};

/// A running geomark instance.
///
/// Startup order:
/// 1. Proximity engine (fails fast on bad configuration)
/// 2. Notification permission request
/// 3. Proximity monitor task
/// 4. Marker store, opened in the background with retry, then a monitor refresh
/// 5. Location tracker feeding the monitor
///
/// # Example
///
/// ```ignore
/// let (app, mut links) = GeomarkApp::start(config, source, notifier).await?;
/// app.wait_for_store().await?;
///
/// // Later: graceful shutdown
/// app.shutdown().await;
/// ```
pub struct GeomarkApp<S: LocationSource> {
    store: StoreHandle,
    tracker: LocationTracker<S>,
    tracker_state: TrackerState,
    monitor: MonitorHandle,
    shutdown: CancellationToken,
    monitor_task: JoinHandle<()>,
    store_task: Option<JoinHandle<StoreResult<()>>>,
}

impl<S: LocationSource> std::fmt::Debug for GeomarkApp<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeomarkApp")
            .field("store", &self.store)
            .field("tracker_state", &self.tracker_state)
            .finish_non_exhaustive()
    }
}

impl<S: LocationSource> GeomarkApp<S> {
    /// Start the app with the SQLite store at `config.store_path`.
    ///
    /// The store opens in the background; until it is ready the monitor sees
    /// no markers. Once it opens, the last sample is evaluated again. Returns the app and the receiver for notification taps
    /// resolved to markers.
    pub async fn start<N>(
        config: AppConfig,
        source: Arc<S>,
        notifier: N,
    ) -> Result<(Self, mpsc::UnboundedReceiver<MarkerLink>), AppError>
    where
        N: Notifier + 'static,
    {
        Self::start_internal(config, source, notifier, StoreHandle::uninitialized(), true).await
    }

    /// Start the app on an already prepared store.
    pub async fn start_with_store<N>(
        config: AppConfig,
        source: Arc<S>,
        notifier: N,
        store: StoreHandle,
    ) -> Result<(Self, mpsc::UnboundedReceiver<MarkerLink>), AppError>
    where
        N: Notifier + 'static,
    {
        Self::start_internal(config, source, notifier, store, false).await
    }

    async fn start_internal<N>(
        config: AppConfig,
        source: Arc<S>,
        notifier: N,
        store: StoreHandle,
        open_sqlite: bool,
    ) -> Result<(Self, mpsc::UnboundedReceiver<MarkerLink>), AppError>
    where
        N: Notifier + 'static,
    {
        info!(version = crate::VERSION, "Starting geomark");

        // 1. Engine first so configuration errors surface before anything runs
        let engine = ProximityEngine::builder()
            .notifier(notifier)
            .config(config.engine.clone())
            .build()?;

        // 2. Notifications still get evaluated without permission; the platform drops them
        if !engine.notifier().request_permission() {
            warn!("Notification permission not granted");
        }

        // 3. Monitor reads through the handle, which may still be opening
        let shutdown = CancellationToken::new();
        let (monitor, handle, links) = ProximityMonitor::new(engine, store.clone());
        let token = shutdown.clone();
        let monitor_task = tokio::spawn(async move {
            let engine = monitor.run(token).await;
            debug!(active = engine.active_count(), "Monitor task finished");
        });

        // 4. Samples evaluated before the open finished saw no markers, so refresh once ready
        let store_task = open_sqlite.then(|| {
            let init = store.clone();
            let monitor = handle.clone();
            let path = config.store_path.clone();
            let retry = config.store_retry;
            tokio::spawn(async move {
                let result = init
                    .initialize_with_retry(|| SqliteMarkerStore::open_blocking(path.clone()), retry)
                    .await;
                if result.is_ok() {
                    monitor.refresh();
                }
                result
            })
        });

        // 5. Tracker last: its first sample goes straight to the monitor
        let tracker = LocationTracker::new(source, config.location.clone());
        let samples = handle.sample_sender();
        let tracker_state = tracker
            .start(move |sample| {
                let _ = samples.send(sample);
            })
            .await;
        match &tracker_state {
            TrackerState::Tracking => info!("Geomark started"),
            other => warn!(state = ?other, "Geomark started without location tracking"),
        }

        Ok((
            Self {
                store,
                tracker,
                tracker_state,
                monitor: handle,
                shutdown,
                monitor_task,
                store_task,
            },
            links,
        ))
    }

    /// Wait until the background store open finishes.
    ///
    /// Returns the open error if every attempt failed. No-op when the store
    /// was supplied ready-made or this was already awaited.
    pub async fn wait_for_store(&mut self) -> Result<(), AppError> {
        let Some(task) = self.store_task.take() else {
            return Ok(());
        };
        task.await.map_err(|e| AppError::Task(e.to_string()))??;
        Ok(())
    }

    /// Marker store shared with the monitor.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Handle for feeding the monitor (taps, refresh, reset).
    pub fn monitor(&self) -> &MonitorHandle {
        &self.monitor
    }

    /// The location tracker.
    pub fn tracker(&self) -> &LocationTracker<S> {
        &self.tracker
    }

    /// Tracker state right after startup.
    pub fn tracker_state(&self) -> &TrackerState {
        &self.tracker_state
    }

    /// Stop tracking, stop the monitor and wait for it to finish.
    pub async fn shutdown(self) {
        info!("Shutting down geomark");

        self.tracker.stop();
        self.shutdown.cancel();
        if let Err(e) = self.monitor_task.await {
            warn!(error = %e, "Monitor task ended abnormally");
        }
        if let Some(task) = self.store_task {
            task.abort();
        }

        info!("Geomark shutdown complete");
    }
}
