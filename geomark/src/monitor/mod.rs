//! Proximity monitor.
//!
//! The [`ProximityMonitor`] owns the [`ProximityEngine`] and is the only task
//! that touches it. Location samples, notification taps and control commands
//! arrive on channels and are handled one at a time, so engine state never
//! sees concurrent evaluations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ProximityMonitor                        │
//! │                                                               │
//! │  MonitorCommand ──┐                                           │
//! │  NotificationTap ─┼──► select! (biased) ──► handler           │
//! │  LocationSample ──┘          │                                │
//! │                              ├─ sample: drain queue, load     │
//! │                              │  markers once, evaluate each   │
//! │                              ├─ tap: resolve ──► MarkerLink   │
//! │                              └─ command: reset / refresh      │
//! │                                                               │
//! │  MonitorStatus ◄── watch channel (active ids, last sample)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let (monitor, handle, mut links) = ProximityMonitor::new(engine, store);
//! let shutdown = CancellationToken::new();
//! tokio::spawn(monitor.run(shutdown.clone()));
//!
//! handle.submit_sample(sample);
//! ```

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::ProximityEngine;
use crate::location::LocationSample;
use crate::marker::{MarkerId, MarkerLink};
use crate::notify::{NotificationTap, Notifier};
use crate::store::MarkerStore;

/// Control messages for a running monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Forget the active state of one marker so it can notify again.
    ResetMarker(MarkerId),
    /// Re-evaluate the last sample against a fresh marker list.
    ///
    /// Hosts send this after editing markers so deletions retract promptly.
    Refresh,
}

/// Snapshot of monitor progress, published after every handled message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorStatus {
    /// Markers with a live notification, ascending.
    pub active: Vec<MarkerId>,
    /// Most recent sample evaluated.
    pub last_sample: Option<LocationSample>,
    /// Number of completed evaluations.
    pub evaluations: u64,
    /// Samples evaluated against a marker list loaded for an earlier queued sample.
    pub batched: u64,
    /// Evaluations skipped because the marker list could not be loaded.
    pub store_errors: u64,
}

/// Sending side of a monitor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    samples: mpsc::UnboundedSender<LocationSample>,
    taps: mpsc::UnboundedSender<NotificationTap>,
    commands: mpsc::UnboundedSender<MonitorCommand>,
    status: watch::Receiver<MonitorStatus>,
}

impl MonitorHandle {
    /// Queue a location sample. Returns false once the monitor has stopped.
    pub fn submit_sample(&self, sample: LocationSample) -> bool {
        self.samples.send(sample).is_ok()
    }

    /// Sender suitable for moving into a tracker callback.
    pub fn sample_sender(&self) -> mpsc::UnboundedSender<LocationSample> {
        self.samples.clone()
    }

    /// Report a notification tap.
    pub fn submit_tap(&self, tap: NotificationTap) -> bool {
        self.taps.send(tap).is_ok()
    }

    /// Allow `marker_id` to notify again.
    pub fn reset_marker(&self, marker_id: MarkerId) -> bool {
        self.commands.send(MonitorCommand::ResetMarker(marker_id)).is_ok()
    }

    /// Re-run the last evaluation against the current markers.
    pub fn refresh(&self) -> bool {
        self.commands.send(MonitorCommand::Refresh).is_ok()
    }

    /// Latest published status.
    pub fn status(&self) -> MonitorStatus {
        self.status.borrow().clone()
    }

    /// Watch status updates.
    pub fn subscribe_status(&self) -> watch::Receiver<MonitorStatus> {
        self.status.clone()
    }
}

/// Single-task owner of the proximity engine.
pub struct ProximityMonitor<N: Notifier, M: MarkerStore> {
    engine: ProximityEngine<N>,
    store: M,
    samples: mpsc::UnboundedReceiver<LocationSample>,
    taps: mpsc::UnboundedReceiver<NotificationTap>,
    commands: mpsc::UnboundedReceiver<MonitorCommand>,
    links: mpsc::UnboundedSender<MarkerLink>,
    status_tx: watch::Sender<MonitorStatus>,
    status: MonitorStatus,
}

impl<N, M> ProximityMonitor<N, M>
where
    N: Notifier + 'static,
    M: MarkerStore + 'static,
{
    /// Create a monitor around `engine`, reading markers from `store`.
    ///
    /// Returns the monitor, a handle for feeding it, and the receiver for
    /// marker links produced by notification taps.
    pub fn new(
        engine: ProximityEngine<N>,
        store: M,
    ) -> (Self, MonitorHandle, mpsc::UnboundedReceiver<MarkerLink>) {
        let (samples_tx, samples_rx) = mpsc::unbounded_channel();
        let (taps_tx, taps_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (links_tx, links_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(MonitorStatus::default());

        let monitor = Self {
            engine,
            store,
            samples: samples_rx,
            taps: taps_rx,
            commands: commands_rx,
            links: links_tx,
            status_tx,
            status: MonitorStatus::default(),
        };
        let handle = MonitorHandle {
            samples: samples_tx,
            taps: taps_tx,
            commands: commands_tx,
            status: status_rx,
        };
        (monitor, handle, links_rx)
    }

    /// Run until `shutdown` fires or every handle is dropped.
    ///
    /// Returns the engine so callers can inspect final state.
    pub async fn run(mut self, shutdown: CancellationToken) -> ProximityEngine<N> {
        info!("Proximity monitor started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Proximity monitor shutting down");
                    break;
                }

                Some(command) = self.commands.recv() => {
                    self.handle_command(command).await;
                }

                Some(tap) = self.taps.recv() => {
                    self.handle_tap(tap).await;
                }

                Some(sample) = self.samples.recv() => {
                    let batch = self.drain_samples(sample);
                    self.handle_samples(batch).await;
                }

                else => {
                    debug!("All monitor handles dropped");
                    break;
                }
            }
        }

        info!(
            evaluations = self.status.evaluations,
            active = self.engine.active_count(),
            "Proximity monitor stopped"
        );
        self.engine
    }

    /// Take every sample already queued behind `first`, oldest first.
    ///
    /// Each one is still evaluated: a skipped sample inside a radius would be
    /// a lost entry.
    fn drain_samples(&mut self, first: LocationSample) -> Vec<LocationSample> {
        let mut batch = vec![first];
        while let Ok(next) = self.samples.try_recv() {
            batch.push(next);
        }
        self.status.batched += (batch.len() - 1) as u64;
        batch
    }

    async fn handle_samples(&mut self, batch: Vec<LocationSample>) {
        let markers = match self.store.get_markers().await {
            Ok(markers) => markers,
            Err(e) => {
                warn!(error = %e, "Could not load markers, skipping evaluation");
                self.status.store_errors += 1;
                self.publish();
                return;
            }
        };

        for sample in batch {
            let report = self.engine.evaluate(&sample, &markers);
            debug!(
                near = report.near.len(),
                notified = report.notified.len(),
                retracted = report.retracted.len(),
                "Sample evaluated"
            );

            self.status.evaluations += 1;
            self.status.last_sample = Some(sample);
        }
        self.publish();
    }

    async fn handle_tap(&mut self, tap: NotificationTap) {
        let Some(marker_id) = tap.marker_id() else {
            warn!(payload = %tap.payload, "Notification tap without a marker id");
            return;
        };

        let markers = match self.store.get_markers().await {
            Ok(markers) => markers,
            Err(e) => {
                warn!(marker_id, error = %e, "Could not load markers for notification tap");
                return;
            }
        };

        match markers.iter().find(|m| m.id == marker_id) {
            Some(marker) => {
                info!(marker_id, "Opening marker from notification");
                if self.links.send(MarkerLink::from(marker)).is_err() {
                    debug!(marker_id, "No one is listening for marker links");
                }
            }
            None => info!(marker_id, "Tapped notification for a marker that no longer exists"),
        }
    }

    async fn handle_command(&mut self, command: MonitorCommand) {
        match command {
            MonitorCommand::ResetMarker(marker_id) => {
                self.engine.reset(marker_id);
                self.publish();
            }
            MonitorCommand::Refresh => match self.status.last_sample {
                Some(sample) => self.handle_samples(vec![sample]).await,
                None => debug!("Refresh requested before any sample arrived"),
            },
        }
    }

    fn publish(&mut self) {
        self.status.active = self.engine.active_ids();
        self.status_tx.send_replace(self.status.clone());
    }
}
