//! Proximity notification engine.
//!
//! Decides, for every location sample, which markers deserve a notification and
//! which live notifications must be retracted.
//!
//! # State Machine (per marker id)
//!
//! ```text
//! Idle --[marker enters near-set, notification scheduled]--> Active
//! Active --[marker gone from the marker set]--> Idle   (cancel + dismiss)
//! Active --[reset(marker_id)]--> Idle                   (state only)
//! ```
//!
//! Leaving the radius while the marker still exists does not retract. A user
//! who walks away and comes back is therefore not notified a second time until
//! the marker is reset or removed and re-added.
//!
//! A failed schedule leaves the marker Idle, so the next sample that finds it
//! near retries naturally.

mod state;

pub use state::ActiveNotification;

use std::collections::HashSet;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::coord::{is_within_radius, NOTIFICATION_RADIUS_METERS};
use crate::location::LocationSample;
use crate::marker::{Marker, MarkerId};
use crate::notify::{NotificationPayload, NotificationRequest, Notifier};
use state::NotificationState;

/// Default notification title.
pub const DEFAULT_NOTIFICATION_TITLE: &str = "You are near a marker!";

/// Engine construction errors.
///
/// These are programmer errors: a correctly wired host never sees them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The engine was built without a notifier.
    #[error("Proximity engine is not configured: {0}")]
    NotConfigured(&'static str),

    /// The radius is not a positive, finite number of metres.
    #[error("Invalid notification radius: {0}")]
    InvalidRadius(f64),
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Radius around each marker in metres (boundary inclusive).
    pub radius_meters: f64,
    /// Notification title.
    pub title: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            radius_meters: NOTIFICATION_RADIUS_METERS,
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }
}

/// Outcome of a single [`ProximityEngine::evaluate`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    /// Markers within the radius of the sample, in marker-list order.
    pub near: Vec<MarkerId>,
    /// Markers that got a new notification.
    pub notified: Vec<MarkerId>,
    /// Markers whose notification was retracted.
    pub retracted: Vec<MarkerId>,
    /// Markers that were near and idle but whose notification failed.
    pub failed: Vec<MarkerId>,
    /// Markers skipped because their coordinates are unusable.
    pub malformed: Vec<MarkerId>,
}

impl EvaluationReport {
    /// True when the call changed nothing.
    pub fn is_noop(&self) -> bool {
        self.notified.is_empty() && self.retracted.is_empty()
    }
}

/// The deduplication engine.
///
/// Owns its notification state exclusively. Callers serialize access by
/// owning the engine in a single task (see [`crate::monitor`]).
pub struct ProximityEngine<N: Notifier> {
    notifier: N,
    config: EngineConfig,
    state: NotificationState,
}

impl<N: Notifier> std::fmt::Debug for ProximityEngine<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProximityEngine")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<N: Notifier> ProximityEngine<N> {
    /// Create an engine with the default configuration.
    pub fn new(notifier: N) -> Self {
        Self {
            notifier,
            config: EngineConfig::default(),
            state: NotificationState::default(),
        }
    }

    /// Start building an engine with a custom configuration.
    pub fn builder() -> ProximityEngineBuilder<N> {
        ProximityEngineBuilder::new()
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The notifier this engine drives.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Process one location sample against the current marker set.
    ///
    /// Never fails: notifier errors are logged and reflected in the report.
    pub fn evaluate(&mut self, sample: &LocationSample, markers: &[Marker]) -> EvaluationReport {
        let mut report = EvaluationReport::default();
        let mut current: HashSet<MarkerId> = HashSet::with_capacity(markers.len());
        let mut near_seen: HashSet<MarkerId> = HashSet::new();

        debug!(
            lat = sample.latitude,
            lon = sample.longitude,
            mocked = sample.mocked,
            markers = markers.len(),
            "Checking distance to markers"
        );

        for marker in markers {
            current.insert(marker.id);

            if !marker.has_valid_position() {
                warn!(
                    marker_id = marker.id,
                    lat = marker.latitude,
                    lon = marker.longitude,
                    "Skipping marker with malformed coordinates"
                );
                report.malformed.push(marker.id);
                continue;
            }

            let near = is_within_radius(
                sample.latitude,
                sample.longitude,
                marker.latitude,
                marker.longitude,
                self.config.radius_meters,
            );
            if near && near_seen.insert(marker.id) {
                report.near.push(marker.id);
            }
        }

        // Entry: notify every near marker that is not already active
        for marker in markers {
            if !near_seen.contains(&marker.id)
                || self.state.contains(marker.id)
                || report.failed.contains(&marker.id)
            {
                continue;
            }
            if self.notify(marker) {
                report.notified.push(marker.id);
            } else {
                report.failed.push(marker.id);
            }
        }

        // Retraction: only for markers that vanished from the set entirely
        for marker_id in self.state.missing_from(&current) {
            self.retract(marker_id);
            report.retracted.push(marker_id);
        }

        if !report.is_noop() {
            info!(
                notified = report.notified.len(),
                retracted = report.retracted.len(),
                active = self.state.len(),
                "Proximity state changed"
            );
        }

        report
    }

    /// Number of notifications currently shown and not retracted.
    pub fn active_count(&self) -> usize {
        self.state.len()
    }

    /// Whether `marker_id` currently has a live notification.
    pub fn is_active(&self, marker_id: MarkerId) -> bool {
        self.state.contains(marker_id)
    }

    /// Details of the live notification for `marker_id`.
    pub fn active(&self, marker_id: MarkerId) -> Option<&ActiveNotification> {
        self.state.get(marker_id)
    }

    /// Ids with a live notification, ascending.
    pub fn active_ids(&self) -> Vec<MarkerId> {
        self.state.ids()
    }

    /// Forget the active state of one marker so it can notify again.
    ///
    /// The notification itself is left alone; this is for hosts whose marker
    /// data changed underneath the engine. Returns whether the marker was active.
    pub fn reset(&mut self, marker_id: MarkerId) -> bool {
        let was_active = self.state.remove(marker_id).is_some();
        debug!(marker_id, was_active, "Marker notification state reset");
        was_active
    }

    fn notify(&mut self, marker: &Marker) -> bool {
        let request = NotificationRequest {
            title: self.config.title.clone(),
            body: format!("You are near \"{}\"", marker.title),
            payload: NotificationPayload::new(marker.id),
        };

        match self.notifier.schedule(&request) {
            Ok(notification_id) => {
                info!(
                    marker_id = marker.id,
                    title = %marker.title,
                    notification_id = %notification_id,
                    "Proximity notification shown"
                );
                self.state.insert(
                    marker.id,
                    ActiveNotification {
                        notification_id,
                        first_shown_at: Utc::now(),
                    },
                );
                true
            }
            Err(e) => {
                warn!(
                    marker_id = marker.id,
                    error = %e,
                    "Failed to show proximity notification, will retry on next entry"
                );
                false
            }
        }
    }

    fn retract(&mut self, marker_id: MarkerId) {
        let Some(active) = self.state.remove(marker_id) else {
            return;
        };

        if let Err(e) = self.notifier.cancel_scheduled(&active.notification_id) {
            warn!(
                marker_id,
                notification_id = %active.notification_id,
                error = %e,
                "Failed to cancel scheduled notification"
            );
        }
        if let Err(e) = self.notifier.dismiss(&active.notification_id) {
            debug!(
                marker_id,
                notification_id = %active.notification_id,
                error = %e,
                "Could not dismiss notification"
            );
        }

        info!(
            marker_id,
            notification_id = %active.notification_id,
            "Notification retracted for removed marker"
        );
    }
}

/// Builder for [`ProximityEngine`].
#[derive(Debug)]
pub struct ProximityEngineBuilder<N: Notifier> {
    notifier: Option<N>,
    config: EngineConfig,
}

impl<N: Notifier> Default for ProximityEngineBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Notifier> ProximityEngineBuilder<N> {
    /// Empty builder with default configuration.
    pub fn new() -> Self {
        Self {
            notifier: None,
            config: EngineConfig::default(),
        }
    }

    /// Notifier to drive. Required.
    pub fn notifier(mut self, notifier: N) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Radius in metres.
    pub fn radius_meters(mut self, radius: f64) -> Self {
        self.config.radius_meters = radius;
        self
    }

    /// Notification title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<ProximityEngine<N>, EngineError> {
        let notifier = self
            .notifier
            .ok_or(EngineError::NotConfigured("no notifier provided"))?;

        let radius = self.config.radius_meters;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(EngineError::InvalidRadius(radius));
        }

        Ok(ProximityEngine {
            notifier,
            config: self.config,
            state: NotificationState::default(),
        })
    }
}

#[cfg(test)]
mod tests;
