//! Notification service interface.
//!
//! The [`Notifier`] trait is the narrow contract the engine needs from the
//! platform notification service: schedule a notification, cancel it if it has
//! not been delivered yet, and dismiss it if it has.
//!
//! Calls are expected to return immediately. Platforms whose native API is
//! asynchronous should hand the request to their own queue and return an id
//! they control, so the engine never blocks on delivery.
//!
//! When the user taps a notification the platform reports a [`NotificationTap`]
//! carrying the correlation payload; the monitor resolves it to a marker.

mod console;
mod recording;

pub use console::ConsoleNotifier;
pub use recording::{NotifierCall, RecordingNotifier};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::marker::MarkerId;

/// Errors from the platform notification service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// The user has not granted (or has revoked) notification permission.
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The platform rejected the call.
    #[error("Notification platform error: {0}")]
    Platform(String),
}

/// Opaque id returned by the platform for a scheduled notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotificationId(String);

impl NotificationId {
    /// Wrap a platform id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw platform id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlation data attached to every proximity notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub marker_id: MarkerId,
}

impl NotificationPayload {
    /// Payload for `marker_id`.
    pub fn new(marker_id: MarkerId) -> Self {
        Self { marker_id }
    }

    /// Encode as the JSON object delivered back on tap.
    pub fn to_json(&self) -> String {
        // Serializing a struct of one integer cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"markerId\":{}}}", self.marker_id))
    }

    /// Decode a tap payload.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A notification to be shown immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub payload: NotificationPayload,
}

/// A user tap on a delivered notification, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTap {
    /// Raw payload as delivered by the platform.
    pub payload: String,
}

impl NotificationTap {
    /// Create a tap event from a raw payload.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The marker the tapped notification refers to, if the payload is intact.
    pub fn marker_id(&self) -> Option<MarkerId> {
        NotificationPayload::from_json(&self.payload)
            .ok()
            .map(|p| p.marker_id)
    }
}

/// Platform notification service.
///
/// Implementations must be cheap and non-blocking: the engine calls these
/// methods inline while evaluating a location sample.
pub trait Notifier: Send + Sync {
    /// Ask the user for notification permission. Returns whether it is granted.
    fn request_permission(&self) -> bool;

    /// Show a notification now and return its platform id.
    fn schedule(&self, request: &NotificationRequest) -> Result<NotificationId, NotifyError>;

    /// Cancel a notification that has not been delivered yet.
    fn cancel_scheduled(&self, id: &NotificationId) -> Result<(), NotifyError>;

    /// Remove a delivered notification from the notification centre.
    fn dismiss(&self, id: &NotificationId) -> Result<(), NotifyError>;
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn request_permission(&self) -> bool {
        (**self).request_permission()
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<NotificationId, NotifyError> {
        (**self).schedule(request)
    }

    fn cancel_scheduled(&self, id: &NotificationId) -> Result<(), NotifyError> {
        (**self).cancel_scheduled(id)
    }

    fn dismiss(&self, id: &NotificationId) -> Result<(), NotifyError> {
        (**self).dismiss(id)
    }
}
