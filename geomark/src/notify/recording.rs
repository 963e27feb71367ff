//! In-memory notifier that records every call.
//!
//! Used by tests and by hosts that want to inspect what would have been shown
//! without touching a real notification centre.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use super::{NotificationId, NotificationRequest, Notifier, NotifyError};
use crate::marker::MarkerId;

/// A single recorded notifier call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Scheduled {
        id: NotificationId,
        request: NotificationRequest,
    },
    Cancelled(NotificationId),
    Dismissed(NotificationId),
}

/// Notifier that records calls and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<NotifierCall>>,
    next_id: AtomicU64,
    fail_schedule: AtomicBool,
    fail_dismiss: AtomicBool,
    deny_permission: AtomicBool,
}

impl RecordingNotifier {
    /// Create a notifier that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `schedule` calls fail with a platform error.
    pub fn set_fail_schedule(&self, fail: bool) {
        self.fail_schedule.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `dismiss` calls fail with a platform error.
    pub fn set_fail_dismiss(&self, fail: bool) {
        self.fail_dismiss.store(fail, Ordering::SeqCst);
    }

    /// Make permission requests and scheduling report a denied permission.
    pub fn set_deny_permission(&self, deny: bool) {
        self.deny_permission.store(deny, Ordering::SeqCst);
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().clone()
    }

    /// Marker ids of every successfully scheduled notification, in order.
    pub fn scheduled_markers(&self) -> Vec<MarkerId> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                NotifierCall::Scheduled { request, .. } => Some(request.payload.marker_id),
                _ => None,
            })
            .collect()
    }

    /// Number of cancel calls.
    pub fn cancelled_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, NotifierCall::Cancelled(_)))
            .count()
    }

    /// Number of dismiss calls that reached the notifier.
    pub fn dismissed_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, NotifierCall::Dismissed(_)))
            .count()
    }

    /// Forget all recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn request_permission(&self) -> bool {
        !self.deny_permission.load(Ordering::SeqCst)
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<NotificationId, NotifyError> {
        if self.deny_permission.load(Ordering::SeqCst) {
            return Err(NotifyError::PermissionDenied);
        }
        if self.fail_schedule.load(Ordering::SeqCst) {
            return Err(NotifyError::Platform("schedule rejected".to_string()));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = NotificationId::new(format!("notification-{}", n));
        self.calls.lock().push(NotifierCall::Scheduled {
            id: id.clone(),
            request: request.clone(),
        });
        Ok(id)
    }

    fn cancel_scheduled(&self, id: &NotificationId) -> Result<(), NotifyError> {
        self.calls.lock().push(NotifierCall::Cancelled(id.clone()));
        Ok(())
    }

    fn dismiss(&self, id: &NotificationId) -> Result<(), NotifyError> {
        if self.fail_dismiss.load(Ordering::SeqCst) {
            return Err(NotifyError::Platform("already dismissed".to_string()));
        }
        self.calls.lock().push(NotifierCall::Dismissed(id.clone()));
        Ok(())
    }
}
