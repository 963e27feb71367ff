//! Active-notification bookkeeping.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::marker::MarkerId;
use crate::notify::NotificationId;

/// A notification that has been issued and not yet retracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNotification {
    /// Platform id returned when the notification was scheduled.
    pub notification_id: NotificationId,
    /// When the notification was issued.
    pub first_shown_at: DateTime<Utc>,
}

/// Marker id → active notification.
///
/// A marker id is a key iff a notification is live for it. Only the engine
/// holds one of these.
#[derive(Debug, Default)]
pub(super) struct NotificationState {
    active: HashMap<MarkerId, ActiveNotification>,
}

impl NotificationState {
    pub(super) fn contains(&self, marker_id: MarkerId) -> bool {
        self.active.contains_key(&marker_id)
    }

    pub(super) fn get(&self, marker_id: MarkerId) -> Option<&ActiveNotification> {
        self.active.get(&marker_id)
    }

    pub(super) fn insert(&mut self, marker_id: MarkerId, notification: ActiveNotification) {
        self.active.insert(marker_id, notification);
    }

    pub(super) fn remove(&mut self, marker_id: MarkerId) -> Option<ActiveNotification> {
        self.active.remove(&marker_id)
    }

    pub(super) fn len(&self) -> usize {
        self.active.len()
    }

    /// Active ids in ascending order.
    pub(super) fn ids(&self) -> Vec<MarkerId> {
        let mut ids: Vec<MarkerId> = self.active.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Active ids that are not in `current`, ascending.
    pub(super) fn missing_from(&self, current: &HashSet<MarkerId>) -> Vec<MarkerId> {
        let mut stale: Vec<MarkerId> = self
            .active
            .keys()
            .filter(|id| !current.contains(id))
            .copied()
            .collect();
        stale.sort_unstable();
        stale
    }
}
