//! Terminal notifier for command-line hosts.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{NotificationId, NotificationRequest, Notifier, NotifyError};

/// Prints notifications to a writer (stdout by default) and logs them.
///
/// Terminal output cannot be retracted, so cancel and dismiss are logged only.
pub struct ConsoleNotifier {
    out: Mutex<Box<dyn Write + Send>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for ConsoleNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleNotifier")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleNotifier {
    /// Notifier writing to stdout.
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    /// Notifier writing to an arbitrary sink.
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicU64::new(0),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn request_permission(&self) -> bool {
        true
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<NotificationId, NotifyError> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = NotificationId::new(format!("console-{}", n));

        let mut out = self.out.lock();
        writeln!(out, "🔔 {} {}", request.title, request.body)
            .and_then(|_| out.flush())
            .map_err(|e| NotifyError::Platform(e.to_string()))?;

        info!(
            notification_id = %id,
            marker_id = request.payload.marker_id,
            "Notification shown"
        );
        Ok(id)
    }

    fn cancel_scheduled(&self, id: &NotificationId) -> Result<(), NotifyError> {
        debug!(notification_id = %id, "Cancel requested (console delivers immediately)");
        Ok(())
    }

    fn dismiss(&self, id: &NotificationId) -> Result<(), NotifyError> {
        info!(notification_id = %id, "Notification dismissed");
        Ok(())
    }
}
