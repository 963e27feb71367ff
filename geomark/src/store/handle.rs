//! Store handle with deferred initialization.
//!
//! The database is opened in the background at startup. Until that finishes,
//! reads return empty lists (and log a warning) while writes are refused.
//!
//! ```text
//!   uninitialized ──initialize_with_retry──► ready
//!        │                                     │
//!   get_* → []                            delegate to store
//!   add/delete → Unavailable
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{error, info, warn};

use super::{MarkerStore, StoreError, StoreResult};
use crate::marker::{ImageId, Marker, MarkerId, MarkerImage, NewMarker, NewMarkerImage};

/// Default number of retries after the first failed open.
pub const DEFAULT_OPEN_RETRIES: u32 = 3;

/// Default delay between open attempts.
pub const DEFAULT_OPEN_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Fixed-delay retry settings for opening the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Delay between attempts.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: DEFAULT_OPEN_RETRIES,
            delay: DEFAULT_OPEN_RETRY_DELAY,
        }
    }
}

impl RetryConfig {
    /// A single attempt with no retries.
    pub fn none() -> Self {
        Self {
            retries: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Shared handle to a store that may not be open yet.
#[derive(Clone, Default)]
pub struct StoreHandle {
    store: Arc<RwLock<Option<Arc<dyn MarkerStore>>>>,
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl StoreHandle {
    /// A handle with no store behind it yet.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    /// A handle that is ready immediately.
    pub fn ready(store: Arc<dyn MarkerStore>) -> Self {
        let handle = Self::default();
        handle.set_store(store);
        handle
    }

    /// Install the store. Later calls replace it.
    pub fn set_store(&self, store: Arc<dyn MarkerStore>) {
        *self.store.write() = Some(store);
    }

    /// Whether a store has been installed.
    pub fn is_initialized(&self) -> bool {
        self.store.read().is_some()
    }

    /// Try `open` until it succeeds or the retries run out, then install the store.
    ///
    /// On final failure the handle stays uninitialized and the last error is returned.
    pub async fn initialize_with_retry<S, F, Fut>(
        &self,
        mut open: F,
        retry: RetryConfig,
    ) -> StoreResult<()>
    where
        S: MarkerStore + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<S>>,
    {
        let attempts = retry.retries + 1;
        let mut attempt = 1;
        loop {
            match open().await {
                Ok(store) => {
                    self.set_store(Arc::new(store));
                    info!(attempt, "Marker store initialized");
                    return Ok(());
                }
                Err(e) if attempt < attempts => {
                    warn!(attempt, attempts, error = %e, "Failed to open marker store, retrying");
                    tokio::time::sleep(retry.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempts, error = %e, "Giving up opening marker store");
                    return Err(e);
                }
            }
        }
    }

    fn current(&self) -> Option<Arc<dyn MarkerStore>> {
        self.store.read().clone()
    }
}

impl MarkerStore for StoreHandle {
    fn get_markers(&self) -> BoxFuture<'_, StoreResult<Vec<Marker>>> {
        match self.current() {
            Some(store) => async move { store.get_markers().await }.boxed(),
            None => {
                warn!("Marker store not initialized, returning no markers");
                async { Ok(Vec::new()) }.boxed()
            }
        }
    }

    fn add_marker(&self, marker: NewMarker) -> BoxFuture<'_, StoreResult<MarkerId>> {
        match self.current() {
            Some(store) => async move { store.add_marker(marker).await }.boxed(),
            None => async { Err(StoreError::Unavailable) }.boxed(),
        }
    }

    fn delete_marker(&self, id: MarkerId) -> BoxFuture<'_, StoreResult<bool>> {
        match self.current() {
            Some(store) => async move { store.delete_marker(id).await }.boxed(),
            None => async { Err(StoreError::Unavailable) }.boxed(),
        }
    }

    fn add_image(&self, image: NewMarkerImage) -> BoxFuture<'_, StoreResult<ImageId>> {
        match self.current() {
            Some(store) => async move { store.add_image(image).await }.boxed(),
            None => async { Err(StoreError::Unavailable) }.boxed(),
        }
    }

    fn delete_image(&self, id: ImageId) -> BoxFuture<'_, StoreResult<bool>> {
        match self.current() {
            Some(store) => async move { store.delete_image(id).await }.boxed(),
            None => async { Err(StoreError::Unavailable) }.boxed(),
        }
    }

    fn get_marker_images(&self, marker_id: MarkerId) -> BoxFuture<'_, StoreResult<Vec<MarkerImage>>> {
        match self.current() {
            Some(store) => async move { store.get_marker_images(marker_id).await }.boxed(),
            None => {
                warn!(marker_id, "Marker store not initialized, returning no images");
                async { Ok(Vec::new()) }.boxed()
            }
        }
    }
}
