//! Marker persistence.
//!
//! The [`MarkerStore`] trait is the persistence contract the rest of the crate
//! depends on. Two providers implement it:
//!
//! - [`SqliteMarkerStore`] - the real store, a small SQLite catalog
//! - [`MemoryMarkerStore`] - an explicit in-process store for tests and demos
//!
//! [`StoreHandle`] wraps a store that may not be initialized yet. Reads before
//! initialization degrade to empty lists; writes fail with
//! [`StoreError::Unavailable`].
//!
//! # Dyn Compatibility
//!
//! Async methods return boxed futures so stores can be shared as
//! `Arc<dyn MarkerStore>`.

mod handle;
mod memory;
mod schema;
mod sqlite;

pub use handle::{RetryConfig, StoreHandle, DEFAULT_OPEN_RETRIES, DEFAULT_OPEN_RETRY_DELAY};
pub use memory::MemoryMarkerStore;
pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteMarkerStore;

use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::marker::{ImageId, Marker, MarkerError, MarkerId, MarkerImage, NewMarker, NewMarkerImage};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store has not been initialized yet.
    #[error("Marker store is not initialized")]
    Unavailable,

    /// SQLite reported an error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The referenced marker does not exist.
    #[error("Marker {0} not found")]
    MarkerNotFound(MarkerId),

    /// Input failed validation.
    #[error("Invalid marker: {0}")]
    Invalid(#[from] MarkerError),

    /// The blocking database task failed.
    #[error("Store task failed: {0}")]
    Task(String),
}

/// Persistence contract for markers and their images.
pub trait MarkerStore: Send + Sync {
    /// All markers, newest first.
    fn get_markers(&self) -> BoxFuture<'_, StoreResult<Vec<Marker>>>;

    /// Insert a marker and return its id.
    fn add_marker(&self, marker: NewMarker) -> BoxFuture<'_, StoreResult<MarkerId>>;

    /// Delete a marker and all its images in one transaction.
    ///
    /// Returns whether the marker existed.
    fn delete_marker(&self, id: MarkerId) -> BoxFuture<'_, StoreResult<bool>>;

    /// Attach an image to an existing marker and return its id.
    fn add_image(&self, image: NewMarkerImage) -> BoxFuture<'_, StoreResult<ImageId>>;

    /// Delete one image. Returns whether it existed.
    fn delete_image(&self, id: ImageId) -> BoxFuture<'_, StoreResult<bool>>;

    /// Images of a marker, newest first.
    fn get_marker_images(&self, marker_id: MarkerId) -> BoxFuture<'_, StoreResult<Vec<MarkerImage>>>;
}

impl<T: MarkerStore + ?Sized> MarkerStore for Arc<T> {
    fn get_markers(&self) -> BoxFuture<'_, StoreResult<Vec<Marker>>> {
        (**self).get_markers()
    }

    fn add_marker(&self, marker: NewMarker) -> BoxFuture<'_, StoreResult<MarkerId>> {
        (**self).add_marker(marker)
    }

    fn delete_marker(&self, id: MarkerId) -> BoxFuture<'_, StoreResult<bool>> {
        (**self).delete_marker(id)
    }

    fn add_image(&self, image: NewMarkerImage) -> BoxFuture<'_, StoreResult<ImageId>> {
        (**self).add_image(image)
    }

    fn delete_image(&self, id: ImageId) -> BoxFuture<'_, StoreResult<bool>> {
        (**self).delete_image(id)
    }

    fn get_marker_images(&self, marker_id: MarkerId) -> BoxFuture<'_, StoreResult<Vec<MarkerImage>>> {
        (**self).get_marker_images(marker_id)
    }
}
