//! SQLite-backed marker store.
//!
//! A single connection sits behind a mutex. Every call runs on the blocking
//! pool so the async runtime never waits on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::schema::{self, format_timestamp, parse_timestamp};
use super::{MarkerStore, StoreError, StoreResult};
use crate::marker::{
    ImageId, Marker, MarkerColor, MarkerId, MarkerImage, NewMarker, NewMarkerImage,
};

/// Marker store backed by a SQLite file.
#[derive(Clone)]
pub struct SqliteMarkerStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteMarkerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteMarkerStore")
            .field("path", &self.path)
            .finish()
    }
}

impl SqliteMarkerStore {
    /// Open (or create) the database at `path` and migrate it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)?;
        schema::migrate(&mut conn)?;
        info!(path = %path.display(), "Marker database opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    /// [`open`](Self::open) on the blocking pool, for callers on the async runtime.
    pub async fn open_blocking(path: PathBuf) -> StoreResult<Self> {
        tokio::task::spawn_blocking(move || Self::open(&path))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let mut conn = Connection::open_in_memory()?;
        schema::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Schema version recorded in the database.
    pub fn schema_version(&self) -> StoreResult<i64> {
        schema::current_version(&self.conn.lock())
    }

    fn run<T, F>(&self, op: F) -> BoxFuture<'_, StoreResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        async move {
            tokio::task::spawn_blocking(move || {
                let mut conn = conn.lock();
                op(&mut conn)
            })
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
        }
        .boxed()
    }
}

fn marker_from_row(row: &Row<'_>) -> rusqlite::Result<Marker> {
    let color: Option<String> = row.get("color")?;
    let created_at: Option<String> = row.get("created_at")?;
    Ok(Marker {
        id: row.get("id")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        title: row.get("title")?,
        description: row.get("description")?,
        color: MarkerColor::resolve(color.as_deref()),
        created_at: created_at
            .as_deref()
            .map(parse_timestamp)
            .unwrap_or_else(Utc::now),
    })
}

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<MarkerImage> {
    let created_at: Option<String> = row.get("created_at")?;
    Ok(MarkerImage {
        id: row.get("id")?,
        uri: row.get("uri")?,
        marker_id: row.get("marker_id")?,
        created_at: created_at
            .as_deref()
            .map(parse_timestamp)
            .unwrap_or_else(Utc::now),
    })
}

fn marker_exists(conn: &Connection, id: MarkerId) -> StoreResult<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM markers WHERE id = ?1", [id], |_| Ok(()))
        .optional()?
        .is_some())
}

impl MarkerStore for SqliteMarkerStore {
    fn get_markers(&self) -> BoxFuture<'_, StoreResult<Vec<Marker>>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, latitude, longitude, title, description, color, created_at
                 FROM markers ORDER BY created_at DESC, id DESC",
            )?;
            let markers = stmt
                .query_map([], marker_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(markers)
        })
    }

    fn add_marker(&self, marker: NewMarker) -> BoxFuture<'_, StoreResult<MarkerId>> {
        if let Err(e) = marker.validate() {
            return async move { Err(StoreError::from(e)) }.boxed();
        }
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO markers (latitude, longitude, title, description, color, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    marker.latitude,
                    marker.longitude,
                    marker.title,
                    marker.description,
                    marker.color.name(),
                    format_timestamp(Utc::now()),
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(marker_id = id, title = %marker.title, "Marker added");
            Ok(id)
        })
    }

    fn delete_marker(&self, id: MarkerId) -> BoxFuture<'_, StoreResult<bool>> {
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let images = tx.execute("DELETE FROM marker_images WHERE marker_id = ?1", [id])?;
            let markers = tx.execute("DELETE FROM markers WHERE id = ?1", [id])?;
            tx.commit()?;
            debug!(marker_id = id, images, existed = markers > 0, "Marker deleted");
            Ok(markers > 0)
        })
    }

    fn add_image(&self, image: NewMarkerImage) -> BoxFuture<'_, StoreResult<ImageId>> {
        if let Err(e) = image.validate() {
            return async move { Err(StoreError::from(e)) }.boxed();
        }
        self.run(move |conn| {
            if !marker_exists(conn, image.marker_id)? {
                return Err(StoreError::MarkerNotFound(image.marker_id));
            }
            conn.execute(
                "INSERT INTO marker_images (marker_id, uri, created_at) VALUES (?1, ?2, ?3)",
                params![image.marker_id, image.uri, format_timestamp(Utc::now())],
            )?;
            let id = conn.last_insert_rowid();
            debug!(image_id = id, marker_id = image.marker_id, "Image added");
            Ok(id)
        })
    }

    fn delete_image(&self, id: ImageId) -> BoxFuture<'_, StoreResult<bool>> {
        self.run(move |conn| {
            let deleted = conn.execute("DELETE FROM marker_images WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    fn get_marker_images(&self, marker_id: MarkerId) -> BoxFuture<'_, StoreResult<Vec<MarkerImage>>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, marker_id, uri, created_at FROM marker_images
                 WHERE marker_id = ?1 ORDER BY created_at DESC, id DESC",
            )?;
            let images = stmt
                .query_map([marker_id], image_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(images)
        })
    }
}
