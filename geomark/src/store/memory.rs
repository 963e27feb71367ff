//! In-process marker store.

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

use super::{MarkerStore, StoreError, StoreResult};
use crate::marker::{ImageId, Marker, MarkerId, MarkerImage, NewMarker, NewMarkerImage};

#[derive(Debug, Default)]
struct Tables {
    markers: Vec<Marker>,
    images: Vec<MarkerImage>,
    next_marker_id: MarkerId,
    next_image_id: ImageId,
}

/// Marker store that keeps everything in memory.
///
/// Same contract as the SQLite store, including ordering and cascade delete.
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    tables: Mutex<Tables>,
}

impl MemoryMarkerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `markers` as-is, ids included.
    ///
    /// Useful for seeding rows that would fail validation.
    pub fn with_markers(markers: Vec<Marker>) -> Self {
        let next_marker_id = markers.iter().map(|m| m.id).max().unwrap_or(0);
        Self {
            tables: Mutex::new(Tables {
                markers,
                next_marker_id,
                ..Tables::default()
            }),
        }
    }

    fn newest_first<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
        items.sort_by(|a, b| key(b).cmp(&key(a)));
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn get_markers(&self) -> BoxFuture<'_, StoreResult<Vec<Marker>>> {
        let mut markers = self.tables.lock().markers.clone();
        Self::newest_first(&mut markers, |m| (m.created_at, m.id));
        async move { Ok(markers) }.boxed()
    }

    fn add_marker(&self, marker: NewMarker) -> BoxFuture<'_, StoreResult<MarkerId>> {
        let result = marker.validate().map_err(StoreError::from).map(|()| {
            let mut tables = self.tables.lock();
            tables.next_marker_id += 1;
            let id = tables.next_marker_id;
            tables.markers.push(Marker {
                id,
                latitude: marker.latitude,
                longitude: marker.longitude,
                title: marker.title,
                description: marker.description,
                color: marker.color,
                created_at: Utc::now(),
            });
            id
        });
        async move { result }.boxed()
    }

    fn delete_marker(&self, id: MarkerId) -> BoxFuture<'_, StoreResult<bool>> {
        let existed = {
            let mut tables = self.tables.lock();
            tables.images.retain(|i| i.marker_id != id);
            let before = tables.markers.len();
            tables.markers.retain(|m| m.id != id);
            tables.markers.len() != before
        };
        async move { Ok(existed) }.boxed()
    }

    fn add_image(&self, image: NewMarkerImage) -> BoxFuture<'_, StoreResult<ImageId>> {
        let result = image.validate().map_err(StoreError::from).and_then(|()| {
            let mut tables = self.tables.lock();
            if !tables.markers.iter().any(|m| m.id == image.marker_id) {
                return Err(StoreError::MarkerNotFound(image.marker_id));
            }
            tables.next_image_id += 1;
            let id = tables.next_image_id;
            tables.images.push(MarkerImage {
                id,
                uri: image.uri,
                marker_id: image.marker_id,
                created_at: Utc::now(),
            });
            Ok(id)
        });
        async move { result }.boxed()
    }

    fn delete_image(&self, id: ImageId) -> BoxFuture<'_, StoreResult<bool>> {
        let existed = {
            let mut tables = self.tables.lock();
            let before = tables.images.len();
            tables.images.retain(|i| i.id != id);
            tables.images.len() != before
        };
        async move { Ok(existed) }.boxed()
    }

    fn get_marker_images(&self, marker_id: MarkerId) -> BoxFuture<'_, StoreResult<Vec<MarkerImage>>> {
        let mut images: Vec<_> = self
            .tables
            .lock()
            .images
            .iter()
            .filter(|i| i.marker_id == marker_id)
            .cloned()
            .collect();
        Self::newest_first(&mut images, |i| (i.created_at, i.id));
        async move { Ok(images) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerColor;

    #[tokio::test]
    async fn test_round_trip_and_order() {
        let store = MemoryMarkerStore::new();
        let a = store.add_marker(NewMarker::new(1.0, 1.0, "a")).await.unwrap();
        let b = store.add_marker(NewMarker::new(2.0, 2.0, "b")).await.unwrap();
        assert_ne!(a, b);

        let ids: Vec<_> = store.get_markers().await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[tokio::test]
    async fn test_cascade_delete() {
        let store = MemoryMarkerStore::new();
        let id = store.add_marker(NewMarker::new(1.0, 1.0, "a")).await.unwrap();
        store.add_image(NewMarkerImage::new(id, "file:///x.jpg")).await.unwrap();

        assert!(store.delete_marker(id).await.unwrap());
        assert!(store.get_marker_images(id).await.unwrap().is_empty());
        assert!(!store.delete_marker(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_image_for_missing_marker() {
        let store = MemoryMarkerStore::new();
        let err = store
            .add_image(NewMarkerImage::new(5, "file:///x.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MarkerNotFound(5)));
    }

    #[tokio::test]
    async fn test_seeded_rows_keep_ids() {
        let seeded = Marker {
            id: 40,
            latitude: f64::NAN,
            longitude: 0.0,
            title: "broken".to_string(),
            description: None,
            color: MarkerColor::Purple,
            created_at: Utc::now(),
        };
        let store = MemoryMarkerStore::with_markers(vec![seeded]);
        let next = store.add_marker(NewMarker::new(1.0, 1.0, "fresh")).await.unwrap();
        assert_eq!(next, 41);
        assert_eq!(store.get_markers().await.unwrap().len(), 2);
    }
}
