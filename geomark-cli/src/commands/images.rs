//! Image commands: attach, list and remove photos on a marker.

use std::path::PathBuf;

use clap::Subcommand;
use console::style;
use geomark::marker::{ImageId, MarkerId, MarkerImage, NewMarkerImage};
use geomark::store::{MarkerStore, StoreError};

use super::common::{block_on, init_quiet_logging, open_store};
use crate::error::CliError;

/// Image subcommands.
#[derive(Debug, Subcommand)]
pub enum ImageCommands {
    /// Attach an image URI to a marker
    Add {
        /// Marker id
        marker_id: MarkerId,

        /// Image location (file path or URI)
        uri: String,
    },

    /// List a marker's images, newest first
    List {
        /// Marker id
        marker_id: MarkerId,
    },

    /// Remove one image
    Delete {
        /// Image id
        id: ImageId,
    },
}

/// Run an image subcommand.
pub fn run(db: Option<PathBuf>, command: ImageCommands) -> Result<(), CliError> {
    let _log = init_quiet_logging()?;
    let store = open_store(db)?;

    match command {
        ImageCommands::Add { marker_id, uri } => {
            let id = block_on(add(&store, marker_id, uri))??;
            println!("{} image {} to marker {}", style("Attached").green().bold(), id, marker_id);
        }
        ImageCommands::List { marker_id } => {
            let images = block_on(store.get_marker_images(marker_id))??;
            if images.is_empty() {
                println!("{}", style("No images").dim());
            } else {
                print!("{}", render_images(&images));
            }
        }
        ImageCommands::Delete { id } => {
            block_on(delete(&store, id))??;
            println!("{} image {}", style("Deleted").green().bold(), id);
        }
    }
    Ok(())
}

async fn add(store: &impl MarkerStore, marker_id: MarkerId, uri: String) -> Result<ImageId, CliError> {
    match store.add_image(NewMarkerImage::new(marker_id, uri)).await {
        Ok(id) => Ok(id),
        Err(StoreError::MarkerNotFound(id)) => {
            Err(CliError::NotFound(format!("No marker with id {}", id)))
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete(store: &impl MarkerStore, id: ImageId) -> Result<(), CliError> {
    if store.delete_image(id).await? {
        Ok(())
    } else {
        Err(CliError::NotFound(format!("No image with id {}", id)))
    }
}

fn render_images(images: &[MarkerImage]) -> String {
    images
        .iter()
        .map(|image| {
            format!(
                "{:>5}  {}  {}\n",
                image.id,
                image.created_at.format("%Y-%m-%d %H:%M:%S"),
                image.uri
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geomark::marker::NewMarker;
    use geomark::store::MemoryMarkerStore;

    #[tokio::test]
    async fn test_add_to_missing_marker_is_not_found() {
        let store = MemoryMarkerStore::new();
        let err = add(&store, 7, "file:///a.jpg".to_string()).await.unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_list_delete() {
        let store = MemoryMarkerStore::new();
        let marker = store
            .add_marker(NewMarker::new(58.01, 56.23, "Embankment"))
            .await
            .unwrap();

        let image = add(&store, marker, "file:///river.jpg".to_string())
            .await
            .unwrap();
        let listing = render_images(&store.get_marker_images(marker).await.unwrap());
        assert!(listing.contains("file:///river.jpg"));

        delete(&store, image).await.unwrap();
        assert!(matches!(
            delete(&store, image).await.unwrap_err(),
            CliError::NotFound(_)
        ));
    }
}
