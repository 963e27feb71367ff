//! Marker domain types.
//!
//! Markers and their images are owned by the persistence layer. Everything
//! else (the engine, the monitor) only ever reads refreshed snapshots.

mod color;
mod model;

pub use color::MarkerColor;
pub use model::{
    ImageId, Marker, MarkerError, MarkerId, MarkerImage, MarkerLink, NewMarker, NewMarkerImage,
};
