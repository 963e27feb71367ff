//! Marker and marker image records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::MarkerColor;
use crate::coord::{is_valid_coordinate, GeoPoint};

/// Marker identity, assigned by the store on creation.
pub type MarkerId = i64;

/// Marker image identity, assigned by the store on creation.
pub type ImageId = i64;

/// Validation errors for new markers and images.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarkerError {
    /// Marker title is empty or whitespace.
    #[error("Marker title cannot be empty")]
    EmptyTitle,

    /// Coordinates are not finite or out of range.
    #[error("Invalid coordinate: {latitude}, {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Image URI is empty.
    #[error("Image URI cannot be empty")]
    EmptyUri,
}

/// A user-placed point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: MarkerId,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub description: Option<String>,
    pub color: MarkerColor,
    pub created_at: DateTime<Utc>,
}

impl Marker {
    /// Position of the marker.
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Whether the stored coordinates can take part in distance checks.
    ///
    /// Rows written by older builds or other tools may carry garbage; the
    /// engine skips such markers rather than failing.
    pub fn has_valid_position(&self) -> bool {
        is_valid_coordinate(self.latitude, self.longitude)
    }
}

/// Fields for creating a marker. The store assigns id and creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub description: Option<String>,
    pub color: MarkerColor,
}

impl NewMarker {
    /// Create a red marker with no description.
    pub fn new(latitude: f64, longitude: f64, title: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            title: title.into(),
            description: None,
            color: MarkerColor::default(),
        }
    }

    /// Set the description. Blank descriptions are stored as `None`.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    /// Set the colour tag.
    pub fn with_color(mut self, color: MarkerColor) -> Self {
        self.color = color;
        self
    }

    /// Check the marker can be stored.
    pub fn validate(&self) -> Result<(), MarkerError> {
        if self.title.trim().is_empty() {
            return Err(MarkerError::EmptyTitle);
        }
        if !is_valid_coordinate(self.latitude, self.longitude) {
            return Err(MarkerError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        Ok(())
    }
}

/// A photo attached to a marker. The URI is an opaque device-local reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerImage {
    pub id: ImageId,
    pub uri: String,
    pub marker_id: MarkerId,
    pub created_at: DateTime<Utc>,
}

/// Fields for attaching an image to a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMarkerImage {
    pub marker_id: MarkerId,
    pub uri: String,
}

impl NewMarkerImage {
    /// Create a new image record for `marker_id`.
    pub fn new(marker_id: MarkerId, uri: impl Into<String>) -> Self {
        Self {
            marker_id,
            uri: uri.into(),
        }
    }

    /// Check the image can be stored.
    pub fn validate(&self) -> Result<(), MarkerError> {
        if self.uri.trim().is_empty() {
            return Err(MarkerError::EmptyUri);
        }
        Ok(())
    }
}

/// Deep-link target handed to the host UI when a notification is tapped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerLink {
    pub id: MarkerId,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    /// Empty when the marker has no description.
    pub description: String,
    pub color: MarkerColor,
}

impl From<&Marker> for MarkerLink {
    fn from(marker: &Marker) -> Self {
        Self {
            id: marker.id,
            latitude: marker.latitude,
            longitude: marker.longitude,
            title: marker.title.clone(),
            description: marker.description.clone().unwrap_or_default(),
            color: marker.color,
        }
    }
}
