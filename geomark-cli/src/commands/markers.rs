//! Marker commands: `add`, `list` and `delete`.

use std::path::PathBuf;

use clap::ValueEnum;
use console::style;
use geomark::marker::{Marker, MarkerColor, MarkerId, NewMarker};
use geomark::store::MarkerStore;

use super::common::{block_on, init_quiet_logging, open_store};
use crate::error::CliError;

/// Colour choices on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorArg {
    Red,
    Blue,
    Green,
    Orange,
    Purple,
}

impl From<ColorArg> for MarkerColor {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Red => MarkerColor::Red,
            ColorArg::Blue => MarkerColor::Blue,
            ColorArg::Green => MarkerColor::Green,
            ColorArg::Orange => MarkerColor::Orange,
            ColorArg::Purple => MarkerColor::Purple,
        }
    }
}

/// Arguments for `geomark add`.
#[derive(Debug, Clone)]
pub struct AddArgs {
    pub lat: f64,
    pub lon: f64,
    pub title: String,
    pub description: Option<String>,
    pub color: ColorArg,
}

impl AddArgs {
    fn into_new_marker(self) -> NewMarker {
        let marker = NewMarker::new(self.lat, self.lon, self.title).with_color(self.color.into());
        match self.description {
            Some(description) => marker.with_description(description),
            None => marker,
        }
    }
}

/// Add a marker and print its id.
pub fn run_add(db: Option<PathBuf>, args: AddArgs) -> Result<(), CliError> {
    let _log = init_quiet_logging()?;
    let store = open_store(db)?;
    let id = block_on(add(&store, args))??;
    println!("{} marker {}", style("Added").green().bold(), id);
    Ok(())
}

/// Print all markers, newest first.
pub fn run_list(db: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let _log = init_quiet_logging()?;
    let store = open_store(db)?;
    let markers = block_on(store.get_markers())??;

    if json {
        let text = serde_json::to_string_pretty(&markers)
            .map_err(|e| CliError::Runtime(format!("Failed to encode markers: {}", e)))?;
        println!("{}", text);
    } else if markers.is_empty() {
        println!("{}", style("No markers yet").dim());
    } else {
        print!("{}", render_table(&markers));
    }
    Ok(())
}

/// Delete a marker together with its images.
pub fn run_delete(db: Option<PathBuf>, id: MarkerId) -> Result<(), CliError> {
    let _log = init_quiet_logging()?;
    let store = open_store(db)?;
    block_on(delete(&store, id))??;
    println!("{} marker {}", style("Deleted").green().bold(), id);
    Ok(())
}

async fn add(store: &impl MarkerStore, args: AddArgs) -> Result<MarkerId, CliError> {
    Ok(store.add_marker(args.into_new_marker()).await?)
}

async fn delete(store: &impl MarkerStore, id: MarkerId) -> Result<(), CliError> {
    if store.delete_marker(id).await? {
        Ok(())
    } else {
        Err(CliError::NotFound(format!("No marker with id {}", id)))
    }
}

fn render_table(markers: &[Marker]) -> String {
    let mut out = format!(
        "{:>5}  {:<7}  {:>11}  {:>12}  {:<19}  {}\n",
        "ID", "COLOR", "LATITUDE", "LONGITUDE", "CREATED", "TITLE"
    );
    for marker in markers {
        out.push_str(&format!(
            "{:>5}  {:<7}  {:>11.6}  {:>12.6}  {:<19}  {}",
            marker.id,
            marker.color.name(),
            marker.latitude,
            marker.longitude,
            marker.created_at.format("%Y-%m-%d %H:%M:%S"),
            marker.title,
        ));
        if let Some(description) = marker.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!(" ({})", description));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use geomark::store::MemoryMarkerStore;

    fn args(title: &str) -> AddArgs {
        AddArgs {
            lat: 58.01,
            lon: 56.23,
            title: title.to_string(),
            description: Some("River view".to_string()),
            color: ColorArg::Green,
        }
    }

    #[tokio::test]
    async fn test_add_maps_arguments() {
        let store = MemoryMarkerStore::new();
        let id = add(&store, args("Embankment")).await.unwrap();

        let markers = store.get_markers().await.unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].id, id);
        assert_eq!(markers[0].color, MarkerColor::Green);
        assert_eq!(markers[0].description.as_deref(), Some("River view"));
    }

    #[tokio::test]
    async fn test_add_rejects_empty_title() {
        let store = MemoryMarkerStore::new();
        let err = add(&store, args("  ")).await.unwrap_err();
        assert!(matches!(err, CliError::Store(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_marker_is_not_found() {
        let store = MemoryMarkerStore::new();
        let err = delete(&store, 42).await.unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));

        let id = add(&store, args("Embankment")).await.unwrap();
        delete(&store, id).await.unwrap();
        assert!(store.get_markers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_table_lists_each_marker() {
        let store = MemoryMarkerStore::new();
        add(&store, args("Embankment")).await.unwrap();
        let mut plain = args("Opera");
        plain.description = None;
        add(&store, plain).await.unwrap();

        let table = render_table(&store.get_markers().await.unwrap());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("TITLE"));
        assert!(table.contains("Embankment (River view)"));
        assert!(table.contains("GREEN"));
    }

    #[test]
    fn test_color_arg_maps_every_colour() {
        let mapped: Vec<MarkerColor> = ColorArg::value_variants()
            .iter()
            .map(|c| MarkerColor::from(*c))
            .collect();
        assert_eq!(mapped, MarkerColor::ALL.to_vec());
    }
}
