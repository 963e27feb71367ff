//! `geomark watch`: replay a track and print proximity notifications.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use geomark::app::{AppConfig, GeomarkApp};
use geomark::location::{LocationError, ReplayLocationSource};
use geomark::logging::init_logging;
use geomark::monitor::MonitorStatus;
use geomark::notify::ConsoleNotifier;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::common::{block_on, load_config, resolve_db_path};
use crate::error::CliError;

/// Slack after the last replayed point before `--exit-at-end` gives up waiting.
const END_GRACE: Duration = Duration::from_secs(2);

/// Arguments for `geomark watch`.
#[derive(Debug, Clone)]
pub struct WatchArgs {
    pub track: PathBuf,
    pub pace_ms: u64,
    pub initial_fix: bool,
    pub exit_at_end: bool,
}

/// Run the watch command until Ctrl+C (or the end of the track).
pub fn run(db: Option<PathBuf>, args: WatchArgs) -> Result<(), CliError> {
    let config = load_config();
    let _log = init_logging(&config.logging)?;

    let source = ReplayLocationSource::from_file(&args.track)?
        .with_pace(Duration::from_millis(args.pace_ms))
        .with_initial_fix(args.initial_fix);
    if source.track().is_empty() {
        return Err(LocationError::InvalidTrack(format!(
            "{}: no points",
            args.track.display()
        ))
        .into());
    }

    let app_config =
        AppConfig::from_config_file(&config).with_store_path(resolve_db_path(db, &config));

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        signal.cancel();
    })
    .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

    println!(
        "{} {} ({} points, radius {} m)",
        style("Watching").cyan().bold(),
        args.track.display(),
        source.track().len(),
        app_config.engine.radius_meters
    );

    let status = block_on(watch(app_config, source, args.exit_at_end, shutdown))??;
    print_summary(&status);
    Ok(())
}

/// Replay `source` through a full app and return the final monitor status.
async fn watch(
    config: AppConfig,
    source: ReplayLocationSource,
    exit_at_end: bool,
    shutdown: CancellationToken,
) -> Result<MonitorStatus, CliError> {
    let last_point = source.track().last().copied();
    let replay_time = source_duration(&source);

    let (mut app, _links) =
        GeomarkApp::start(config, Arc::new(source), ConsoleNotifier::new()).await?;
    if let Err(e) = app.wait_for_store().await {
        app.shutdown().await;
        return Err(e.into());
    }

    let mut status = app.monitor().subscribe_status();
    let deadline = tokio::time::sleep(replay_time + END_GRACE);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            _ = &mut deadline, if exit_at_end => {
                info!("Track end not evaluated in time, stopping");
                break;
            }

            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let reached = status
                    .borrow_and_update()
                    .last_sample
                    .map(|sample| sample.position())
                    == last_point;
                if exit_at_end && reached {
                    break;
                }
            }
        }
    }

    let final_status = app.monitor().status();
    app.shutdown().await;
    Ok(final_status)
}

fn source_duration(source: &ReplayLocationSource) -> Duration {
    let points = u32::try_from(source.track().len()).unwrap_or(u32::MAX);
    source.pace().saturating_mul(points)
}

fn print_summary(status: &MonitorStatus) {
    println!();
    println!("{}", style("Summary").bold());
    println!("  Evaluations:       {}", status.evaluations);
    println!("  Markers in range:  {}", status.active.len());
    println!("  Batched samples:   {}", status.batched);
    println!("  Store errors:      {}", status.store_errors);
}
