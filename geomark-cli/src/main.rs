//! Geomark CLI - Command-line interface
//!
//! Manage map markers and watch a location track for proximity notifications.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use commands::config::ConfigCommands;
use commands::images::ImageCommands;
use commands::markers::{AddArgs, ColorArg};
use commands::watch::WatchArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "geomark", version, about = "Drop map markers and get notified when you walk past them")]
struct Cli {
    /// Marker database (overrides store.path from config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a marker
    Add {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Marker title
        #[arg(long)]
        title: String,

        /// Optional description
        #[arg(long)]
        description: Option<String>,

        /// Marker colour
        #[arg(long, value_enum, default_value_t = ColorArg::Red)]
        color: ColorArg,
    },

    /// List markers, newest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete a marker and its images
    Delete {
        /// Marker id
        id: i64,
    },

    /// Manage marker images
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// Replay a location track and print proximity notifications
    Watch {
        /// Track file with one "lat,lon" per line
        track: PathBuf,

        /// Milliseconds between track points
        #[arg(long, default_value_t = 1000)]
        pace_ms: u64,

        /// Start from the configured default position instead of the first point
        #[arg(long)]
        no_initial_fix: bool,

        /// Exit once the last point has been evaluated
        #[arg(long)]
        exit_at_end: bool,
    },

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Add {
            lat,
            lon,
            title,
            description,
            color,
        } => commands::markers::run_add(
            cli.db,
            AddArgs {
                lat,
                lon,
                title,
                description,
                color,
            },
        ),
        Command::List { json } => commands::markers::run_list(cli.db, json),
        Command::Delete { id } => commands::markers::run_delete(cli.db, id),
        Command::Image { command } => commands::images::run(cli.db, command),
        Command::Watch {
            track,
            pace_ms,
            no_initial_fix,
            exit_at_end,
        } => commands::watch::run(
            cli.db,
            WatchArgs {
                track,
                pace_ms,
                initial_fix: !no_initial_fix,
                exit_at_end,
            },
        ),
        Command::Config { command } => commands::config::run(command),
    }
}
