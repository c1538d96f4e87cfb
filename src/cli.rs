//! CLI argument parsing via clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Page darkness analysis, recoloring and tab-state replay.
#[derive(Debug, Parser)]
#[command(name = "dimmer", version)]
pub struct Args {
    /// Path to config file (default: ./dimmer.toml or ~/.config/dimmer/dimmer.toml).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Override the log filter (e.g. `debug`, `dimmer::coordinator=trace`).
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the recolor rules as the stylesheet asset.
    Stylesheet {
        /// Write to a file instead of stdout.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Classify a document snapshot and print the page message.
    Classify {
        snapshot: PathBuf,
    },
    /// Recolor every element of a document snapshot.
    Paint {
        snapshot: PathBuf,

        /// Write the painted snapshot here instead of stdout.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Feed a JSON list of tab events through the coordinator.
    Replay {
        events: PathBuf,

        /// JSON file holding the persisted mode across runs.
        #[arg(long = "state")]
        state: Option<PathBuf>,
    },
}
