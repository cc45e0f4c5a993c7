//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Files starred lifelogs into a Notion database
#[derive(Parser, Debug)]
#[command(name = "lifelog-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// State directory (overrides STATE_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Polling interval in milliseconds (overrides POLL_INTERVAL_MS)
    #[arg(long, global = true, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Subcommand to run, `run` when none was given
    pub fn resolved_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Poll continuously until SIGINT or SIGTERM
    Run,

    /// Run one cycle and exit
    Once,

    /// Print the destination schema
    Schema {
        /// Bypass the cache and fetch live
        #[arg(long)]
        refresh: bool,
    },

    /// Inspect or move the watermark
    Watermark {
        #[command(subcommand)]
        action: WatermarkAction,
    },
}

/// Watermark subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum WatermarkAction {
    /// Print the stored watermark
    Show,

    /// Overwrite the watermark, e.g. to skip a record that keeps failing
    Set {
        /// RFC 3339 timestamp
        timestamp: String,
    },
}
