//! CLI module
//!
//! Command-line interface for the sync service.
//!
//! # Commands
//!
//! - `run` - Poll continuously until interrupted (default)
//! - `once` - Run a single cycle and exit
//! - `schema` - Print the destination schema
//! - `watermark` - Show or set the persisted watermark

mod commands;
mod runner;

pub use commands::{Cli, Commands, WatermarkAction};
pub use runner::{shutdown_signal, Runner};
