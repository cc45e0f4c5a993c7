// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # lifelog-sync
//!
//! Polls a lifelog service for starred entries and files each one into a
//! Notion database, using a language model to fill the database's
//! properties.
//!
//! ## Features
//!
//! - **Incremental Sync**: A persisted watermark; only newer entries are fetched
//! - **Failure Isolation**: One bad record never blocks the others
//! - **No Silent Loss**: The watermark never moves past a failed write
//! - **Schema-aware Mapping**: Model output is restricted to the live schema,
//!   with a deterministic fallback
//! - **Schema Cache**: The destination schema is cached on disk with a TTL
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lifelog_sync::config::Settings;
//! use lifelog_sync::scheduler::Scheduler;
//!
//! #[tokio::main]
//! async fn main() -> lifelog_sync::Result<()> {
//!     let settings = Settings::from_env()?;
//!     let engine = /* SyncEngine::new(source, schema, mapper, writer, watermark) */;
//!     Scheduler::new(engine, settings.poll_interval)
//!         .run(lifelog_sync::cli::shutdown_signal())
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                Scheduler (interval + in-flight guard)        │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ run_cycle()
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │                         SyncEngine                           │
//! │  watermark → fetch → filter/sort → map → write → advance     │
//! └──────┬────────────┬──────────────┬─────────────┬─────────────┘
//!        │            │              │             │
//! ┌──────┴─────┐ ┌────┴───────┐ ┌────┴──────┐ ┌────┴──────────┐
//! │ Source     │ │ SchemaCache│ │ Mapper    │ │ Destination   │
//! │ Lifelogs   │ │ TTL + file │ │ OpenAI /  │ │ Notion pages  │
//! │ API        │ │            │ │ fallback  │ │               │
//! └────────────┘ └────────────┘ └───────────┘ └───────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and timestamp helpers
pub mod types;

/// Authentication for outgoing requests
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Lifelog source client and response normalization
pub mod source;

/// Notion schema, property values and client
pub mod destination;

/// Field mapping with model and fallback strategies
pub mod mapper;

/// Persisted watermark and schema cache
pub mod state;

/// One polling cycle
pub mod engine;

/// Interval driver for the engine
pub mod scheduler;

/// Environment configuration
pub mod config;

/// Command-line interface
pub mod cli;

#[cfg(test)]
pub(crate) mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use engine::{CycleOutcome, CycleReport, SyncEngine};
pub use scheduler::Scheduler;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
