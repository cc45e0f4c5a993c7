//! State management module
//!
//! Handles the two pieces of state that survive restarts: the sync
//! watermark and the cached destination schema. Both are small JSON files
//! written atomically (temp file + rename).
//!
//! # Overview
//!
//! The state module provides:
//! - `WatermarkStore` - Monotonic "last processed" timestamp
//! - `SchemaCache` - Destination schema snapshot with a freshness window

mod file;
mod schema_cache;
mod watermark;

pub use schema_cache::{SchemaCache, DEFAULT_SCHEMA_TTL};
pub use watermark::WatermarkStore;

#[cfg(test)]
mod watermark_tests;
