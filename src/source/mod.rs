//! Lifelog source module
//!
//! Fetches starred lifelog entries and turns whatever envelope the API
//! wraps them in into an ordered list of [`SourceRecord`]s.
//!
//! # Overview
//!
//! The source module provides:
//! - `SourceRecord` - One lifelog entry with its effective timestamp rule
//! - `normalize_response` - Tolerant shape matching over the response body
//! - `SourceFetcher` - Seam the sync engine fetches through
//! - `LifelogClient` - HTTP implementation against the lifelog API

mod client;
mod normalize;
mod types;

pub use client::{LifelogClient, LifelogClientConfig, SourceFetcher, DEFAULT_LIFELOG_BASE_URL};
pub use normalize::{normalize_response, Normalized};
pub use types::SourceRecord;
