//! Schema cache
//!
//! Persists `{"schema": {...}, "timestamp": <epoch ms>}` and refetches once
//! the snapshot is older than the TTL. A missing or unreadable cache file is
//! just a miss.

use super::file::{read_optional, write_json_atomic};
use crate::destination::{DestinationSchema, SchemaSource};
use crate::error::Result;
use crate::types::now_millis;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default freshness window (one hour)
pub const DEFAULT_SCHEMA_TTL: Duration = Duration::from_millis(3_600_000);

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    schema: DestinationSchema,
    timestamp: i64,
}

/// File-backed cache in front of a [`SchemaSource`]
#[derive(Clone)]
pub struct SchemaCache {
    path: PathBuf,
    ttl: Duration,
    source: Arc<dyn SchemaSource>,
}

impl SchemaCache {
    /// Create a cache with the default TTL
    pub fn new(path: impl AsRef<Path>, source: Arc<dyn SchemaSource>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ttl: DEFAULT_SCHEMA_TTL,
            source,
        }
    }

    /// Set the freshness window
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Get the cache file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the freshness window
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached schema if fresh, otherwise fetch and cache it
    pub async fn get(&self) -> Result<DestinationSchema> {
        if let Some(schema) = self.fresh_snapshot().await {
            return Ok(schema);
        }
        self.refresh().await
    }

    /// Fetch the live schema and persist it, ignoring any cached copy
    ///
    /// A failure to persist is logged; the fetched schema is still returned.
    pub async fn refresh(&self) -> Result<DestinationSchema> {
        let schema = self.source.fetch_schema().await?;

        let file = CacheFile {
            schema,
            timestamp: now_millis(),
        };
        if let Err(e) = write_json_atomic(&self.path, &file).await {
            warn!(error = %e, "Failed to persist schema cache");
        }

        info!(properties = file.schema.len(), "Refreshed destination schema");
        Ok(file.schema)
    }

    /// The cached schema and its age, regardless of freshness
    pub async fn cached(&self) -> Option<(DestinationSchema, Duration)> {
        let contents = match read_optional(&self.path).await {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Schema cache unreadable, treating as stale");
                return None;
            }
        };

        let file: CacheFile = match serde_json::from_str(&contents) {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "Schema cache corrupt, treating as stale");
                return None;
            }
        };

        let age_ms = now_millis()
            .checked_sub(file.timestamp)
            .and_then(|age| u64::try_from(age).ok());
        match age_ms {
            Some(age_ms) => Some((file.schema, Duration::from_millis(age_ms))),
            None => {
                warn!(timestamp = file.timestamp, "Schema cache timestamp invalid, treating as stale");
                None
            }
        }
    }

    async fn fresh_snapshot(&self) -> Option<DestinationSchema> {
        let (schema, age) = self.cached().await?;
        if age < self.ttl {
            debug!(age_ms = age.as_millis() as u64, "Using cached schema");
            Some(schema)
        } else {
            debug!(age_ms = age.as_millis() as u64, "Schema cache expired");
            None
        }
    }
}

impl std::fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache")
            .field("path", &self.path)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
