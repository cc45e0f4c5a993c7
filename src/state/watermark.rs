//! Watermark store
//!
//! Persists `{"lastSeenTime": "<RFC 3339>"}`.

use super::file::{read_optional, write_json_atomic};
use crate::error::{Error, Result};
use crate::types::{format_timestamp, parse_timestamp, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WatermarkFile {
    last_seen_time: String,
}

/// File-backed watermark
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    /// Create a store backed by the given file
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted watermark without initializing it
    pub async fn peek(&self) -> Result<Option<Timestamp>> {
        let Some(contents) = read_optional(&self.path).await? else {
            return Ok(None);
        };

        let file: WatermarkFile = serde_json::from_str(&contents).map_err(|e| {
            Error::state(format!(
                "Failed to parse watermark file {}: {e}",
                self.path.display()
            ))
        })?;

        parse_timestamp(&file.last_seen_time)
            .map(Some)
            .ok_or_else(|| {
                Error::state(format!(
                    "Invalid lastSeenTime in {}: {:?}",
                    self.path.display(),
                    file.last_seen_time
                ))
            })
    }

    /// Load the watermark, initializing it to now on first run
    ///
    /// The initial value is persisted before it is returned.
    pub async fn load(&self) -> Result<Timestamp> {
        if let Some(ts) = self.peek().await? {
            return Ok(ts);
        }

        let now = Utc::now();
        self.save(&now).await?;
        info!(watermark = %format_timestamp(&now), "Initialized watermark to current time");
        Ok(now)
    }

    /// Overwrite the persisted watermark
    pub async fn save(&self, ts: &Timestamp) -> Result<()> {
        let file = WatermarkFile {
            last_seen_time: format_timestamp(ts),
        };
        write_json_atomic(&self.path, &file).await
    }

    /// Persist `candidate` only if it is later than the stored watermark
    ///
    /// Returns the new watermark when it moved.
    pub async fn advance(&self, candidate: Timestamp) -> Result<Option<Timestamp>> {
        let current = self.load().await?;
        if candidate <= current {
            debug!(
                current = %format_timestamp(&current),
                candidate = %format_timestamp(&candidate),
                "Watermark not advanced"
            );
            return Ok(None);
        }

        self.save(&candidate).await?;
        Ok(Some(candidate))
    }
}
