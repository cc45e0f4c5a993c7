//! Runtime configuration
//!
//! Settings come from the process environment after a best-effort `.env`
//! load. Lookups go through a closure so parsing can be tested without
//! touching the real environment.

use crate::destination::DEFAULT_NOTION_BASE_URL;
use crate::error::{Error, Result};
use crate::mapper::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::source::DEFAULT_LIFELOG_BASE_URL;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

// ============================================================================
// Environment Keys
// ============================================================================

pub const LIMITLESS_API_KEY: &str = "LIMITLESS_API_KEY";
pub const NOTION_API_KEY: &str = "NOTION_API_KEY";
pub const NOTION_DATABASE_ID: &str = "NOTION_DATABASE_ID";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const POLL_INTERVAL_MS: &str = "POLL_INTERVAL_MS";
pub const STATE_DIR: &str = "STATE_DIR";
pub const PAGE_SIZE: &str = "PAGE_SIZE";
pub const SCHEMA_CACHE_TTL_MS: &str = "SCHEMA_CACHE_TTL_MS";
pub const LIMITLESS_BASE_URL: &str = "LIMITLESS_BASE_URL";
pub const NOTION_BASE_URL: &str = "NOTION_BASE_URL";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;
const DEFAULT_STATE_DIR: &str = "./state";
const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_SCHEMA_CACHE_TTL_MS: u64 = 3_600_000;

const WATERMARK_FILE: &str = "watermark.json";
const SCHEMA_CACHE_FILE: &str = "schema_cache.json";

// ============================================================================
// Settings
// ============================================================================

/// Resolved runtime settings
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub limitless_api_key: String,
    pub notion_api_key: String,
    pub notion_database_id: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub limitless_base_url: String,
    pub notion_base_url: String,
    pub openai_base_url: String,
    pub poll_interval: Duration,
    pub state_dir: PathBuf,
    pub page_size: u32,
    pub schema_cache_ttl: Duration,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("limitless_api_key", &"[REDACTED]")
            .field("notion_api_key", &"[REDACTED]")
            .field("notion_database_id", &self.notion_database_id)
            .field("openai_api_key", &"[REDACTED]")
            .field("openai_model", &self.openai_model)
            .field("limitless_base_url", &self.limitless_base_url)
            .field("notion_base_url", &self.notion_base_url)
            .field("openai_base_url", &self.openai_base_url)
            .field("poll_interval", &self.poll_interval)
            .field("state_dir", &self.state_dir)
            .field("page_size", &self.page_size)
            .field("schema_cache_ttl", &self.schema_cache_ttl)
            .finish()
    }
}

impl Settings {
    /// Load settings from the environment, honoring a `.env` file
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        Ok(Self {
            limitless_api_key: env.required(LIMITLESS_API_KEY)?,
            notion_api_key: env.required(NOTION_API_KEY)?,
            notion_database_id: env.required(NOTION_DATABASE_ID)?,
            openai_api_key: env.required(OPENAI_API_KEY)?,
            openai_model: env.optional(OPENAI_MODEL).unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            limitless_base_url: env.base_url(LIMITLESS_BASE_URL, DEFAULT_LIFELOG_BASE_URL)?,
            notion_base_url: env.base_url(NOTION_BASE_URL, DEFAULT_NOTION_BASE_URL)?,
            openai_base_url: env.base_url(OPENAI_BASE_URL, DEFAULT_OPENAI_BASE_URL)?,
            poll_interval: Duration::from_millis(
                env.positive(POLL_INTERVAL_MS, DEFAULT_POLL_INTERVAL_MS)?,
            ),
            state_dir: state_dir_from(&env),
            page_size: u32::try_from(env.positive(PAGE_SIZE, u64::from(DEFAULT_PAGE_SIZE))?)
                .map_err(|_| Error::invalid_value(PAGE_SIZE, "too large"))?,
            schema_cache_ttl: Duration::from_millis(
                env.positive(SCHEMA_CACHE_TTL_MS, DEFAULT_SCHEMA_CACHE_TTL_MS)?,
            ),
        })
    }

    /// State directory alone, for commands that need no credentials
    pub fn state_dir_from_env() -> PathBuf {
        let _ = dotenvy::dotenv();
        state_dir_from(&Lookup(|key: &str| std::env::var(key).ok()))
    }

    /// Override the state directory
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    /// Override the polling interval
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Path of the watermark file
    pub fn watermark_path(&self) -> PathBuf {
        watermark_path(&self.state_dir)
    }

    /// Path of the schema cache file
    pub fn schema_cache_path(&self) -> PathBuf {
        self.state_dir.join(SCHEMA_CACHE_FILE)
    }
}

/// Watermark file inside a state directory
pub fn watermark_path(state_dir: &Path) -> PathBuf {
    state_dir.join(WATERMARK_FILE)
}

fn state_dir_from<F: Fn(&str) -> Option<String>>(env: &Lookup<F>) -> PathBuf {
    env.optional(STATE_DIR)
        .map_or_else(|| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from)
}

// ============================================================================
// Lookup Helpers
// ============================================================================

struct Lookup<F>(F);

impl<F: Fn(&str) -> Option<String>> Lookup<F> {
    /// Non-blank value, trimmed
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key).ok_or_else(|| Error::missing_field(key))
    }

    fn positive(&self, key: &str, default: u64) -> Result<u64> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.parse::<u64>() {
            Ok(0) => Err(Error::invalid_value(key, "must be greater than zero")),
            Ok(value) => Ok(value),
            Err(e) => Err(Error::invalid_value(key, format!("{raw:?}: {e}"))),
        }
    }

    fn base_url(&self, key: &str, default: &str) -> Result<String> {
        let Some(raw) = self.optional(key) else {
            return Ok(default.to_string());
        };
        let url = Url::parse(&raw).map_err(|e| Error::invalid_value(key, format!("{raw:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                key,
                format!("unsupported scheme {:?}", url.scheme()),
            ));
        }
        Ok(raw.trim_end_matches('/').to_string())
    }
}
