//! Lifelog API client

use super::normalize::normalize_response;
use super::types::SourceRecord;
use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::types::{format_timestamp, JsonValue, Timestamp};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Default lifelog API base URL
pub const DEFAULT_LIFELOG_BASE_URL: &str = "https://api.limitless.ai";

/// Source of starred records for the sync engine
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch starred records starting at `since`, oldest first
    async fn fetch_since(&self, since: &Timestamp) -> Result<Vec<SourceRecord>>;
}

/// Configuration for [`LifelogClient`]
#[derive(Debug, Clone)]
pub struct LifelogClientConfig {
    /// API base URL
    pub base_url: String,
    /// Value for the `X-API-Key` header
    pub api_key: String,
    /// Records requested per fetch
    pub page_size: u32,
}

impl LifelogClientConfig {
    /// Config against the public API with the default page size
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_LIFELOG_BASE_URL.to_string(),
            api_key: api_key.into(),
            page_size: 10,
        }
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// HTTP client for the lifelog API
#[derive(Debug)]
pub struct LifelogClient {
    http: HttpClient,
    page_size: u32,
    /// Set once the unrecognized-shape diagnostic has been logged
    shape_warned: AtomicBool,
}

impl LifelogClient {
    /// Create a client with the default HTTP settings
    pub fn new(config: LifelogClientConfig) -> Result<Self> {
        let http_config = HttpClientConfig::builder()
            .base_url(config.base_url.clone())
            .build();
        Self::with_http_config(config, http_config)
    }

    /// Create a client with custom HTTP settings
    ///
    /// The base URL from `config` always wins over the one in `http_config`.
    pub fn with_http_config(
        config: LifelogClientConfig,
        mut http_config: HttpClientConfig,
    ) -> Result<Self> {
        http_config.base_url = Some(config.base_url);
        let http = HttpClient::with_auth(
            http_config,
            AuthConfig::api_key("X-API-Key", config.api_key),
        )?;

        Ok(Self {
            http,
            page_size: config.page_size,
            shape_warned: AtomicBool::new(false),
        })
    }

    fn query(&self, since: &Timestamp) -> RequestConfig {
        RequestConfig::new()
            .query("isStarred", "true")
            .query("start", format_timestamp(since))
            .query("direction", "asc")
            .query("limit", self.page_size.to_string())
    }

    /// Whether the unrecognized-shape diagnostic has fired
    pub fn warned_unrecognized_shape(&self) -> bool {
        self.shape_warned.load(Ordering::Relaxed)
    }

    fn warn_unrecognized_once(&self, body: &JsonValue) {
        if self.shape_warned.swap(true, Ordering::Relaxed) {
            return;
        }
        let keys: Vec<&str> = body
            .as_object()
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default();
        warn!(
            ?keys,
            "Unrecognized lifelog response shape, treating as empty (logged once)"
        );
    }
}

#[async_trait]
impl SourceFetcher for LifelogClient {
    async fn fetch_since(&self, since: &Timestamp) -> Result<Vec<SourceRecord>> {
        let body: JsonValue = self
            .http
            .get_json_with_config("/v1/lifelogs", self.query(since))
            .await
            .map_err(|e| Error::upstream(e.to_string()))?;

        let normalized = normalize_response(&body);
        if !normalized.is_recognized() {
            self.warn_unrecognized_once(&body);
            return Ok(Vec::new());
        }

        debug!(
            shape = normalized.shape,
            count = normalized.records.len(),
            skipped = normalized.skipped,
            "Fetched lifelogs"
        );
        Ok(normalized.records)
    }
}
