//! Notion API client

use super::schema::DestinationSchema;
use super::values::{
    paragraph_blocks, properties_to_notion, EntryId, MappedProperties, MAX_BODY_CHARS,
};
use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig, RequestConfig};
use crate::types::JsonValue;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// Default Notion API base URL
pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com";

/// Notion API version sent with every request
pub const NOTION_VERSION: &str = "2022-06-28";

/// Live source of the destination schema
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Fetch the current schema from the destination service
    async fn fetch_schema(&self) -> Result<DestinationSchema>;
}

/// Writes mapped records to the destination
#[async_trait]
pub trait DestinationWriter: Send + Sync {
    /// Create one entry, returning its id
    ///
    /// Any non-success response is an error; implementations must not retry.
    async fn create_entry(
        &self,
        properties: &MappedProperties,
        body: Option<&str>,
    ) -> Result<EntryId>;
}

/// Configuration for [`NotionClient`]
#[derive(Debug, Clone)]
pub struct NotionClientConfig {
    /// API base URL
    pub base_url: String,
    /// Integration token
    pub api_key: String,
    /// Target database id
    pub database_id: String,
}

impl NotionClientConfig {
    /// Config against the public API
    pub fn new(api_key: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_NOTION_BASE_URL.to_string(),
            api_key: api_key.into(),
            database_id: database_id.into(),
        }
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
}

/// HTTP client for one Notion database
#[derive(Debug)]
pub struct NotionClient {
    http: HttpClient,
    database_id: String,
}

impl NotionClient {
    /// Create a client with Notion's rate limit applied
    pub fn new(config: NotionClientConfig) -> Result<Self> {
        let http_config = HttpClientConfig::builder()
            .rate_limit(RateLimiterConfig::notion())
            .build();
        Self::with_http_config(config, http_config)
    }

    /// Create a client with custom HTTP settings
    pub fn with_http_config(
        config: NotionClientConfig,
        mut http_config: HttpClientConfig,
    ) -> Result<Self> {
        http_config.base_url = Some(config.base_url);
        http_config
            .default_headers
            .insert("Notion-Version".to_string(), NOTION_VERSION.to_string());
        let http = HttpClient::with_auth(http_config, AuthConfig::bearer(config.api_key))?;

        Ok(Self {
            http,
            database_id: config.database_id,
        })
    }

    /// Target database id
    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// Build the page create request body
    pub fn page_request(&self, properties: &MappedProperties, body: Option<&str>) -> JsonValue {
        let mut request = json!({
            "parent": { "database_id": self.database_id },
            "properties": properties_to_notion(properties),
        });

        if let Some(body) = body.filter(|b| !b.trim().is_empty()) {
            let chars = body.chars().count();
            if chars > MAX_BODY_CHARS {
                warn!(chars, limit = MAX_BODY_CHARS, "Entry body too long, truncating");
            }
            request["children"] = JsonValue::Array(paragraph_blocks(body));
        }

        request
    }
}

#[async_trait]
impl SchemaSource for NotionClient {
    async fn fetch_schema(&self) -> Result<DestinationSchema> {
        let database: JsonValue = self
            .http
            .get_json(&format!("/v1/databases/{}", self.database_id))
            .await
            .map_err(|e| Error::schema(e.to_string()))?;

        let schema = DestinationSchema::from_notion(&database);
        if schema.is_empty() {
            return Err(Error::schema("database has no properties"));
        }
        debug!(properties = schema.len(), "Fetched destination schema");
        Ok(schema)
    }
}

#[async_trait]
impl DestinationWriter for NotionClient {
    async fn create_entry(
        &self,
        properties: &MappedProperties,
        body: Option<&str>,
    ) -> Result<EntryId> {
        let request = RequestConfig::new()
            .json(self.page_request(properties, body))
            .retries(0);
        let page: CreatedPage = self.http.post_json_with_config("/v1/pages", request).await?;
        Ok(page.id)
    }
}
