//! Language model transformer
//!
//! The transformer contract is text in, one JSON object out. Anything else
//! the model produces is a mapper error.

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::types::{JsonObject, JsonValue};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenAI API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Default chat model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Prompt pair and sampling settings for one transform call
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Turns a prompt into a structured JSON object
#[async_trait]
pub trait StructuredTransformer: Send + Sync {
    /// Run the prompt and return the parsed object
    async fn transform(&self, request: &TransformRequest) -> Result<JsonObject>;
}

/// Configuration for [`OpenAiClient`]
#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl OpenAiClientConfig {
    /// Config against the public API with the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
        }
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions client in forced JSON mode
#[derive(Debug)]
pub struct OpenAiClient {
    http: HttpClient,
    model: String,
}

impl OpenAiClient {
    /// Create a client with a generous timeout for model latency
    pub fn new(config: OpenAiClientConfig) -> Result<Self> {
        let http_config = HttpClientConfig::builder()
            .timeout(Duration::from_secs(60))
            .max_retries(2)
            .build();
        Self::with_http_config(config, http_config)
    }

    /// Create a client with custom HTTP settings
    pub fn with_http_config(
        config: OpenAiClientConfig,
        mut http_config: HttpClientConfig,
    ) -> Result<Self> {
        http_config.base_url = Some(config.base_url);
        let http = HttpClient::with_auth(http_config, AuthConfig::bearer(config.api_key))?;
        Ok(Self {
            http,
            model: config.model,
        })
    }

    /// Model name sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Parse the model's reply text as exactly one JSON object
pub(crate) fn parse_object_reply(content: &str) -> Result<JsonObject> {
    match serde_json::from_str::<JsonValue>(content.trim()) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(other) => Err(Error::mapper(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(Error::mapper(format!("reply is not valid JSON: {e}"))),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[async_trait]
impl StructuredTransformer for OpenAiClient {
    async fn transform(&self, request: &TransformRequest) -> Result<JsonObject> {
        let body = ChatRequest {
            model: &self.model,
            temperature: request.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        let response: ChatResponse = self
            .http
            .post_json_with_config(
                "/v1/chat/completions",
                RequestConfig::new().json(serde_json::to_value(&body)?),
            )
            .await
            .map_err(|e| Error::mapper(format!("completion request failed: {e}")))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::mapper("completion returned no content"))?;

        parse_object_reply(&content)
    }
}
