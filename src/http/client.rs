//! Shared HTTP client
//!
//! Every outbound call (lifelogs, Notion, OpenAI) goes through [`HttpClient`].
//! Any non-2xx response is an error. Connection failures, timeouts, 429 and
//! gateway-style 5xx responses are retried with exponential backoff, and a
//! 429 waits for the server's `Retry-After` instead.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Wait used when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL that relative paths are joined onto
    pub base_url: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further one
    pub initial_backoff: Duration,
    /// Upper bound for the retry delay
    pub max_backoff: Duration,
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers sent with every request
    pub default_headers: HashMap<String, String>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(30),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: HashMap::new(),
            user_agent: format!("lifelog-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for [`HttpClientConfig`]
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the first retry delay and its cap
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, sent in insertion order
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
    /// Overrides the client's retry count
    pub max_retries: Option<u32>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Override the retry count for this request only
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

/// A failed attempt and how long to wait before the next one
struct Rejection {
    error: Error,
    retry_after: Option<Duration>,
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a client that authenticates every request with `auth_config`
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            authenticator: Authenticator::new(auth_config),
            rate_limiter,
        })
    }

    /// Send a request, retrying transient failures
    ///
    /// Returns `Ok` only for 2xx responses.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let url = self.build_url(path);
        let max_retries = config.max_retries.unwrap_or(self.config.max_retries);
        let mut attempt = 0;

        loop {
            if let Some(limiter) = &self.rate_limiter {
                limiter.wait().await;
            }

            let rejection = match self.send_once(method.clone(), &url, &config).await {
                Ok(response) if response.status().is_success() => {
                    debug!(%method, url = %url, status = response.status().as_u16(), "Request succeeded");
                    return Ok(response);
                }
                Ok(response) => reject_response(response).await,
                Err(e) => self.reject_transport(e),
            };

            if attempt >= max_retries || !rejection.error.is_retryable() {
                return Err(rejection.error);
            }

            let delay = rejection.retry_after.unwrap_or_else(|| {
                backoff_delay(attempt, self.config.initial_backoff, self.config.max_backoff)
            });
            warn!(
                %method,
                url = %url,
                attempt = attempt + 1,
                max_attempts = max_retries + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %rejection.error,
                "Request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Send a request and parse the JSON response
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let response = self.request(method, path, config).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json(Method::GET, path, RequestConfig::default())
            .await
    }

    /// GET with query parameters and parse the JSON response
    pub async fn get_json_with_config<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T> {
        self.request_json(Method::GET, path, config).await
    }

    /// POST and parse the JSON response
    pub async fn post_json_with_config<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T> {
        self.request_json(Method::POST, path, config).await
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        config: &RequestConfig,
    ) -> reqwest::Result<Response> {
        let mut req = self.client.request(method, url);
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !config.query.is_empty() {
            req = req.query(&config.query);
        }
        if let Some(body) = &config.body {
            req = req.json(body);
        }
        self.authenticator.apply(req).send().await
    }

    fn reject_transport(&self, e: reqwest::Error) -> Rejection {
        let error = if e.is_timeout() {
            Error::Timeout {
                timeout_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            Error::Http(e)
        };
        Rejection {
            error,
            retry_after: None,
        }
    }

    /// Join a relative path onto the base URL; absolute URLs pass through
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("auth", self.authenticator.config())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

async fn reject_response(response: Response) -> Rejection {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let seconds = retry_after_secs(&response);
        return Rejection {
            error: Error::RateLimited {
                retry_after_seconds: seconds,
            },
            retry_after: Some(Duration::from_secs(seconds)),
        };
    }

    let body = response.text().await.unwrap_or_default();
    Rejection {
        error: Error::http_status(status.as_u16(), body),
        retry_after: None,
    }
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Exponential delay for the retry after `attempt`, capped at `max`
pub(super) fn backoff_delay(attempt: u32, initial: Duration, max: Duration) -> Duration {
    initial
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(max)
}
