//! HTTP client module
//!
//! One retrying, rate-limited client shared by the lifelog, Notion and
//! OpenAI clients.
//!
//! # Features
//!
//! - **Automatic Retries**: exponential backoff, `Retry-After` on 429
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Authentication**: Integration with auth module

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
