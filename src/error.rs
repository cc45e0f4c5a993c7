//! Error types for lifelog-sync
//!
//! One error enum covers every stage of a sync. Which variants are fatal
//! depends on where they surface: configuration errors and the startup
//! schema fetch end the process, everything else is contained by the cycle
//! or by the record that raised it.

use thiserror::Error;

/// The main error type for lifelog-sync
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Sync Stage Errors
    // ============================================================================
    #[error("Lifelog fetch failed: {message}")]
    UpstreamFetch { message: String },

    #[error("Schema fetch failed: {message}")]
    SchemaFetch { message: String },

    #[error("Field mapping failed: {message}")]
    Mapper { message: String },

    #[error("Write failed for record {record}: {message}")]
    Write { record: String, message: String },

    #[error("Sync cycle ended with outcome {outcome}")]
    CycleFailed { outcome: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },
}

impl Error {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an upstream fetch error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            message: message.into(),
        }
    }

    /// Create a schema fetch error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaFetch {
            message: message.into(),
        }
    }

    /// Create a mapper error
    pub fn mapper(message: impl Into<String>) -> Self {
        Self::Mapper {
            message: message.into(),
        }
    }

    /// Create a write error for a record
    pub fn write(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Check if a retry could succeed
    ///
    /// Connection failures, timeouts, 429 and gateway-style 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout(),
            Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

/// Result type alias for lifelog-sync
pub type Result<T> = std::result::Result<T, Error>;
