//! Common types used throughout lifelog-sync
//!
//! Timestamp handling lives here because the watermark, the source records
//! and the CLI all need to agree on one parse/format pair.

use chrono::{DateTime, SecondsFormat, Utc};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Point in time used for watermarks and effective timestamps
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// Timestamp Helpers
// ============================================================================

/// Parse an RFC 3339 / ISO-8601 timestamp into UTC
///
/// Returns `None` for empty or malformed input.
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp as RFC 3339 in UTC with a `Z` suffix
///
/// Fractional seconds are only emitted when present, so
/// `2025-01-01T00:00:05Z` round-trips unchanged.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
