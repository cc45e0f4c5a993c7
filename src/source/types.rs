//! Source record type
//!
//! Field names follow the lifelog API's camelCase JSON.

use crate::types::{parse_timestamp, JsonValue, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One starred lifelog entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    /// Upstream identifier, not guaranteed to be present or stable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Markdown rendering of the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,

    /// Plain text rendering, used when there is no markdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub is_starred: bool,

    /// Any other fields the API sends, kept for the mapper
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

impl SourceRecord {
    /// Timestamp used to compare this record against the watermark
    ///
    /// `updatedAt`, then `endTime`, then `startTime`. A field that is
    /// missing or does not parse is skipped.
    pub fn effective_timestamp(&self) -> Option<Timestamp> {
        [&self.updated_at, &self.end_time, &self.start_time]
            .into_iter()
            .flatten()
            .find_map(|raw| parse_timestamp(raw))
    }

    /// Body content for the destination page, markdown preferred
    pub fn body(&self) -> Option<&str> {
        [&self.markdown, &self.text]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
    }

    /// Title if present and non-blank
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Identifier for log lines
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("<no id>")
    }
}
