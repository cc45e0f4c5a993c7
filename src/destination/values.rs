//! Typed property values and their Notion JSON rendering

use crate::types::JsonValue;
use serde_json::json;
use std::collections::BTreeMap;

/// Notion's limit on characters in one rich text run
pub const MAX_RICH_TEXT_CHARS: usize = 2000;

/// Notion's limit on runs in one rich text array
pub const MAX_RICH_TEXT_RUNS: usize = 100;

/// Notion's limit on child blocks in one page create request
pub const MAX_CHILD_BLOCKS: usize = 100;

/// Longest body that fits in one page create request
pub const MAX_BODY_CHARS: usize = MAX_RICH_TEXT_CHARS * MAX_RICH_TEXT_RUNS * MAX_CHILD_BLOCKS;

/// Identifier of a created destination entry
pub type EntryId = String;

/// Destination property name to value
pub type MappedProperties = BTreeMap<String, PropertyValue>;

/// A value for one destination property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    Number(f64),
    Select(String),
    MultiSelect(Vec<String>),
    Status(String),
    Date { start: String, end: Option<String> },
    Checkbox(bool),
    Url(String),
    Email(String),
    PhoneNumber(String),
}

impl PropertyValue {
    /// Render as a Notion page property value
    pub fn to_notion(&self) -> JsonValue {
        match self {
            Self::Title(text) => json!({ "title": rich_text_runs(text) }),
            Self::RichText(text) => json!({ "rich_text": rich_text_runs(text) }),
            Self::Number(n) => json!({ "number": n }),
            Self::Select(name) => json!({ "select": { "name": name } }),
            Self::MultiSelect(names) => json!({
                "multi_select": names.iter().map(|n| json!({ "name": n })).collect::<Vec<_>>()
            }),
            Self::Status(name) => json!({ "status": { "name": name } }),
            Self::Date { start, end } => match end {
                Some(end) => json!({ "date": { "start": start, "end": end } }),
                None => json!({ "date": { "start": start } }),
            },
            Self::Checkbox(checked) => json!({ "checkbox": checked }),
            Self::Url(url) => json!({ "url": url }),
            Self::Email(email) => json!({ "email": email }),
            Self::PhoneNumber(phone) => json!({ "phone_number": phone }),
        }
    }
}

/// Render a full property set for a page create request
pub fn properties_to_notion(properties: &MappedProperties) -> JsonValue {
    JsonValue::Object(
        properties
            .iter()
            .map(|(name, value)| (name.clone(), value.to_notion()))
            .collect(),
    )
}

/// Split text into rich text runs of at most [`MAX_RICH_TEXT_CHARS`]
///
/// At most [`MAX_RICH_TEXT_RUNS`] runs are produced; text past that is cut.
pub fn rich_text_runs(text: &str) -> Vec<JsonValue> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_RICH_TEXT_CHARS)
        .take(MAX_RICH_TEXT_RUNS)
        .map(text_run)
        .collect()
}

/// Paragraph blocks carrying `text`, each within the run limit
///
/// At most [`MAX_CHILD_BLOCKS`] blocks are produced, so text longer than
/// [`MAX_BODY_CHARS`] is cut.
pub fn paragraph_blocks(text: &str) -> Vec<JsonValue> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_RICH_TEXT_CHARS * MAX_RICH_TEXT_RUNS)
        .take(MAX_CHILD_BLOCKS)
        .map(|block| {
            let runs: Vec<JsonValue> = block.chunks(MAX_RICH_TEXT_CHARS).map(text_run).collect();
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": { "rich_text": runs }
            })
        })
        .collect()
}

fn text_run(chunk: &[char]) -> JsonValue {
    let content: String = chunk.iter().collect();
    json!({ "type": "text", "text": { "content": content } })
}
