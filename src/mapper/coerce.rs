//! Restricting model output to the destination schema

use crate::destination::{DestinationSchema, MappedProperties, PropertyKind, PropertyValue};
use crate::types::{JsonObject, JsonValue};
use chrono::NaiveDate;
use tracing::debug;

// ============================================================================
// Schema Restriction
// ============================================================================

/// Keep only keys present in the schema whose values fit the property kind
///
/// Enumerable values outside the option list are dropped, never added as
/// new options.
pub fn restrict_to_schema(raw: &JsonObject, schema: &DestinationSchema) -> MappedProperties {
    let mut properties = MappedProperties::new();

    for (name, value) in raw {
        let Some(descriptor) = schema.get(name) else {
            debug!(property = %name, "Dropping key not in destination schema");
            continue;
        };

        match coerce_value(&descriptor.kind, &descriptor.options, value) {
            Some(coerced) => {
                properties.insert(name.clone(), coerced);
            }
            None => debug!(
                property = %name,
                kind = %descriptor.kind,
                "Dropping value that does not fit property"
            ),
        }
    }

    properties
}

fn coerce_value(kind: &PropertyKind, options: &[String], value: &JsonValue) -> Option<PropertyValue> {
    if value.is_null() {
        return None;
    }

    match kind {
        PropertyKind::Title => text_of(value).map(PropertyValue::Title),
        PropertyKind::RichText => text_of(value).map(PropertyValue::RichText),
        PropertyKind::Number => number_of(value).map(PropertyValue::Number),
        PropertyKind::Select => name_of(value)
            .and_then(|name| match_option(options, &name))
            .map(PropertyValue::Select),
        PropertyKind::Status => name_of(value)
            .and_then(|name| match_option(options, &name))
            .map(PropertyValue::Status),
        PropertyKind::MultiSelect => {
            let mut chosen: Vec<String> = Vec::new();
            for name in names_of(value) {
                if let Some(option) = match_option(options, &name) {
                    if !chosen.contains(&option) {
                        chosen.push(option);
                    }
                }
            }
            (!chosen.is_empty()).then_some(PropertyValue::MultiSelect(chosen))
        }
        PropertyKind::Date => date_of(value),
        PropertyKind::Checkbox => bool_of(value).map(PropertyValue::Checkbox),
        PropertyKind::Url => plain_string(value).map(PropertyValue::Url),
        PropertyKind::Email => plain_string(value).map(PropertyValue::Email),
        PropertyKind::PhoneNumber => plain_string(value).map(PropertyValue::PhoneNumber),
        PropertyKind::Other(_) => None,
    }
}

/// Find the canonical option for a proposed value
///
/// Exact match wins, then a case-insensitive match.
pub fn match_option(options: &[String], proposed: &str) -> Option<String> {
    let proposed = proposed.trim();
    if proposed.is_empty() {
        return None;
    }
    options
        .iter()
        .find(|o| o.as_str() == proposed)
        .or_else(|| {
            let lowered = proposed.to_lowercase();
            options.iter().find(|o| o.to_lowercase() == lowered)
        })
        .cloned()
}

// ============================================================================
// Value Extraction
// ============================================================================

fn plain_string(value: &JsonValue) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Text from a string, a scalar, or a Notion-style rich text array
fn text_of(value: &JsonValue) -> Option<String> {
    let text = match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                JsonValue::String(s) => Some(s.clone()),
                JsonValue::Object(obj) => obj
                    .get("plain_text")
                    .and_then(JsonValue::as_str)
                    .or_else(|| {
                        obj.get("text")
                            .and_then(|t| t.get("content"))
                            .and_then(JsonValue::as_str)
                    })
                    .map(str::to_string),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(""),
        JsonValue::Object(obj) => obj
            .get("content")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .unwrap_or_default(),
        JsonValue::Null => String::new(),
    };

    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn number_of(value: &JsonValue) -> Option<f64> {
    let number = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn bool_of(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Option name from `"x"` or `{"name": "x"}`
fn name_of(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Object(obj) => obj
            .get("name")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn names_of(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::Array(items) => items.iter().filter_map(name_of).collect(),
        other => name_of(other).into_iter().collect(),
    }
}

fn is_date_like(value: &str) -> bool {
    crate::types::parse_timestamp(value).is_some()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn date_of(value: &JsonValue) -> Option<PropertyValue> {
    let (start, end) = match value {
        JsonValue::String(s) => (s.trim().to_string(), None),
        JsonValue::Object(obj) => {
            let start = obj.get("start").and_then(JsonValue::as_str)?.trim().to_string();
            let end = obj
                .get("end")
                .and_then(JsonValue::as_str)
                .map(|e| e.trim().to_string())
                .filter(|e| is_date_like(e));
            (start, end)
        }
        _ => return None,
    };

    is_date_like(&start).then_some(PropertyValue::Date { start, end })
}
