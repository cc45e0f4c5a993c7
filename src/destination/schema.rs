//! Destination schema model
//!
//! A trimmed view of a Notion database: property name, type, and the option
//! names of enumerable properties. Anything else the API reports about a
//! property is dropped.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Notion property type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyKind {
    Title,
    /// Long text
    RichText,
    Number,
    Select,
    MultiSelect,
    Status,
    Date,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
    /// Any type this crate does not write (people, relation, formula, ...)
    Other(String),
}

impl PropertyKind {
    /// Notion's name for this type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Number => "number",
            Self::Select => "select",
            Self::MultiSelect => "multi_select",
            Self::Status => "status",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::Url => "url",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
            Self::Other(name) => name,
        }
    }

    /// Whether values must come from a closed option list
    pub fn is_enumerable(&self) -> bool {
        matches!(self, Self::Select | Self::MultiSelect | Self::Status)
    }

    /// Whether this crate can produce values for the type
    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for PropertyKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "title" => Self::Title,
            "rich_text" => Self::RichText,
            "number" => Self::Number,
            "select" => Self::Select,
            "multi_select" => Self::MultiSelect,
            "status" => Self::Status,
            "date" => Self::Date,
            "checkbox" => Self::Checkbox,
            "url" => Self::Url,
            "email" => Self::Email,
            "phone_number" => Self::PhoneNumber,
            _ => Self::Other(value),
        }
    }
}

impl From<PropertyKind> for String {
    fn from(kind: PropertyKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type descriptor for one destination property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    #[serde(rename = "type")]
    pub kind: PropertyKind,

    /// Valid option names, only meaningful for enumerable kinds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl PropertyDescriptor {
    /// Descriptor without options
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            options: Vec::new(),
        }
    }

    /// Descriptor with an option list
    pub fn with_options<I, S>(kind: PropertyKind, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            options: options.into_iter().map(Into::into).collect(),
        }
    }
}

/// Property name to descriptor mapping for the destination database
///
/// Iteration order is by property name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationSchema {
    pub properties: BTreeMap<String, PropertyDescriptor>,
}

impl DestinationSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, descriptor: PropertyDescriptor) -> Self {
        self.properties.insert(name.into(), descriptor);
        self
    }

    /// Build from a Notion `GET /v1/databases/{id}` response
    ///
    /// Entries without a type become `Other("unknown")`; missing or malformed
    /// option lists become empty.
    pub fn from_notion(database: &JsonValue) -> Self {
        let mut schema = Self::new();
        let Some(properties) = database.get("properties").and_then(JsonValue::as_object) else {
            return schema;
        };

        for (name, raw) in properties {
            let type_name = raw
                .get("type")
                .and_then(JsonValue::as_str)
                .unwrap_or("unknown")
                .to_string();
            let kind = PropertyKind::from(type_name);

            let options = if kind.is_enumerable() {
                raw.get(kind.as_str())
                    .and_then(|config| config.get("options"))
                    .and_then(JsonValue::as_array)
                    .map(|opts| {
                        opts.iter()
                            .filter_map(|o| o.get("name").and_then(JsonValue::as_str))
                            .map(ToString::to_string)
                            .collect()
                    })
                    .unwrap_or_default()
            } else {
                Vec::new()
            };

            if kind.is_enumerable() && options.is_empty() {
                debug!(property = %name, kind = %kind, "Enumerable property has no options");
            }

            schema
                .properties
                .insert(name.clone(), PropertyDescriptor { kind, options });
        }

        schema
    }

    /// Look up a property
    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the schema has no properties
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Name of the first property of the given kind
    pub fn first_of_kind(&self, kind: &PropertyKind) -> Option<&str> {
        self.properties
            .iter()
            .find(|(_, d)| &d.kind == kind)
            .map(|(name, _)| name.as_str())
    }

    /// Name of the title property
    pub fn title_property(&self) -> Option<&str> {
        self.first_of_kind(&PropertyKind::Title)
    }

    /// Compact summary handed to the mapper: `{name: {type, options?}}`
    ///
    /// Only writable properties are listed.
    pub fn summary(&self) -> JsonValue {
        let entries: serde_json::Map<String, JsonValue> = self
            .properties
            .iter()
            .filter(|(_, d)| d.kind.is_writable())
            .map(|(name, d)| {
                let mut entry = json!({ "type": d.kind.as_str() });
                if d.kind.is_enumerable() {
                    entry["options"] = json!(d.options);
                }
                (name.clone(), entry)
            })
            .collect();
        JsonValue::Object(entries)
    }
}
