//! Response shape normalization
//!
//! The lifelog API has returned its records under several envelopes over
//! time. Each known envelope is a matcher; they are tried in order and the
//! first hit wins. An unrecognized body yields no records.

use super::types::SourceRecord;
use crate::types::JsonValue;
use tracing::warn;

/// A named matcher that locates the record array inside a response body
struct Shape {
    name: &'static str,
    locate: fn(&JsonValue) -> Option<&Vec<JsonValue>>,
}

const SHAPES: &[Shape] = &[
    Shape {
        name: "array",
        locate: bare_array,
    },
    Shape {
        name: "lifelogs",
        locate: lifelogs,
    },
    Shape {
        name: "data.lifelogs",
        locate: data_lifelogs,
    },
    Shape {
        name: "data",
        locate: data_array,
    },
    Shape {
        name: "results",
        locate: results,
    },
    Shape {
        name: "items",
        locate: items,
    },
];

fn bare_array(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    v.as_array()
}

fn lifelogs(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    v.get("lifelogs")?.as_array()
}

fn data_lifelogs(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    v.get("data")?.get("lifelogs")?.as_array()
}

fn data_array(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    v.get("data")?.as_array()
}

fn results(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    v.get("results")?.as_array()
}

fn items(v: &JsonValue) -> Option<&Vec<JsonValue>> {
    v.get("items")?.as_array()
}

/// Records extracted from one response body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Records in upstream order
    pub records: Vec<SourceRecord>,
    /// Name of the matched shape, `None` when nothing matched
    pub shape: Option<&'static str>,
    /// Entries inside the matched array that were not valid records
    pub skipped: usize,
}

impl Normalized {
    /// Whether the body matched a known envelope
    pub fn is_recognized(&self) -> bool {
        self.shape.is_some()
    }
}

/// Extract source records from a lifelog response body
///
/// Entries that are not JSON objects, or that fail to deserialize, are
/// skipped with a warning rather than failing the whole batch.
pub fn normalize_response(body: &JsonValue) -> Normalized {
    let Some((shape, entries)) = SHAPES
        .iter()
        .find_map(|s| (s.locate)(body).map(|entries| (s.name, entries)))
    else {
        return Normalized::default();
    };

    let mut records = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            warn!(index, shape, "Skipping non-object lifelog entry");
            skipped += 1;
            continue;
        }
        match serde_json::from_value::<SourceRecord>(entry.clone()) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(index, shape, error = %e, "Skipping malformed lifelog entry");
                skipped += 1;
            }
        }
    }

    Normalized {
        records,
        shape: Some(shape),
        skipped,
    }
}
