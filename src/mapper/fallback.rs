//! Deterministic mapping used when the model is unavailable

use crate::destination::{DestinationSchema, MappedProperties, PropertyKind, PropertyValue};
use crate::source::SourceRecord;
use tracing::warn;

/// Title written when the record has none
pub const FALLBACK_TITLE: &str = "Untitled Lifelog";

/// Map the record's title and body onto the schema without a model
///
/// Only properties present in `schema` are populated.
pub fn fallback_properties(record: &SourceRecord, schema: &DestinationSchema) -> MappedProperties {
    let mut properties = MappedProperties::new();

    match schema.title_property() {
        Some(title_property) => {
            let title = record.title().unwrap_or(FALLBACK_TITLE);
            properties.insert(
                title_property.to_string(),
                PropertyValue::Title(title.to_string()),
            );
        }
        None => warn!(
            record_id = record.label(),
            "Destination schema has no title property, writing without a title"
        ),
    }

    if let (Some(body), Some(notes)) = (
        record.body(),
        schema.first_of_kind(&PropertyKind::RichText),
    ) {
        properties.insert(notes.to_string(), PropertyValue::RichText(body.to_string()));
    }

    properties
}
