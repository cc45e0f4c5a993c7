//! Destination module
//!
//! The Notion database the synced lifelogs land in: its schema model, the
//! typed property values written to it, and the client that talks to it.

mod client;
mod schema;
mod values;

pub use client::{
    DestinationWriter, NotionClient, NotionClientConfig, SchemaSource, DEFAULT_NOTION_BASE_URL,
    NOTION_VERSION,
};
pub use schema::{DestinationSchema, PropertyDescriptor, PropertyKind};
pub use values::{
    paragraph_blocks, properties_to_notion, rich_text_runs, EntryId, MappedProperties,
    PropertyValue, MAX_BODY_CHARS, MAX_CHILD_BLOCKS, MAX_RICH_TEXT_CHARS, MAX_RICH_TEXT_RUNS,
};
