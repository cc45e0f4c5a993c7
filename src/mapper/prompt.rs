//! Prompt construction for the mapping model

use crate::destination::DestinationSchema;
use crate::error::Result;
use crate::source::SourceRecord;

const SYSTEM_PROMPT: &str = "\
You map a lifelog entry onto the properties of a Notion database.
Reply with one JSON object and nothing else.
Use only property names that appear in the schema. Omit properties you cannot fill.
For select, multi_select and status properties use only the listed options, \
and omit the property when no option fits. Never invent new options.
Value formats: title and rich_text are strings, number is a number, \
select and status are an option string, multi_select is an array of option strings, \
date is an ISO-8601 string or {\"start\": ..., \"end\": ...}, checkbox is a boolean, \
url, email and phone_number are strings.";

/// Fixed instructions sent as the system message
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// User message with the schema summary and the full record
pub fn user_prompt(record: &SourceRecord, schema: &DestinationSchema) -> Result<String> {
    let schema_json = serde_json::to_string_pretty(&schema.summary())?;
    let record_json = serde_json::to_string_pretty(record)?;
    Ok(format!(
        "Database schema:\n{schema_json}\n\nLifelog entry:\n{record_json}\n\n\
         Return the JSON object of property values."
    ))
}
