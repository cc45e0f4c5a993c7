//! Field mapping module
//!
//! Turns a lifelog record into destination property values.
//!
//! # Overview
//!
//! The mapper module provides:
//! - `FieldMapper` - Tries the language model, falls back to a fixed mapping
//! - `StructuredTransformer` - Seam for the text-to-JSON model call
//! - `OpenAiClient` - Chat completions implementation in JSON mode
//! - `restrict_to_schema` - Keeps only schema keys, known options and
//!   values that fit the property type
//! - `fallback_properties` - Deterministic title + body mapping

mod coerce;
mod fallback;
mod field_mapper;
mod prompt;
mod transformer;

pub use coerce::{match_option, restrict_to_schema};
pub use fallback::{fallback_properties, FALLBACK_TITLE};
pub use field_mapper::{FieldMapper, MappingOutcome, MappingStrategy};
pub use prompt::{system_prompt, user_prompt};
pub use transformer::{
    OpenAiClient, OpenAiClientConfig, StructuredTransformer, TransformRequest,
    DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL,
};
