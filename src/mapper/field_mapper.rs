//! Field mapper combining the model and the fallback

use super::coerce::restrict_to_schema;
use super::fallback::fallback_properties;
use super::prompt::{system_prompt, user_prompt};
use super::transformer::{StructuredTransformer, TransformRequest};
use crate::destination::{DestinationSchema, MappedProperties};
use crate::error::{Error, Result};
use crate::source::SourceRecord;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sampling temperature for mapping calls
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Which strategy produced the properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingStrategy {
    /// Model output restricted to the schema
    Transformer,
    /// Deterministic title + body mapping
    Fallback,
}

/// Result of mapping one record
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOutcome {
    pub properties: MappedProperties,
    pub strategy: MappingStrategy,
}

impl MappingOutcome {
    /// True when the fallback mapping was used
    pub fn used_fallback(&self) -> bool {
        self.strategy == MappingStrategy::Fallback
    }
}

/// Maps records onto the destination schema
///
/// Never fails: any model error degrades to the fallback mapping.
#[derive(Clone)]
pub struct FieldMapper {
    transformer: Option<Arc<dyn StructuredTransformer>>,
    temperature: f32,
}

impl fmt::Debug for FieldMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMapper")
            .field("transformer", &self.transformer.is_some())
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl FieldMapper {
    /// Mapper backed by a model
    pub fn new(transformer: Arc<dyn StructuredTransformer>) -> Self {
        Self {
            transformer: Some(transformer),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Mapper that always uses the fallback
    pub fn fallback_only() -> Self {
        Self {
            transformer: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Override the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Map a record, falling back on any model failure
    pub async fn map(&self, record: &SourceRecord, schema: &DestinationSchema) -> MappingOutcome {
        let Some(transformer) = &self.transformer else {
            return self.fallback(record, schema);
        };

        match self.map_with(transformer.as_ref(), record, schema).await {
            Ok(properties) => {
                debug!(record_id = record.label(), count = properties.len(), "Mapped record");
                MappingOutcome {
                    properties,
                    strategy: MappingStrategy::Transformer,
                }
            }
            Err(e) => {
                warn!(record_id = record.label(), error = %e, "Mapping failed, using fallback");
                self.fallback(record, schema)
            }
        }
    }

    async fn map_with(
        &self,
        transformer: &dyn StructuredTransformer,
        record: &SourceRecord,
        schema: &DestinationSchema,
    ) -> Result<MappedProperties> {
        let request = TransformRequest {
            system: system_prompt().to_string(),
            user: user_prompt(record, schema)?,
            temperature: self.temperature,
        };

        let raw = transformer.transform(&request).await?;
        let properties = restrict_to_schema(&raw, schema);
        if properties.is_empty() {
            return Err(Error::mapper("no usable properties in model output"));
        }
        Ok(properties)
    }

    fn fallback(&self, record: &SourceRecord, schema: &DestinationSchema) -> MappingOutcome {
        MappingOutcome {
            properties: fallback_properties(record, schema),
            strategy: MappingStrategy::Fallback,
        }
    }
}
