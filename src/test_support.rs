//! In-memory doubles for the service traits

use crate::destination::{
    DestinationSchema, DestinationWriter, EntryId, MappedProperties, PropertyValue, SchemaSource,
};
use crate::error::{Error, Result};
use crate::mapper::{StructuredTransformer, TransformRequest};
use crate::source::{SourceFetcher, SourceRecord};
use crate::types::{JsonObject, JsonValue, Timestamp};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Build a record with an `updatedAt` timestamp
pub(crate) fn record(id: &str, title: &str, updated_at: &str) -> SourceRecord {
    SourceRecord {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        updated_at: Some(updated_at.to_string()),
        is_starred: true,
        ..Default::default()
    }
}

// ============================================================================
// Schema Source
// ============================================================================

pub(crate) struct FakeSchemaSource {
    schema: Option<DestinationSchema>,
    calls: AtomicUsize,
}

impl FakeSchemaSource {
    pub(crate) fn new(schema: DestinationSchema) -> Self {
        Self {
            schema: Some(schema),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            schema: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaSource for FakeSchemaSource {
    async fn fetch_schema(&self) -> Result<DestinationSchema> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.schema
            .clone()
            .ok_or_else(|| Error::schema("schema endpoint unavailable"))
    }
}

// ============================================================================
// Source
// ============================================================================

#[derive(Default)]
pub(crate) struct FakeSource {
    records: Mutex<Vec<SourceRecord>>,
    fail: AtomicBool,
    panic: AtomicBool,
    delay: Mutex<Option<Duration>>,
    since: Mutex<Vec<Timestamp>>,
}

impl FakeSource {
    pub(crate) fn returning(records: Vec<SourceRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub(crate) fn failing() -> Self {
        let source = Self::default();
        source.fail.store(true, Ordering::SeqCst);
        source
    }

    /// Panic inside `fetch_since`, like a bug in a service client would
    pub(crate) fn panicking() -> Self {
        let source = Self::default();
        source.panic.store(true, Ordering::SeqCst);
        source
    }

    pub(crate) fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub(crate) fn set_records(&self, records: Vec<SourceRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub(crate) fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.since.lock().unwrap().len()
    }

    pub(crate) fn last_since(&self) -> Option<Timestamp> {
        self.since.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl SourceFetcher for FakeSource {
    async fn fetch_since(&self, since: &Timestamp) -> Result<Vec<SourceRecord>> {
        self.since.lock().unwrap().push(*since);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.panic.load(Ordering::SeqCst) {
            panic!("lifelog source blew up");
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::upstream("lifelog API unreachable"));
        }
        Ok(self.records.lock().unwrap().clone())
    }
}

// ============================================================================
// Writer
// ============================================================================

/// One captured `create_entry` call
#[derive(Debug, Clone)]
pub(crate) struct Written {
    pub properties: MappedProperties,
    pub body: Option<String>,
}

impl Written {
    pub(crate) fn title(&self) -> Option<&str> {
        self.properties.values().find_map(|value| match value {
            PropertyValue::Title(title) => Some(title.as_str()),
            _ => None,
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeWriter {
    fail_titles: Mutex<HashSet<String>>,
    attempts: AtomicUsize,
    written: Mutex<Vec<Written>>,
}

impl FakeWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reject entries whose title is one of `titles`
    pub(crate) fn failing_on<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let writer = Self::default();
        writer.set_failing_on(titles);
        writer
    }

    pub(crate) fn set_failing_on<I, S>(&self, titles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.fail_titles.lock().unwrap() = titles.into_iter().map(Into::into).collect();
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn written(&self) -> Vec<Written> {
        self.written.lock().unwrap().clone()
    }

    pub(crate) fn written_titles(&self) -> Vec<String> {
        self.written()
            .iter()
            .filter_map(|w| w.title().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl DestinationWriter for FakeWriter {
    async fn create_entry(
        &self,
        properties: &MappedProperties,
        body: Option<&str>,
    ) -> Result<EntryId> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        let entry = Written {
            properties: properties.clone(),
            body: body.map(str::to_string),
        };

        let rejected = entry
            .title()
            .is_some_and(|t| self.fail_titles.lock().unwrap().contains(t));
        if rejected {
            return Err(Error::http_status(400, "validation_error"));
        }

        self.written.lock().unwrap().push(entry);
        Ok(format!("page-{n}"))
    }
}

// ============================================================================
// Transformer
// ============================================================================

pub(crate) struct FakeTransformer {
    reply: Option<JsonObject>,
    requests: Mutex<Vec<TransformRequest>>,
}

impl FakeTransformer {
    /// Reply with `value`, which must be a JSON object
    pub(crate) fn returning(value: JsonValue) -> Self {
        let reply = match value {
            JsonValue::Object(map) => map,
            other => panic!("fake transformer reply must be an object, got {other}"),
        };
        Self {
            reply: Some(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<TransformRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl StructuredTransformer for FakeTransformer {
    async fn transform(&self, request: &TransformRequest) -> Result<JsonObject> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply
            .clone()
            .ok_or_else(|| Error::mapper("model unavailable"))
    }
}
