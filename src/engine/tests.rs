//! Tests for engine module

use super::*;
use crate::destination::{DestinationSchema, PropertyDescriptor, PropertyKind, PropertyValue};
use crate::state::WatermarkStore;
use crate::test_support::{record, FakeSchemaSource, FakeSource, FakeTransformer, FakeWriter};
use crate::types::{format_timestamp, parse_timestamp};
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn ts(raw: &str) -> Timestamp {
    parse_timestamp(raw).unwrap()
}

fn notes_schema() -> DestinationSchema {
    DestinationSchema::new()
        .with_property("Name", PropertyDescriptor::new(PropertyKind::Title))
        .with_property("Notes", PropertyDescriptor::new(PropertyKind::RichText))
}

struct Harness {
    _dir: TempDir,
    source: Arc<FakeSource>,
    schema_source: Arc<FakeSchemaSource>,
    writer: Arc<FakeWriter>,
    engine: SyncEngine,
}

fn harness_with(
    source: FakeSource,
    schema_source: FakeSchemaSource,
    writer: FakeWriter,
    mapper: FieldMapper,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(source);
    let schema_source = Arc::new(schema_source);
    let writer = Arc::new(writer);

    let engine = SyncEngine::new(
        source.clone(),
        SchemaCache::new(dir.path().join("schema_cache.json"), schema_source.clone()),
        mapper,
        writer.clone(),
        WatermarkStore::new(dir.path().join("watermark.json")),
    );

    Harness {
        _dir: dir,
        source,
        schema_source,
        writer,
        engine,
    }
}

fn harness(source: FakeSource, writer: FakeWriter) -> Harness {
    harness_with(
        source,
        FakeSchemaSource::new(notes_schema()),
        writer,
        FieldMapper::fallback_only(),
    )
}

async fn seed_watermark(h: &Harness, raw: &str) {
    h.engine.watermark().save(&ts(raw)).await.unwrap();
}

async fn stored_watermark(h: &Harness) -> String {
    format_timestamp(&h.engine.watermark().peek().await.unwrap().unwrap())
}

// ============================================================================
// Selection and Advance Rules
// ============================================================================

#[test]
fn test_select_new_filters_and_orders() {
    let untimed = SourceRecord {
        id: Some("u".into()),
        ..Default::default()
    };
    let records = vec![
        record("c", "C", "2025-01-01T00:00:03Z"),
        record("old", "Old", "2025-01-01T00:00:00Z"),
        untimed,
        record("a", "A", "2025-01-01T00:00:01Z"),
    ];

    let (kept, stale) = select_new(records, &ts("2025-01-01T00:00:00Z"));
    let ids: Vec<_> = kept.iter().map(SourceRecord::label).collect();

    assert_eq!(ids, vec!["u", "a", "c"]);
    assert_eq!(stale, 1);
}

#[test]
fn test_select_new_is_stable_for_equal_timestamps() {
    let records = vec![
        record("first", "1", "2025-01-01T00:00:02Z"),
        record("second", "2", "2025-01-01T00:00:02Z"),
    ];
    let (kept, _) = select_new(records, &ts("2025-01-01T00:00:00Z"));
    assert_eq!(kept[0].label(), "first");
    assert_eq!(kept[1].label(), "second");
}

#[test]
fn test_advance_candidate_all_succeeded() {
    let results = [
        (Some(ts("2025-01-01T00:00:01Z")), true),
        (None, true),
        (Some(ts("2025-01-01T00:00:03Z")), true),
    ];
    assert_eq!(advance_candidate(&results), Some(ts("2025-01-01T00:00:03Z")));
}

#[test]
fn test_advance_candidate_stops_before_failure() {
    let results = [
        (Some(ts("2025-01-01T00:00:01Z")), true),
        (Some(ts("2025-01-01T00:00:02Z")), false),
        (Some(ts("2025-01-01T00:00:03Z")), true),
    ];
    assert_eq!(advance_candidate(&results), Some(ts("2025-01-01T00:00:01Z")));
}

#[test]
fn test_advance_candidate_none() {
    assert_eq!(advance_candidate(&[]), None);
    assert_eq!(advance_candidate(&[(None, true)]), None);
    assert_eq!(
        advance_candidate(&[(Some(ts("2025-01-01T00:00:01Z")), false)]),
        None
    );
    // An untimed failure does not hold the watermark back
    assert_eq!(
        advance_candidate(&[(None, false), (Some(ts("2025-01-01T00:00:01Z")), true)]),
        Some(ts("2025-01-01T00:00:01Z"))
    );
}

// ============================================================================
// Cycle Scenarios
// ============================================================================

#[tokio::test]
async fn test_first_run_initializes_watermark() {
    let mut h = harness(FakeSource::returning(vec![]), FakeWriter::new());
    let before = Utc::now();

    let report = h.engine.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::NoNewRecords);
    let stored = h.engine.watermark().peek().await.unwrap().unwrap();
    assert!(stored >= before - chrono::Duration::seconds(1));
    assert!(stored <= Utc::now());
    assert_eq!(h.source.last_since(), Some(stored));
    assert_eq!(h.schema_source.calls(), 0);
}

#[tokio::test]
async fn test_successful_write_sets_exact_watermark() {
    let mut h = harness(
        FakeSource::returning(vec![record("a", "T", "2025-01-01T00:00:05Z")]),
        FakeWriter::new(),
    );
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    let report = h.engine.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::Processed);
    assert_eq!(report.succeeded, 1);
    assert!(report.advanced());
    assert_eq!(stored_watermark(&h).await, "2025-01-01T00:00:05Z");
    assert_eq!(h.writer.written_titles(), vec!["T"]);
}

#[tokio::test]
async fn test_only_record_fails_watermark_unchanged() {
    let mut h = harness(
        FakeSource::returning(vec![record("a", "T", "2025-01-01T00:00:05Z")]),
        FakeWriter::failing_on(["T"]),
    );
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    let report = h.engine.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::AllFailed);
    assert_eq!(report.failed, 1);
    assert!(!report.advanced());
    assert_eq!(stored_watermark(&h).await, "2025-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_failed_record_is_retried_next_cycle() {
    let records = vec![
        record("a", "A", "2025-01-01T00:00:01Z"),
        record("b", "B", "2025-01-01T00:00:02Z"),
        record("c", "C", "2025-01-01T00:00:03Z"),
    ];
    let mut h = harness(FakeSource::returning(records), FakeWriter::failing_on(["B"]));
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    let report = h.engine.run_cycle().await;
    assert_eq!((report.succeeded, report.failed), (2, 1));
    assert_eq!(stored_watermark(&h).await, "2025-01-01T00:00:01Z");

    h.writer.set_failing_on(Vec::<String>::new());
    let report = h.engine.run_cycle().await;

    assert_eq!(report.stale_skipped, 1);
    assert_eq!(report.succeeded, 2);
    assert_eq!(stored_watermark(&h).await, "2025-01-01T00:00:03Z");
    assert_eq!(h.writer.written_titles(), vec!["A", "C", "B", "C"]);
}

#[tokio::test]
async fn test_advance_ignores_failed_timestamps() {
    let records = vec![
        record("late", "Late", "2025-01-01T00:00:09Z"),
        record("early", "Early", "2025-01-01T00:00:03Z"),
    ];
    let mut h = harness(FakeSource::returning(records), FakeWriter::failing_on(["Late"]));
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    h.engine.run_cycle().await;

    assert_eq!(stored_watermark(&h).await, "2025-01-01T00:00:03Z");
}

#[tokio::test]
async fn test_untimed_record_written_without_advance() {
    let untimed = SourceRecord {
        id: Some("u".into()),
        title: Some("Untimed".into()),
        ..Default::default()
    };
    let mut h = harness(
        FakeSource::returning(vec![record("a", "Timed", "2025-01-01T00:00:02Z"), untimed]),
        FakeWriter::new(),
    );
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    let report = h.engine.run_cycle().await;

    assert_eq!(report.succeeded, 2);
    assert_eq!(h.writer.written_titles(), vec!["Untimed", "Timed"]);
    assert_eq!(stored_watermark(&h).await, "2025-01-01T00:00:02Z");
}

#[tokio::test]
async fn test_only_untimed_records_leave_watermark() {
    let untimed = SourceRecord {
        title: Some("Untimed".into()),
        ..Default::default()
    };
    let mut h = harness(FakeSource::returning(vec![untimed]), FakeWriter::new());
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    let report = h.engine.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::Processed);
    assert!(!report.advanced());
    assert_eq!(h.writer.attempts(), 1);
    assert_eq!(stored_watermark(&h).await, "2025-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_records_at_watermark_are_stale() {
    let mut h = harness(
        FakeSource::returning(vec![record("a", "T", "2025-01-01T00:00:05Z")]),
        FakeWriter::new(),
    );
    seed_watermark(&h, "2025-01-01T00:00:05Z").await;

    let report = h.engine.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::NoNewRecords);
    assert_eq!((report.fetched, report.stale_skipped), (1, 1));
    assert_eq!(h.schema_source.calls(), 0);
    assert_eq!(h.writer.attempts(), 0);
}

#[tokio::test]
async fn test_fetch_failure_leaves_state() {
    let mut h = harness(FakeSource::failing(), FakeWriter::new());
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    let report = h.engine.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::FetchFailed);
    assert_eq!(h.schema_source.calls(), 0);
    assert_eq!(stored_watermark(&h).await, "2025-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_schema_failure_skips_cycle() {
    let mut h = harness_with(
        FakeSource::returning(vec![record("a", "T", "2025-01-01T00:00:05Z")]),
        FakeSchemaSource::failing(),
        FakeWriter::new(),
        FieldMapper::fallback_only(),
    );
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    let report = h.engine.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::SchemaUnavailable);
    assert_eq!(h.writer.attempts(), 0);
    assert_eq!(stored_watermark(&h).await, "2025-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_corrupt_watermark_skips_fetch() {
    let mut h = harness(FakeSource::returning(vec![]), FakeWriter::new());
    tokio::fs::write(h.engine.watermark().path(), "{oops")
        .await
        .unwrap();

    let report = h.engine.run_cycle().await;

    assert_eq!(report.outcome, CycleOutcome::StateUnavailable);
    assert_eq!(h.source.calls(), 0);
}

#[tokio::test]
async fn test_transformer_failure_uses_fallback() {
    let record = SourceRecord {
        id: Some("a".into()),
        title: Some("X".into()),
        markdown: Some("hello".into()),
        updated_at: Some("2025-01-01T00:00:05Z".into()),
        ..Default::default()
    };
    let mut h = harness_with(
        FakeSource::returning(vec![record]),
        FakeSchemaSource::new(notes_schema()),
        FakeWriter::new(),
        FieldMapper::new(Arc::new(FakeTransformer::failing())),
    );
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    let report = h.engine.run_cycle().await;

    assert_eq!(report.fallbacks, 1);
    let written = h.writer.written();
    assert_eq!(
        written[0].properties.get("Notes"),
        Some(&PropertyValue::RichText("hello".into()))
    );
    assert_eq!(written[0].body.as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_transformer_output_is_written() {
    let mut h = harness_with(
        FakeSource::returning(vec![record("a", "T", "2025-01-01T00:00:05Z")]),
        FakeSchemaSource::new(notes_schema()),
        FakeWriter::new(),
        FieldMapper::new(Arc::new(FakeTransformer::returning(json!({
            "Name": "Standup summary",
            "Notes": "Discussed launch"
        })))),
    );
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    let report = h.engine.run_cycle().await;

    assert_eq!(report.fallbacks, 0);
    assert_eq!(h.writer.written_titles(), vec!["Standup summary"]);
}

// ============================================================================
// Cross-cycle Properties
// ============================================================================

#[tokio::test]
async fn test_watermark_never_decreases() {
    let mut h = harness(FakeSource::returning(vec![]), FakeWriter::new());
    seed_watermark(&h, "2025-01-01T00:00:05Z").await;

    let batches = [
        (vec![record("a", "A", "2025-01-01T00:00:07Z")], vec![]),
        (vec![record("b", "B", "2025-01-01T00:00:06Z")], vec![]),
        (
            vec![
                record("c", "C", "2025-01-01T00:00:08Z"),
                record("d", "D", "2025-01-01T00:00:09Z"),
            ],
            vec!["C"],
        ),
        (vec![record("e", "E", "2025-01-01T00:00:01Z")], vec![]),
    ];

    let mut last = ts("2025-01-01T00:00:05Z");
    for (records, failing) in batches {
        h.source.set_records(records);
        h.writer.set_failing_on(failing);
        h.engine.run_cycle().await;

        let current = h.engine.watermark().peek().await.unwrap().unwrap();
        assert!(current >= last, "{current} < {last}");
        last = current;
    }
    assert_eq!(format_timestamp(&last), "2025-01-01T00:00:07Z");
}

#[tokio::test]
async fn test_rerun_with_same_watermark_is_deterministic() {
    let body_record = SourceRecord {
        id: Some("a".into()),
        title: Some("Walk".into()),
        text: Some("went outside".into()),
        updated_at: Some("2025-01-01T00:00:05Z".into()),
        ..Default::default()
    };
    let mut h = harness(FakeSource::returning(vec![body_record]), FakeWriter::new());

    seed_watermark(&h, "2025-01-01T00:00:00Z").await;
    h.engine.run_cycle().await;
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;
    h.engine.run_cycle().await;

    let written = h.writer.written();
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].properties, written[1].properties);
    assert_eq!(written[0].body, written[1].body);
}

#[tokio::test]
async fn test_stall_counter_and_stats() {
    let mut h = harness(
        FakeSource::returning(vec![record("a", "Bad", "2025-01-01T00:00:05Z")]),
        FakeWriter::failing_on(["Bad"]),
    );
    h.engine = h.engine.with_config(SyncConfig::new().with_stall_threshold(2));
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    for _ in 0..3 {
        h.engine.run_cycle().await;
    }
    assert_eq!(h.engine.stalled_cycles(), 3);

    h.writer.set_failing_on(Vec::<String>::new());
    h.engine.run_cycle().await;
    assert_eq!(h.engine.stalled_cycles(), 0);

    let stats = h.engine.stats();
    assert_eq!(stats.cycles, 4);
    assert_eq!(stats.failed_cycles, 3);
    assert_eq!(stats.records_failed, 3);
    assert_eq!(stats.records_synced, 1);
}

#[tokio::test]
async fn test_failing_oldest_record_counts_as_stall() {
    let records = vec![
        record("bad", "Bad", "2025-01-01T00:00:01Z"),
        record("good", "Good", "2025-01-01T00:00:02Z"),
    ];
    let mut h = harness(FakeSource::returning(records), FakeWriter::failing_on(["Bad"]));
    h.engine = h.engine.with_config(SyncConfig::new().with_stall_threshold(2));
    seed_watermark(&h, "2025-01-01T00:00:00Z").await;

    for cycle in 1..=3 {
        let report = h.engine.run_cycle().await;
        assert_eq!(report.outcome, CycleOutcome::Processed);
        assert!(!report.advanced());
        assert_eq!(h.engine.stalled_cycles(), cycle);
    }
    assert!(h.engine.stalled_cycles() >= 2);
    assert_eq!(stored_watermark(&h).await, "2025-01-01T00:00:00Z");

    h.writer.set_failing_on(Vec::<String>::new());
    let report = h.engine.run_cycle().await;
    assert!(report.advanced());
    assert_eq!(h.engine.stalled_cycles(), 0);
    assert_eq!(stored_watermark(&h).await, "2025-01-01T00:00:02Z");
}

#[test]
fn test_cycle_outcome_display() {
    assert_eq!(CycleOutcome::NoNewRecords.to_string(), "no_new_records");
    assert!(CycleOutcome::FetchFailed.is_failure());
    assert!(!CycleOutcome::Processed.is_failure());
}
