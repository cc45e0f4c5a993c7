//! Tests for WatermarkStore

use super::*;
use crate::types::{format_timestamp, parse_timestamp};
use chrono::Utc;
use tempfile::tempdir;

#[tokio::test]
async fn test_first_load_initializes_to_now_and_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("watermark.json");
    let store = WatermarkStore::new(&path);

    let before = Utc::now();
    let loaded = store.load().await.unwrap();
    let after = Utc::now();

    assert!(loaded >= before && loaded <= after);
    assert!(path.exists());

    // Subsequent loads return the persisted value, not a new "now"
    let again = store.load().await.unwrap();
    assert_eq!(format_timestamp(&again), format_timestamp(&loaded));
}

#[tokio::test]
async fn test_peek_does_not_initialize() {
    let dir = tempdir().unwrap();
    let store = WatermarkStore::new(dir.path().join("watermark.json"));

    assert!(store.peek().await.unwrap().is_none());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_save_writes_expected_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("watermark.json");
    let store = WatermarkStore::new(&path);

    let ts = parse_timestamp("2025-01-01T00:00:05Z").unwrap();
    store.save(&ts).await.unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(json, serde_json::json!({"lastSeenTime": "2025-01-01T00:00:05Z"}));
    assert!(!path.with_extension("tmp").exists());
}

#[tokio::test]
async fn test_reload_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("watermark.json");

    let ts = parse_timestamp("2024-12-31T23:59:59Z").unwrap();
    WatermarkStore::new(&path).save(&ts).await.unwrap();

    let restored = WatermarkStore::new(&path).load().await.unwrap();
    assert_eq!(restored, ts);
}

#[tokio::test]
async fn test_advance_is_monotonic() {
    let dir = tempdir().unwrap();
    let store = WatermarkStore::new(dir.path().join("watermark.json"));

    let t1 = parse_timestamp("2025-01-01T00:00:05Z").unwrap();
    let t0 = parse_timestamp("2025-01-01T00:00:01Z").unwrap();
    let t2 = parse_timestamp("2025-01-01T00:00:09Z").unwrap();

    store.save(&t1).await.unwrap();

    assert_eq!(store.advance(t0).await.unwrap(), None);
    assert_eq!(store.load().await.unwrap(), t1);

    assert_eq!(store.advance(t1).await.unwrap(), None);

    assert_eq!(store.advance(t2).await.unwrap(), Some(t2));
    assert_eq!(store.load().await.unwrap(), t2);
}

#[tokio::test]
async fn test_corrupt_file_is_state_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("watermark.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = WatermarkStore::new(&path).load().await.unwrap_err();
    assert!(matches!(err, crate::error::Error::State { .. }));
    // The corrupt file is left for an operator to inspect
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
}

#[tokio::test]
async fn test_invalid_timestamp_is_state_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("watermark.json");
    std::fs::write(&path, r#"{"lastSeenTime": "last tuesday"}"#).unwrap();

    let err = WatermarkStore::new(&path).peek().await.unwrap_err();
    assert!(err.to_string().contains("Invalid lastSeenTime"));
}

#[tokio::test]
async fn test_unreadable_path_is_state_error() {
    let dir = tempdir().unwrap();
    // A directory where the file should be cannot be read as a file
    let path = dir.path().join("watermark.json");
    std::fs::create_dir(&path).unwrap();

    let err = WatermarkStore::new(&path).load().await.unwrap_err();
    assert!(matches!(err, crate::error::Error::State { .. }));
}
