//! Sync engine module
//!
//! One polling cycle: read the watermark, fetch newer starred records, map
//! and write each one, then advance the watermark.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Runs cycles against the service traits
//! - `SyncConfig` - Engine tuning
//! - `CycleReport` / `CycleOutcome` - What one cycle did
//! - `SyncStats` - Totals across cycles

mod types;

pub use types::{CycleOutcome, CycleReport, SyncConfig, SyncStats, DEFAULT_STALL_THRESHOLD};

use crate::destination::DestinationWriter;
use crate::error::Error;
use crate::mapper::FieldMapper;
use crate::source::{SourceFetcher, SourceRecord};
use crate::state::{SchemaCache, WatermarkStore};
use crate::types::{format_timestamp, Timestamp};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Orchestrates fetch, map, write and watermark advance
pub struct SyncEngine {
    source: Arc<dyn SourceFetcher>,
    schema: SchemaCache,
    mapper: FieldMapper,
    writer: Arc<dyn DestinationWriter>,
    watermark: WatermarkStore,
    config: SyncConfig,
    stats: SyncStats,
    /// Cycles in a row with failed records and no watermark progress
    stalled_cycles: u32,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(
        source: Arc<dyn SourceFetcher>,
        schema: SchemaCache,
        mapper: FieldMapper,
        writer: Arc<dyn DestinationWriter>,
        watermark: WatermarkStore,
    ) -> Self {
        Self {
            source,
            schema,
            mapper,
            writer,
            watermark,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
            stalled_cycles: 0,
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Get the watermark store
    pub fn watermark(&self) -> &WatermarkStore {
        &self.watermark
    }

    /// Get the schema cache
    pub fn schema_cache(&self) -> &SchemaCache {
        &self.schema
    }

    /// Consecutive cycles that had failures but did not advance the watermark
    pub fn stalled_cycles(&self) -> u32 {
        self.stalled_cycles
    }

    /// Run one polling cycle
    ///
    /// Errors are logged and reported through the outcome; they never
    /// escape this call.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let start = Instant::now();
        let mut report = self.cycle().await;
        report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.track_stall(&report);
        self.stats.record_cycle(&report);

        info!(
            outcome = %report.outcome,
            fetched = report.fetched,
            succeeded = report.succeeded,
            failed = report.failed,
            fallbacks = report.fallbacks,
            duration_ms = report.duration_ms,
            "Cycle finished"
        );
        report
    }

    async fn cycle(&mut self) -> CycleReport {
        let watermark = match self.watermark.load().await {
            Ok(ts) => ts,
            Err(e) => {
                error!(stage = "watermark", error = %e, "Could not load watermark");
                return CycleReport::new(CycleOutcome::StateUnavailable);
            }
        };

        let mut report = CycleReport::new(CycleOutcome::NoNewRecords);
        report.watermark_before = Some(watermark);
        report.watermark_after = Some(watermark);

        debug!(since = %format_timestamp(&watermark), "Fetching starred lifelogs");
        let fetched = match self.source.fetch_since(&watermark).await {
            Ok(records) => records,
            Err(e) => {
                error!(stage = "fetch", error = %e, "Lifelog fetch failed");
                report.outcome = CycleOutcome::FetchFailed;
                return report;
            }
        };
        report.fetched = fetched.len();

        let (pending, stale) = select_new(fetched, &watermark);
        report.stale_skipped = stale;
        if pending.is_empty() {
            debug!(stale, "No new records");
            return report;
        }

        let schema = match self.schema.get().await {
            Ok(schema) => schema,
            Err(e) => {
                error!(stage = "schema", error = %e, "Destination schema unavailable");
                report.outcome = CycleOutcome::SchemaUnavailable;
                return report;
            }
        };

        let mut results = Vec::with_capacity(pending.len());
        for record in &pending {
            let ts = record.effective_timestamp();
            let mapping = self.mapper.map(record, &schema).await;
            if mapping.used_fallback() {
                report.fallbacks += 1;
            }

            match self
                .writer
                .create_entry(&mapping.properties, record.body())
                .await
            {
                Ok(entry_id) => {
                    debug!(record_id = record.label(), entry_id = %entry_id, "Record written");
                    report.succeeded += 1;
                    results.push((ts, true));
                }
                Err(e) => {
                    let error = Error::write(record.label(), e.to_string());
                    warn!(stage = "write", error = %error, "Record skipped");
                    report.failed += 1;
                    results.push((ts, false));
                }
            }
        }

        if report.succeeded == 0 {
            warn!(failed = report.failed, "No records succeeded, watermark unchanged");
            report.outcome = CycleOutcome::AllFailed;
            return report;
        }
        report.outcome = CycleOutcome::Processed;

        if let Some(candidate) = advance_candidate(&results) {
            match self.watermark.advance(candidate).await {
                Ok(Some(advanced)) => {
                    info!(watermark = %format_timestamp(&advanced), "Watermark advanced");
                    report.watermark_after = Some(advanced);
                }
                Ok(None) => {}
                Err(e) => error!(stage = "watermark", error = %e, "Could not persist watermark"),
            }
        }

        report
    }

    fn track_stall(&mut self, report: &CycleReport) {
        if report.failed > 0 && !report.advanced() {
            self.stalled_cycles += 1;
            if self.stalled_cycles >= self.config.stall_threshold {
                error!(
                    cycles = self.stalled_cycles,
                    failed = report.failed,
                    watermark = ?report.watermark_before.as_ref().map(format_timestamp),
                    "Sync is stuck on records that keep failing; \
                     use `watermark set` to skip past them"
                );
            }
        } else if report.advanced() || matches!(report.outcome, CycleOutcome::Processed) {
            self.stalled_cycles = 0;
        }
    }
}

/// Keep records newer than the watermark, oldest first
///
/// Records without an effective timestamp are always kept and sort first.
/// Returns the kept records and the number dropped as stale.
pub fn select_new(records: Vec<SourceRecord>, watermark: &Timestamp) -> (Vec<SourceRecord>, usize) {
    let total = records.len();
    let mut keyed: Vec<(Option<Timestamp>, SourceRecord)> = records
        .into_iter()
        .map(|record| (record.effective_timestamp(), record))
        .filter(|(ts, _)| ts.map_or(true, |ts| ts > *watermark))
        .collect();
    let stale = total - keyed.len();

    keyed.sort_by_key(|(ts, _)| *ts);
    (keyed.into_iter().map(|(_, record)| record).collect(), stale)
}

/// Watermark candidate from per-record `(timestamp, succeeded)` results
///
/// The newest successful timestamp that is strictly older than the oldest
/// failed timed record, so a failure is always fetched again next cycle.
pub fn advance_candidate(results: &[(Option<Timestamp>, bool)]) -> Option<Timestamp> {
    let earliest_failure = results
        .iter()
        .filter(|(_, ok)| !ok)
        .filter_map(|(ts, _)| *ts)
        .min();

    results
        .iter()
        .filter(|(_, ok)| *ok)
        .filter_map(|(ts, _)| *ts)
        .filter(|ts| earliest_failure.map_or(true, |failed| *ts < failed))
        .max()
}

#[cfg(test)]
mod tests;
