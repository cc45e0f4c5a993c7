//! Engine types
//!
//! Configuration, per-cycle reports and cumulative statistics.

use crate::types::Timestamp;
use std::fmt;

/// Default number of consecutive all-failed cycles before escalating
pub const DEFAULT_STALL_THRESHOLD: u32 = 10;

/// Configuration for the sync engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Consecutive all-failed cycles before an error is logged
    pub stall_threshold: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            stall_threshold: DEFAULT_STALL_THRESHOLD,
        }
    }
}

impl SyncConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stall threshold
    #[must_use]
    pub fn with_stall_threshold(mut self, threshold: u32) -> Self {
        self.stall_threshold = threshold.max(1);
        self
    }
}

/// How a polling cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Watermark could not be read or initialized
    StateUnavailable,
    /// Upstream fetch failed
    FetchFailed,
    /// Nothing newer than the watermark
    NoNewRecords,
    /// Destination schema could not be obtained
    SchemaUnavailable,
    /// At least one record was written
    Processed,
    /// Every record failed to write
    AllFailed,
}

impl CycleOutcome {
    /// Whether the cycle ended on an error before or during processing
    pub fn is_failure(self) -> bool {
        !matches!(self, Self::NoNewRecords | Self::Processed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StateUnavailable => "state_unavailable",
            Self::FetchFailed => "fetch_failed",
            Self::NoNewRecords => "no_new_records",
            Self::SchemaUnavailable => "schema_unavailable",
            Self::Processed => "processed",
            Self::AllFailed => "all_failed",
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one polling cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Records returned by the source
    pub fetched: usize,
    /// Fetched records at or before the watermark
    pub stale_skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Records mapped with the fallback strategy
    pub fallbacks: usize,
    pub watermark_before: Option<Timestamp>,
    pub watermark_after: Option<Timestamp>,
    pub duration_ms: u64,
}

impl CycleReport {
    pub(crate) fn new(outcome: CycleOutcome) -> Self {
        Self {
            outcome,
            fetched: 0,
            stale_skipped: 0,
            succeeded: 0,
            failed: 0,
            fallbacks: 0,
            watermark_before: None,
            watermark_after: None,
            duration_ms: 0,
        }
    }

    /// True when this cycle moved the watermark forward
    pub fn advanced(&self) -> bool {
        match (self.watermark_before, self.watermark_after) {
            (Some(before), Some(after)) => after > before,
            _ => false,
        }
    }
}

/// Statistics accumulated across cycles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Cycles run
    pub cycles: usize,
    /// Cycles that ended in a failure outcome
    pub failed_cycles: usize,
    /// Records written
    pub records_synced: usize,
    /// Records that failed to write
    pub records_failed: usize,
    /// Records mapped with the fallback
    pub fallbacks: usize,
    /// Total time spent in cycles
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a cycle report into the totals
    pub fn record_cycle(&mut self, report: &CycleReport) {
        self.cycles += 1;
        if report.outcome.is_failure() {
            self.failed_cycles += 1;
        }
        self.records_synced += report.succeeded;
        self.records_failed += report.failed;
        self.fallbacks += report.fallbacks;
        self.duration_ms += report.duration_ms;
    }
}
