//! Polling scheduler
//!
//! Runs one cycle immediately, then one per interval until shutdown. A tick
//! that lands while a cycle is still running is skipped.

use crate::engine::SyncEngine;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30_000);

/// What the scheduler did before it stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerSummary {
    /// Cycles started
    pub cycles_started: usize,
    /// Ticks skipped because a cycle was still running
    pub ticks_skipped: usize,
    /// Cycles that ended in a panic
    pub cycles_panicked: usize,
}

/// Drives the engine on a fixed interval
pub struct Scheduler {
    engine: Arc<Mutex<SyncEngine>>,
    interval: Duration,
}

impl Scheduler {
    /// Create a scheduler that owns the engine
    pub fn new(engine: SyncEngine, interval: Duration) -> Self {
        Self::with_shared(Arc::new(Mutex::new(engine)), interval)
    }

    /// Create a scheduler around an engine shared with other callers
    pub fn with_shared(engine: Arc<Mutex<SyncEngine>>, interval: Duration) -> Self {
        Self {
            engine,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Shared handle to the engine
    pub fn engine(&self) -> Arc<Mutex<SyncEngine>> {
        Arc::clone(&self.engine)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `shutdown` resolves, then wait for any in-flight cycle
    pub async fn run<F>(self, shutdown: F) -> SchedulerSummary
    where
        F: Future<Output = ()>,
    {
        let mut summary = SchedulerSummary::default();
        let mut in_flight: Option<JoinHandle<()>> = None;
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(interval = ?self.interval, "Scheduler started");

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    match Arc::clone(&self.engine).try_lock_owned() {
                        Ok(mut engine) => {
                            if let Some(previous) = in_flight.take() {
                                reap(previous, &mut summary).await;
                            }
                            summary.cycles_started += 1;
                            in_flight = Some(tokio::spawn(async move {
                                engine.run_cycle().await;
                            }));
                        }
                        Err(_) => {
                            summary.ticks_skipped += 1;
                            warn!("Previous cycle still running, skipping tick");
                        }
                    }
                }
            }
        }

        debug!("Shutdown requested, waiting for in-flight cycle");
        if let Some(cycle) = in_flight.take() {
            reap(cycle, &mut summary).await;
        }
        info!(
            cycles = summary.cycles_started,
            skipped = summary.ticks_skipped,
            panicked = summary.cycles_panicked,
            "Scheduler stopped"
        );
        summary
    }
}

/// Wait for a spawned cycle and log how it ended if it did not return
async fn reap(cycle: JoinHandle<()>, summary: &mut SchedulerSummary) {
    if let Err(e) = cycle.await {
        if e.is_panic() {
            summary.cycles_panicked += 1;
            error!(error = %e, "Sync cycle panicked");
        } else {
            warn!(error = %e, "Sync cycle was cancelled");
        }
    }
}
