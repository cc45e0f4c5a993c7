//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, WatermarkAction};
use crate::config::{self, Settings};
use crate::destination::{NotionClient, NotionClientConfig};
use crate::engine::{CycleOutcome, SyncEngine};
use crate::error::{Error, Result};
use crate::mapper::{FieldMapper, OpenAiClient, OpenAiClientConfig};
use crate::scheduler::Scheduler;
use crate::source::{LifelogClient, LifelogClientConfig};
use crate::state::{SchemaCache, WatermarkStore};
use crate::types::{format_timestamp, parse_timestamp};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match self.cli.resolved_command() {
            Commands::Run => self.run_forever().await,
            Commands::Once => self.run_once().await,
            Commands::Schema { refresh } => self.schema(refresh).await,
            Commands::Watermark { action } => match action {
                WatermarkAction::Show => self.watermark_show().await,
                WatermarkAction::Set { timestamp } => self.watermark_set(&timestamp).await,
            },
        }
    }

    /// Environment settings with CLI overrides applied
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::from_env()?;
        if let Some(dir) = &self.cli.state_dir {
            settings = settings.with_state_dir(dir);
        }
        if let Some(ms) = self.cli.interval_ms {
            if ms == 0 {
                return Err(Error::invalid_value("--interval-ms", "must be greater than zero"));
            }
            settings = settings.with_poll_interval(Duration::from_millis(ms));
        }
        Ok(settings)
    }

    fn watermark_store(&self) -> WatermarkStore {
        let dir = self
            .cli
            .state_dir
            .clone()
            .unwrap_or_else(Settings::state_dir_from_env);
        WatermarkStore::new(config::watermark_path(&dir))
    }

    /// Poll until a shutdown signal arrives
    async fn run_forever(&self) -> Result<()> {
        let settings = self.settings()?;
        let engine = build_engine(&settings)?;
        ensure_schema(&engine).await?;

        info!(
            interval_ms = settings.poll_interval.as_millis() as u64,
            state_dir = %settings.state_dir.display(),
            "Starting lifelog sync"
        );
        Scheduler::new(engine, settings.poll_interval)
            .run(shutdown_signal())
            .await;
        Ok(())
    }

    /// Run a single cycle and print its report
    async fn run_once(&self) -> Result<()> {
        let settings = self.settings()?;
        let mut engine = build_engine(&settings)?;
        ensure_schema(&engine).await?;

        let report = engine.run_cycle().await;
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "outcome": report.outcome.as_str(),
                "fetched": report.fetched,
                "stale_skipped": report.stale_skipped,
                "succeeded": report.succeeded,
                "failed": report.failed,
                "fallbacks": report.fallbacks,
                "watermark": report.watermark_after.as_ref().map(format_timestamp),
                "duration_ms": report.duration_ms,
            }))?
        );

        match report.outcome {
            CycleOutcome::Processed | CycleOutcome::NoNewRecords => Ok(()),
            outcome => Err(Error::CycleFailed {
                outcome: outcome.to_string(),
            }),
        }
    }

    /// Print the destination schema, cached unless `refresh`
    async fn schema(&self, refresh: bool) -> Result<()> {
        let settings = self.settings()?;
        let cache = schema_cache(&settings)?;

        let schema = if refresh {
            cache.refresh().await?
        } else {
            cache.get().await?
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    async fn watermark_show(&self) -> Result<()> {
        let store = self.watermark_store();
        match store.peek().await? {
            Some(ts) => println!("{}", format_timestamp(&ts)),
            None => println!("(not set, {} does not exist)", store.path().display()),
        }
        Ok(())
    }

    async fn watermark_set(&self, raw: &str) -> Result<()> {
        let ts = parse_timestamp(raw)
            .ok_or_else(|| Error::invalid_value("timestamp", format!("not RFC 3339: {raw:?}")))?;
        let store = self.watermark_store();
        let previous = store.peek().await?;

        store.save(&ts).await?;
        info!(
            previous = ?previous.as_ref().map(format_timestamp),
            watermark = %format_timestamp(&ts),
            "Watermark set by operator"
        );
        println!("{}", format_timestamp(&ts));
        Ok(())
    }
}

fn schema_cache(settings: &Settings) -> Result<SchemaCache> {
    let notion = NotionClient::new(
        NotionClientConfig::new(&settings.notion_api_key, &settings.notion_database_id)
            .with_base_url(&settings.notion_base_url),
    )?;
    Ok(SchemaCache::new(settings.schema_cache_path(), Arc::new(notion))
        .with_ttl(settings.schema_cache_ttl))
}

/// Wire the live clients into an engine
fn build_engine(settings: &Settings) -> Result<SyncEngine> {
    let source = LifelogClient::new(
        LifelogClientConfig::new(&settings.limitless_api_key)
            .with_base_url(&settings.limitless_base_url)
            .with_page_size(settings.page_size),
    )?;
    let writer = NotionClient::new(
        NotionClientConfig::new(&settings.notion_api_key, &settings.notion_database_id)
            .with_base_url(&settings.notion_base_url),
    )?;
    let transformer = OpenAiClient::new(
        OpenAiClientConfig::new(&settings.openai_api_key)
            .with_base_url(&settings.openai_base_url)
            .with_model(&settings.openai_model),
    )?;

    Ok(SyncEngine::new(
        Arc::new(source),
        schema_cache(settings)?,
        FieldMapper::new(Arc::new(transformer)),
        Arc::new(writer),
        WatermarkStore::new(settings.watermark_path()),
    ))
}

/// Startup schema fetch; a failure here stops the process
async fn ensure_schema(engine: &SyncEngine) -> Result<()> {
    match engine.schema_cache().get().await {
        Ok(schema) => {
            info!(properties = schema.len(), "Destination schema ready");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Could not load destination schema at startup");
            Err(e)
        }
    }
}

/// Resolves on SIGINT, or SIGTERM on Unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
