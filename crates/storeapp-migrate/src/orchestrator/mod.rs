//! Migration orchestrator - main workflow coordinator.
//!
//! A run is strictly sequential: probe the source catalog, resolve the
//! product columns, then transcribe every row. All three phases run inside
//! one destination transaction, so a failure anywhere leaves the
//! destination exactly as it was.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, MigrationConfig};
use crate::core::schema::ResolvedColumns;
use crate::core::traits::{SourceReader, TargetWriter};
use crate::drivers::{MysqlWriter, SqliteReader};
use crate::error::{MigrateError, Result};
use crate::probe::find_products_table;
use crate::resolve::resolve_required;
use crate::transfer::{TransactionScope, TransferConfig, TransferEngine, TransferStats};

/// What a run would do, as discovered from the source alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePlan {
    /// Source table holding products.
    pub source_table: String,

    /// Source column for each canonical field.
    pub columns: ResolvedColumns,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration committed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Source table the products were read from.
    pub source_table: String,

    /// Source column for each canonical field.
    pub columns: ResolvedColumns,

    /// Rows written to the destination (inserts and updates together).
    pub rows_migrated: u64,

    /// Destination flushes, including the final one.
    pub batches: usize,

    /// Average throughput (rows/second).
    pub rows_per_second: u64,
}

impl MigrationResult {
    /// Convert result to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of a connectivity check against both stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub source_connected: bool,
    pub source_latency_ms: u64,
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    pub target_error: Option<String>,
}

/// Runs the product import against explicit source and destination handles.
pub struct Migrator {
    config: MigrationConfig,
    cancel: CancellationToken,
}

impl Migrator {
    pub fn new(config: MigrationConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort between rows once `cancel` fires. The run is rolled back.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Find the product table and resolve its columns without touching any destination.
    pub async fn inspect(&self, reader: &dyn SourceReader) -> Result<SourcePlan> {
        let source_table = find_products_table(reader).await?;
        let columns = resolve_required(reader, &source_table).await?;
        info!("Detected source table '{}' with columns {}", source_table, columns);

        Ok(SourcePlan {
            source_table,
            columns,
        })
    }

    /// Migrate every product row from `reader` into `writer`.
    ///
    /// The writer's autocommit mode is restored on every path. Nothing is
    /// visible in the destination unless the whole run commits.
    pub async fn run(
        &self,
        reader: &dyn SourceReader,
        writer: &mut dyn TargetWriter,
    ) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let start = Instant::now();

        info!(
            "Starting product import {} ({} -> {})",
            run_id,
            reader.db_type(),
            writer.db_type()
        );

        let mut scope = TransactionScope::begin(writer).await?;

        let outcome = self.migrate_in_scope(reader, scope.writer()).await;
        let (plan, stats) = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Import failed, rolling back: {}", e);
                scope.rollback().await;
                return Err(e);
            }
        };

        if let Err(e) = scope.commit().await {
            return Err(MigrateError::Transaction {
                table: plan.source_table,
                mapping: plan.columns.to_string(),
                rows: stats.rows,
                source: Box::new(e),
            });
        }

        let duration = start.elapsed();
        let duration_seconds = duration.as_secs_f64();
        let rows_per_second = if duration_seconds > 0.0 {
            (stats.rows as f64 / duration_seconds) as u64
        } else {
            0
        };

        info!("Migrated {} products from '{}'", stats.rows, plan.source_table);

        Ok(MigrationResult {
            run_id,
            started_at,
            completed_at: Utc::now(),
            duration_seconds,
            source_table: plan.source_table,
            columns: plan.columns,
            rows_migrated: stats.rows,
            batches: stats.batches,
            rows_per_second,
        })
    }

    async fn migrate_in_scope(
        &self,
        reader: &dyn SourceReader,
        writer: &mut dyn TargetWriter,
    ) -> Result<(SourcePlan, TransferStats)> {
        let plan = self.inspect(reader).await?;

        let engine = TransferEngine::new(TransferConfig {
            batch_size: self.config.batch_size,
        })
        .with_cancellation(self.cancel.clone());

        let stats = engine
            .transfer(reader, writer, &plan.source_table, &plan.columns)
            .await?;

        Ok((plan, stats))
    }
}

/// Import the products of the SQLite file at `source_path` into `writer`.
///
/// This is the library entry point for host applications that already hold
/// a destination connection. Default settings apply (batches of 500).
pub async fn migrate(
    source_path: impl AsRef<Path>,
    writer: &mut dyn TargetWriter,
) -> Result<u64> {
    let reader = SqliteReader::open(source_path).await?;
    let result = Migrator::new(MigrationConfig::default())
        .run(&reader, writer)
        .await;
    reader.close().await;
    Ok(result?.rows_migrated)
}

/// Open both stores named by `config` and report their status.
pub async fn health_check(config: &Config) -> HealthCheckResult {
    let mut result = HealthCheckResult::default();

    let source_start = Instant::now();
    match &config.source.path {
        Some(path) => match SqliteReader::open(path).await {
            Ok(reader) => {
                match reader.test_connection().await {
                    Ok(()) => result.source_connected = true,
                    Err(e) => result.source_error = Some(e.to_string()),
                }
                reader.close().await;
            }
            Err(e) => result.source_error = Some(e.to_string()),
        },
        None => result.source_error = Some("source path is not configured".to_string()),
    }
    result.source_latency_ms = source_start.elapsed().as_millis() as u64;

    let target_start = Instant::now();
    match MysqlWriter::connect(&config.target).await {
        Ok(mut writer) => {
            match writer.test_connection().await {
                Ok(()) => result.target_connected = true,
                Err(e) => result.target_error = Some(e.to_string()),
            }
            writer.close().await;
        }
        Err(e) => result.target_error = Some(e.to_string()),
    }
    result.target_latency_ms = target_start.elapsed().as_millis() as u64;

    result.healthy = result.source_connected && result.target_connected;
    result
}
