//! Batched copy of product rows into the destination.
//!
//! One query is issued against the source; rows are converted as they stream
//! in and staged into batches of `batch_size`. Every full batch is flushed
//! as soon as it fills, and a final flush sends the remainder (possibly
//! empty) once the cursor is exhausted. The caller owns the surrounding
//! transaction; see [`TransactionScope`].

mod transaction;

pub use transaction::TransactionScope;

use std::time::{Duration, Instant};

use futures::TryStreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::schema::{ProductRecord, ResolvedColumns, DEFAULT_BATCH_SIZE};
use crate::core::traits::{SourceReader, TargetWriter};
use crate::error::{MigrateError, Result};

/// Transfer tuning.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Rows per flush.
    pub batch_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Statistics from a transfer.
#[derive(Debug, Clone, Default)]
pub struct TransferStats {
    /// Rows read from the source and staged for writing.
    pub rows: u64,

    /// Flushes sent to the destination, including the final one.
    pub batches: usize,

    /// Time spent waiting on the source cursor.
    pub read_time: Duration,

    /// Time spent in destination writes.
    pub write_time: Duration,
}

/// Streams source rows into batched destination upserts.
pub struct TransferEngine {
    config: TransferConfig,
    cancel: CancellationToken,
}

impl TransferEngine {
    pub fn new(config: TransferConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between rows once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Copy every row of `table` into the destination.
    ///
    /// Any failure is returned as [`MigrateError::Transaction`] carrying the
    /// table, the column mapping and the number of rows staged so far.
    pub async fn transfer(
        &self,
        reader: &dyn SourceReader,
        writer: &mut dyn TargetWriter,
        table: &str,
        columns: &ResolvedColumns,
    ) -> Result<TransferStats> {
        let sql = reader.build_product_select(table, columns);
        debug!("Source query: {}", sql);

        let mut stats = TransferStats::default();
        match self.copy_rows(reader, writer, &sql, &mut stats).await {
            Ok(()) => {
                info!(
                    "{}: staged {} rows in {} batches (read {:?}, write {:?})",
                    table, stats.rows, stats.batches, stats.read_time, stats.write_time
                );
                Ok(stats)
            }
            Err(e) => Err(MigrateError::Transaction {
                table: table.to_string(),
                mapping: columns.to_string(),
                rows: stats.rows,
                source: Box::new(e),
            }),
        }
    }

    async fn copy_rows(
        &self,
        reader: &dyn SourceReader,
        writer: &mut dyn TargetWriter,
        sql: &str,
        stats: &mut TransferStats,
    ) -> Result<()> {
        let batch_size = self.config.batch_size.max(1);
        let mut pending: Vec<ProductRecord> = Vec::with_capacity(batch_size);
        let mut rows = reader.stream_products(sql);

        loop {
            let read_start = Instant::now();
            let next = rows.try_next().await?;
            stats.read_time += read_start.elapsed();

            let Some(record) = next else { break };

            if self.cancel.is_cancelled() {
                return Err(MigrateError::Cancelled);
            }

            pending.push(record);
            stats.rows += 1;

            if pending.len() >= batch_size {
                self.flush(writer, &mut pending, stats).await?;
            }
        }

        // Remainder, 0..batch_size rows
        self.flush(writer, &mut pending, stats).await
    }

    async fn flush(
        &self,
        writer: &mut dyn TargetWriter,
        pending: &mut Vec<ProductRecord>,
        stats: &mut TransferStats,
    ) -> Result<()> {
        let write_start = Instant::now();
        let written = writer.upsert_products(pending).await?;
        stats.write_time += write_start.elapsed();
        stats.batches += 1;

        debug!(
            "Flushed batch {} ({} rows, {} total)",
            stats.batches, written, stats.rows
        );
        pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{product, RecordingWriter, StaticCatalog};

    fn columns() -> ResolvedColumns {
        ResolvedColumns {
            product_id: "id".into(),
            product_name: "name".into(),
            price: "price".into(),
            quantity: "qty".into(),
        }
    }

    fn source(rows: i64) -> StaticCatalog {
        StaticCatalog::new().with_rows((1..=rows).map(product).collect())
    }

    #[tokio::test]
    async fn test_exact_batch_multiple_ends_with_empty_flush() {
        let mut writer = RecordingWriter::new();
        let engine = TransferEngine::new(TransferConfig::default());

        let stats = engine
            .transfer(&source(500), &mut writer, "products", &columns())
            .await
            .unwrap();

        assert_eq!(stats.rows, 500);
        assert_eq!(stats.batches, 2);
        assert_eq!(writer.flushes, vec![500, 0]);
    }

    #[tokio::test]
    async fn test_remainder_is_flushed_last() {
        let mut writer = RecordingWriter::new();
        let engine = TransferEngine::new(TransferConfig::default());

        let stats = engine
            .transfer(&source(501), &mut writer, "products", &columns())
            .await
            .unwrap();

        assert_eq!(stats.rows, 501);
        assert_eq!(writer.flushes, vec![500, 1]);
        assert_eq!(writer.rows.len(), 501);
    }

    #[tokio::test]
    async fn test_empty_source_flushes_once() {
        let mut writer = RecordingWriter::new();
        let engine = TransferEngine::new(TransferConfig::default());

        let stats = engine
            .transfer(&source(0), &mut writer, "products", &columns())
            .await
            .unwrap();

        assert_eq!(stats.rows, 0);
        assert_eq!(writer.flushes, vec![0]);
    }

    #[tokio::test]
    async fn test_custom_batch_size() {
        let mut writer = RecordingWriter::new();
        let engine = TransferEngine::new(TransferConfig { batch_size: 3 });

        engine
            .transfer(&source(7), &mut writer, "products", &columns())
            .await
            .unwrap();

        assert_eq!(writer.flushes, vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn test_write_failure_is_wrapped_with_context() {
        let mut writer = RecordingWriter::new().fail_on_flush(2);
        let engine = TransferEngine::new(TransferConfig { batch_size: 10 });

        let err = engine
            .transfer(&source(25), &mut writer, "Inventory", &columns())
            .await
            .unwrap_err();

        match err {
            MigrateError::Transaction { table, mapping, rows, source } => {
                assert_eq!(table, "Inventory");
                assert!(mapping.contains("quantity=qty"));
                assert_eq!(rows, 20);
                assert!(matches!(*source, MigrateError::InvalidRow(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_first_row() {
        let mut writer = RecordingWriter::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let engine = TransferEngine::new(TransferConfig::default()).with_cancellation(cancel);

        let err = engine
            .transfer(&source(5), &mut writer, "products", &columns())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MigrateError::Transaction { ref source, rows: 0, .. } if matches!(**source, MigrateError::Cancelled)
        ));
        assert!(writer.flushes.is_empty());
    }
}
