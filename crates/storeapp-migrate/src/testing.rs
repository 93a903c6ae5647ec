//! In-memory fakes for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use rust_decimal::Decimal;

use crate::core::schema::{ProductRecord, ResolvedColumns};
use crate::core::traits::{SourceReader, TargetWriter};
use crate::drivers::SqliteDialect;
use crate::error::{MigrateError, Result};

/// A source whose catalog is fixed at construction. Rows are served from
/// `rows` regardless of the query.
#[derive(Default)]
pub(crate) struct StaticCatalog {
    tables: Vec<(String, Vec<String>)>,
    broken: Vec<String>,
    rows: Vec<ProductRecord>,
    column_lookups: AtomicUsize,
}

impl StaticCatalog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_table(mut self, name: &str, columns: &[&str]) -> Self {
        self.tables.push((
            name.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }

    /// A listed table whose column lookup fails.
    pub(crate) fn with_broken_table(mut self, name: &str) -> Self {
        self.tables.push((name.to_string(), Vec::new()));
        self.broken.push(name.to_string());
        self
    }

    pub(crate) fn with_rows(mut self, rows: Vec<ProductRecord>) -> Self {
        self.rows = rows;
        self
    }

    /// How many times `table_columns` was called.
    pub(crate) fn column_lookups(&self) -> usize {
        self.column_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceReader for StaticCatalog {
    fn db_type(&self) -> &str {
        "static"
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        self.column_lookups.fetch_add(1, Ordering::SeqCst);
        if self.broken.iter().any(|name| name == table) {
            return Err(MigrateError::InvalidRow(format!("cannot read {}", table)));
        }
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, columns)| columns.clone())
            .ok_or_else(|| MigrateError::InvalidRow(format!("no such table: {}", table)))
    }

    fn build_product_select(&self, table: &str, columns: &ResolvedColumns) -> String {
        SqliteDialect::new().build_product_select(table, columns)
    }

    fn stream_products<'a>(&'a self, _sql: &'a str) -> BoxStream<'a, Result<ProductRecord>> {
        stream::iter(self.rows.iter().cloned().map(Ok)).boxed()
    }

    async fn close(&self) {}
}

/// A product with deterministic values derived from its id.
pub(crate) fn product(id: i64) -> ProductRecord {
    ProductRecord {
        product_id: id,
        product_name: Some(format!("Product {}", id)),
        price: Decimal::new(id * 100 + 99, 2),
        quantity: Decimal::from(id % 50),
    }
}

/// A writer that keeps everything in memory and records each call.
pub(crate) struct RecordingWriter {
    /// Size of every upsert call, in order.
    pub(crate) flushes: Vec<usize>,
    /// Rows written, including rows later rolled back.
    pub(crate) rows: Vec<ProductRecord>,
    pub(crate) autocommit: bool,
    pub(crate) commits: usize,
    pub(crate) rollbacks: usize,
    fail_on_flush: Option<usize>,
    fail_commit: bool,
}

impl RecordingWriter {
    pub(crate) fn new() -> Self {
        Self {
            flushes: Vec::new(),
            rows: Vec::new(),
            autocommit: true,
            commits: 0,
            rollbacks: 0,
            fail_on_flush: None,
            fail_commit: false,
        }
    }

    /// Fail the n-th upsert call (1-based).
    pub(crate) fn fail_on_flush(mut self, n: usize) -> Self {
        self.fail_on_flush = Some(n);
        self
    }

    pub(crate) fn fail_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }
}

#[async_trait]
impl TargetWriter for RecordingWriter {
    fn db_type(&self) -> &str {
        "recording"
    }

    async fn autocommit(&mut self) -> Result<bool> {
        Ok(self.autocommit)
    }

    async fn set_autocommit(&mut self, enabled: bool) -> Result<()> {
        self.autocommit = enabled;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.fail_commit {
            return Err(MigrateError::InvalidRow("injected commit failure".into()));
        }
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.rollbacks += 1;
        Ok(())
    }

    async fn upsert_products(&mut self, batch: &[ProductRecord]) -> Result<u64> {
        self.flushes.push(batch.len());
        if self.fail_on_flush == Some(self.flushes.len()) {
            return Err(MigrateError::InvalidRow("injected write failure".into()));
        }
        self.rows.extend_from_slice(batch);
        Ok(batch.len() as u64)
    }
}
