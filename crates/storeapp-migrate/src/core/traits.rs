//! Core traits for the product import.
//!
//! - [`SourceReader`]: catalog introspection and row streaming from the legacy store
//! - [`TargetWriter`]: transactional upserts into the POS store
//! - [`Dialect`]: SQL syntax strategy for each engine
//!
//! Writers wrap exactly one connection handed to them by the caller. Autocommit
//! and transaction state are properties of that connection, so nothing here is
//! pooled or shared.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

use super::schema::{ProductRecord, ResolvedColumns};

/// Read catalog metadata and product rows from a source database.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Get the database type identifier (e.g., "sqlite").
    fn db_type(&self) -> &str;

    /// User tables in catalog order. System tables are excluded.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Column names of `table` with their original casing, in ordinal order.
    async fn table_columns(&self, table: &str) -> Result<Vec<String>>;

    /// Build the query selecting the resolved columns, aliased to canonical names.
    fn build_product_select(&self, table: &str, columns: &ResolvedColumns) -> String;

    /// Stream the rows of a query built by [`SourceReader::build_product_select`].
    ///
    /// Rows arrive in whatever order the store returns them.
    fn stream_products<'a>(&'a self, sql: &'a str) -> BoxStream<'a, Result<ProductRecord>>;

    /// Close all connections.
    async fn close(&self);
}

/// Write product rows to a destination database over a single connection.
#[async_trait]
pub trait TargetWriter: Send {
    /// Get the database type identifier (e.g., "mysql").
    fn db_type(&self) -> &str;

    /// Current autocommit mode of the connection.
    async fn autocommit(&mut self) -> Result<bool>;

    /// Enable or disable autocommit. Disabling opens a transaction that lasts
    /// until [`TargetWriter::commit`] or [`TargetWriter::rollback`].
    async fn set_autocommit(&mut self, enabled: bool) -> Result<()>;

    /// Commit the open transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction.
    async fn rollback(&mut self) -> Result<()>;

    /// Insert rows whose productID is new and overwrite productName, price and
    /// quantity for the rest. `sellerID` is set to NULL in both cases.
    ///
    /// An empty batch performs no round trip and returns 0.
    async fn upsert_products(&mut self, batch: &[ProductRecord]) -> Result<u64>;
}

/// SQL dialect strategy.
pub trait Dialect: Send + Sync {
    /// Get the dialect name (e.g., "mysql", "sqlite").
    fn name(&self) -> &str;

    /// Quote an identifier (table name, column name).
    fn quote_ident(&self, name: &str) -> String;

    /// Build a multi-row upsert into `products` for `rows` rows.
    ///
    /// Each row binds four parameters (productID, productName, price, quantity);
    /// sellerID is the literal NULL.
    fn build_product_upsert(&self, rows: usize) -> String;

    /// Largest number of bound parameters a single statement may carry.
    fn max_params(&self) -> usize;

    /// Rows per statement given four parameters per row.
    fn max_rows_per_statement(&self) -> usize {
        (self.max_params() / 4).max(1)
    }
}
