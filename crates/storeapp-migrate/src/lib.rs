//! # storeapp-migrate
//!
//! One-shot import of product rows from a legacy SQLite store into the
//! storeapp POS database (MySQL).
//!
//! The legacy schema is not known in advance. The importer:
//!
//! - **Probes** the source catalog for the product table
//! - **Resolves** each canonical field (`productID`, `productName`, `price`,
//!   `quantity`) to an actual source column through a list of aliases
//! - **Transcribes** rows in batches of 500 with an upsert keyed by
//!   `productID`, inside a single destination transaction
//!
//! ## Example
//!
//! ```rust,no_run
//! use storeapp_migrate::{Config, MysqlWriter};
//!
//! #[tokio::main]
//! async fn main() -> storeapp_migrate::Result<()> {
//!     let config = Config::load("storeapp-migrate.yaml")?;
//!     let mut writer = MysqlWriter::connect(&config.target).await?;
//!     let rows = storeapp_migrate::migrate("legacy/store.db", &mut writer).await?;
//!     println!("Migrated {} products", rows);
//!     writer.close().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod probe;
pub mod resolve;
pub mod transfer;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig};
pub use crate::core::{
    CanonicalField, ColumnMapping, Dialect, ProductRecord, ResolvedColumns, SourceReader,
    TargetWriter,
};
pub use drivers::{MysqlDialect, MysqlWriter, SqliteDialect, SqliteReader, SqliteWriter};
pub use error::{MigrateError, Result};
pub use orchestrator::{health_check, migrate, HealthCheckResult, MigrationResult, Migrator, SourcePlan};
pub use probe::find_products_table;
pub use resolve::{resolve_columns, resolve_required};
pub use transfer::{TransactionScope, TransferConfig, TransferEngine, TransferStats};
