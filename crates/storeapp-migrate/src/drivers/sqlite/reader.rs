//! SQLite source reader implementation.
//!
//! Implements the `SourceReader` trait for legacy SQLite product stores.
//! Uses SQLx with a single read-only connection; the file is never created.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::core::schema::{CanonicalField, ProductRecord, ResolvedColumns};
use crate::core::traits::SourceReader;
use crate::error::{MigrateError, Result};

use super::dialect::{KEY_TEXT_ALIAS, KEY_TYPE_ALIAS};
use super::SqliteDialect;

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// SQLite source reader implementation.
pub struct SqliteReader {
    pool: SqlitePool,
    path: PathBuf,
    dialect: SqliteDialect,
}

impl SqliteReader {
    /// Open a SQLite file read-only.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let store = format!("SQLite source {}", path.display());

        if !path.is_file() {
            return Err(MigrateError::connectivity(store, "file does not exist"));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| MigrateError::connectivity(&store, e))?;

        // Touch the catalog so a file that is not a database fails here
        sqlx::query("SELECT COUNT(*) FROM sqlite_master")
            .fetch_one(&pool)
            .await
            .map_err(|e| MigrateError::connectivity(&store, e))?;

        info!("Opened SQLite source: {}", path.display());

        Ok(Self {
            pool,
            path: path.to_path_buf(),
            dialect: SqliteDialect::new(),
        })
    }

    /// Path of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Test the database connection.
    pub async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SourceReader for SqliteReader {
    fn db_type(&self) -> &str {
        "sqlite"
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("SQLite catalog: {:?}", tables);
        Ok(tables)
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
                .bind(table)
                .fetch_all(&self.pool)
                .await?;
        Ok(columns)
    }

    fn build_product_select(&self, table: &str, columns: &ResolvedColumns) -> String {
        self.dialect.build_product_select(table, columns)
    }

    fn stream_products<'a>(&'a self, sql: &'a str) -> BoxStream<'a, Result<ProductRecord>> {
        sqlx::query(sql)
            .fetch(&self.pool)
            .map(|row| -> Result<ProductRecord> { product_from_row(&row?) })
            .boxed()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Convert a row of the canonical SELECT into a record.
///
/// NULL amounts read as zero. A NULL key cannot be upserted and is rejected,
/// as is a key the INTEGER cast would have changed.
fn product_from_row(row: &SqliteRow) -> Result<ProductRecord> {
    let product_id: Option<i64> = row.try_get(CanonicalField::ProductId.name())?;
    let product_id = product_id.ok_or_else(|| {
        MigrateError::InvalidRow(format!("{} is NULL", CanonicalField::ProductId))
    })?;
    let key_type: String = row.try_get(KEY_TYPE_ALIAS)?;
    let key_text: Option<String> = row.try_get(KEY_TEXT_ALIAS)?;
    check_key(&key_type, key_text.as_deref().unwrap_or_default(), product_id)?;

    let product_name: Option<String> = row.try_get(CanonicalField::ProductName.name())?;
    let price = amount(row, CanonicalField::Price, product_id)?;
    let quantity = amount(row, CanonicalField::Quantity, product_id)?;

    Ok(ProductRecord {
        product_id,
        product_name,
        price,
        quantity,
    })
}

/// Reject keys whose raw value is not exactly the integer they were cast to.
fn check_key(storage_class: &str, raw: &str, product_id: i64) -> Result<()> {
    let exact = match storage_class {
        "integer" => true,
        "real" | "text" => {
            let raw = raw.trim();
            raw.parse::<i64>().ok() == Some(product_id)
                || raw
                    .parse::<f64>()
                    .map(|v| v.fract() == 0.0 && v == product_id as f64)
                    .unwrap_or(false)
        }
        _ => false,
    };

    if exact {
        Ok(())
    } else {
        Err(MigrateError::InvalidRow(format!(
            "{} value '{}' ({}) is not an integer",
            CanonicalField::ProductId,
            raw,
            storage_class
        )))
    }
}

fn amount(row: &SqliteRow, field: CanonicalField, product_id: i64) -> Result<Decimal> {
    let value: Option<f64> = row.try_get(field.name())?;
    match value {
        None => Ok(Decimal::ZERO),
        Some(v) => Decimal::from_f64(v).ok_or_else(|| {
            MigrateError::InvalidRow(format!(
                "{} value {} for productID {} is not a finite decimal",
                field, v, product_id
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_key_accepts_integral_values() {
        assert!(check_key("integer", "42", 42).is_ok());
        assert!(check_key("real", "7.0", 7).is_ok());
        assert!(check_key("text", " 7 ", 7).is_ok());
        assert!(check_key("text", "-3", -3).is_ok());
    }

    #[test]
    fn test_check_key_rejects_values_the_cast_would_change() {
        let err = check_key("text", "A-1", 0).unwrap_err();
        assert!(matches!(err, MigrateError::InvalidRow(_)));
        assert!(err.to_string().contains("'A-1'"));

        assert!(check_key("real", "7.5", 7).is_err());
        assert!(check_key("text", "12abc", 12).is_err());
        assert!(check_key("blob", "", 0).is_err());
    }
}
