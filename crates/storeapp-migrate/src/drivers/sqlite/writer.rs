//! SQLite target writer implementation.
//!
//! SQLite has no session autocommit flag. The writer tracks the mode itself and
//! keeps an explicit transaction open while autocommit is off, which gives the
//! same observable behaviour as the MySQL writer.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteConnection;
use sqlx::Connection;
use tracing::debug;

use crate::core::schema::ProductRecord;
use crate::core::traits::{Dialect, TargetWriter};
use crate::error::{MigrateError, Result};

use super::SqliteDialect;

/// POS `products` table as created by the storeapp schema script.
const CREATE_PRODUCTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS \"products\" (\
     \"productID\" INTEGER PRIMARY KEY, \
     \"productName\" TEXT, \
     \"price\" REAL, \
     \"quantity\" REAL, \
     \"sellerID\" INTEGER NULL)";

/// Tail of SQLite's "cannot commit/rollback - no transaction is active".
const NO_ACTIVE_TRANSACTION: &str = "no transaction is active";

/// SQLite target writer bound to one connection.
pub struct SqliteWriter {
    conn: SqliteConnection,
    dialect: SqliteDialect,
    autocommit: bool,
}

impl SqliteWriter {
    /// Open a connection from a SQLx URL such as `sqlite::memory:` or `sqlite://pos.db?mode=rwc`.
    pub async fn connect(url: &str) -> Result<Self> {
        let conn = SqliteConnection::connect(url)
            .await
            .map_err(|e| MigrateError::connectivity(format!("SQLite target {}", url), e))?;
        Ok(Self::from_conn(conn))
    }

    /// Wrap a connection owned by the host application. The connection must be
    /// in autocommit mode (no open transaction).
    pub fn from_conn(conn: SqliteConnection) -> Self {
        Self {
            conn,
            dialect: SqliteDialect::new(),
            autocommit: true,
        }
    }

    /// Create the POS `products` table if it does not exist.
    pub async fn create_products_table(&mut self) -> Result<()> {
        sqlx::query(CREATE_PRODUCTS_TABLE)
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    /// Borrow the underlying connection.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    /// Hand the connection back to the host application.
    pub fn into_inner(self) -> SqliteConnection {
        self.conn
    }

    async fn exec(&mut self, sql: &str) -> Result<()> {
        sqlx::query(sql).execute(&mut self.conn).await?;
        Ok(())
    }

    /// Send `COMMIT` or `ROLLBACK`.
    ///
    /// Some failures (a `ROLLBACK` conflict clause, `RAISE(ROLLBACK)`, a full
    /// disk) make SQLite abort the transaction on its own. Finishing a
    /// transaction that is already gone is not an error.
    async fn end_transaction(&mut self, sql: &str) -> Result<()> {
        match sqlx::query(sql).execute(&mut self.conn).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.message().contains(NO_ACTIVE_TRANSACTION) => {
                debug!("SQLite: {} after the transaction was already closed", sql);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl TargetWriter for SqliteWriter {
    fn db_type(&self) -> &str {
        "sqlite"
    }

    async fn autocommit(&mut self) -> Result<bool> {
        Ok(self.autocommit)
    }

    async fn set_autocommit(&mut self, enabled: bool) -> Result<()> {
        if enabled == self.autocommit {
            return Ok(());
        }
        // Turning autocommit back on commits the open transaction.
        if enabled {
            self.end_transaction("COMMIT").await?;
        } else {
            self.exec("BEGIN").await?;
        }
        self.autocommit = enabled;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.autocommit {
            debug!("SQLite: commit requested in autocommit mode, nothing to do");
            return Ok(());
        }
        self.end_transaction("COMMIT").await?;
        self.exec("BEGIN").await
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.autocommit {
            debug!("SQLite: rollback requested in autocommit mode, nothing to do");
            return Ok(());
        }
        self.end_transaction("ROLLBACK").await?;
        self.exec("BEGIN").await
    }

    async fn upsert_products(&mut self, batch: &[ProductRecord]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        for chunk in batch.chunks(self.dialect.max_rows_per_statement()) {
            let sql = self.dialect.build_product_upsert(chunk.len());
            let mut query = sqlx::query(&sql);
            for record in chunk {
                query = query
                    .bind(record.product_id)
                    .bind(record.product_name.clone())
                    .bind(real(record.price, record.product_id)?)
                    .bind(real(record.quantity, record.product_id)?);
            }
            query.execute(&mut self.conn).await?;
        }

        debug!("SQLite: upserted {} rows into products", batch.len());
        Ok(batch.len() as u64)
    }
}

fn real(value: Decimal, product_id: i64) -> Result<f64> {
    value.to_f64().ok_or_else(|| {
        MigrateError::InvalidRow(format!(
            "value {} for productID {} does not fit a REAL column",
            value, product_id
        ))
    })
}
