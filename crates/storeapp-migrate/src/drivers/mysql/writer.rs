//! MySQL/MariaDB target writer implementation.
//!
//! Implements the `TargetWriter` trait over a single `mysql_async` connection.
//! Autocommit and transactions are session state, so the writer never takes a
//! second connection from a pool.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, SslOpts};
use tracing::{debug, info, warn};

use crate::config::TargetConfig;
use crate::core::schema::ProductRecord;
use crate::core::traits::{Dialect, TargetWriter};
use crate::error::{MigrateError, Result};

use super::MysqlDialect;

/// MySQL target writer bound to one connection.
pub struct MysqlWriter {
    conn: Conn,
    dialect: MysqlDialect,
}

impl MysqlWriter {
    /// Open a connection from configuration.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let ssl_opts = match config.ssl_mode.to_lowercase().as_str() {
            "disable" => None,
            "prefer" | "require" => Some(SslOpts::default().with_danger_accept_invalid_certs(true)),
            "verify-ca" | "verify_ca" | "verify-full" | "verify_identity" => Some(SslOpts::default()),
            _ => {
                warn!(
                    "Unknown ssl_mode '{}', defaulting to Preferred",
                    config.ssl_mode
                );
                Some(SslOpts::default().with_danger_accept_invalid_certs(true))
            }
        };

        let mut builder = OptsBuilder::default()
            .ip_or_hostname(&config.host)
            .tcp_port(config.port)
            .db_name(Some(&config.database))
            .user(Some(&config.user))
            .pass(Some(&config.password))
            // Use utf8mb4 for full Unicode support
            .init(vec!["SET NAMES utf8mb4"]);

        if let Some(ssl) = ssl_opts {
            builder = builder.ssl_opts(ssl);
        }

        let opts: Opts = builder.into();
        let store = format!(
            "MySQL target {}:{}/{}",
            config.host, config.port, config.database
        );
        let mut conn = Conn::new(opts)
            .await
            .map_err(|e| MigrateError::connectivity(&store, e))?;

        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| MigrateError::connectivity(&store, e))?;

        info!(
            "Connected to MySQL target: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self::from_conn(conn))
    }

    /// Wrap a connection owned by the host application.
    pub fn from_conn(conn: Conn) -> Self {
        Self {
            conn,
            dialect: MysqlDialect::new(),
        }
    }

    /// Hand the connection back to the host application.
    pub fn into_inner(self) -> Conn {
        self.conn
    }

    /// Test the database connection.
    pub async fn test_connection(&mut self) -> Result<()> {
        self.conn.query_drop("SELECT 1").await?;
        Ok(())
    }

    /// Close the connection.
    pub async fn close(self) {
        if let Err(e) = self.conn.disconnect().await {
            debug!("MySQL disconnect failed: {}", e);
        }
    }
}

#[async_trait]
impl TargetWriter for MysqlWriter {
    fn db_type(&self) -> &str {
        "mysql"
    }

    async fn autocommit(&mut self) -> Result<bool> {
        let value: Option<i64> = self.conn.query_first("SELECT @@autocommit").await?;
        Ok(value.unwrap_or(1) != 0)
    }

    async fn set_autocommit(&mut self, enabled: bool) -> Result<()> {
        let sql = if enabled {
            "SET autocommit = 1"
        } else {
            "SET autocommit = 0"
        };
        self.conn.query_drop(sql).await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.conn.query_drop("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.conn.query_drop("ROLLBACK").await?;
        Ok(())
    }

    async fn upsert_products(&mut self, batch: &[ProductRecord]) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        for chunk in batch.chunks(self.dialect.max_rows_per_statement()) {
            let sql = self.dialect.build_product_upsert(chunk.len());
            let params: Vec<mysql_async::Value> = chunk.iter().flat_map(product_params).collect();
            self.conn.exec_drop(sql.as_str(), params).await?;
        }

        debug!("MySQL: upserted {} rows into products", batch.len());
        Ok(batch.len() as u64)
    }
}

/// Bound parameters for one row. Decimals travel as strings so MySQL parses
/// them exactly into DECIMAL columns.
fn product_params(record: &ProductRecord) -> [mysql_async::Value; 4] {
    [
        mysql_async::Value::from(record.product_id),
        mysql_async::Value::from(record.product_name.clone()),
        mysql_async::Value::from(record.price.to_string()),
        mysql_async::Value::from(record.quantity.to_string()),
    ]
}
