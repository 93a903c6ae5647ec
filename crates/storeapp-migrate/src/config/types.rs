//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::schema::DEFAULT_BATCH_SIZE;

/// Root configuration structure.
///
/// Every section is optional in YAML; the defaults reproduce the storeapp
/// development setup (MySQL on localhost:3306, database `storeapp`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Legacy SQLite store.
    #[serde(default)]
    pub source: SourceConfig,

    /// POS database (MySQL).
    #[serde(default)]
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Source (SQLite) configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the SQLite file. Usually given on the command line instead.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Target database (MySQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database type (always "mysql" for now).
    #[serde(default = "default_mysql")]
    pub r#type: String,

    /// Database host.
    #[serde(default = "default_localhost")]
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database name (default: "storeapp").
    #[serde(default = "default_storeapp")]
    pub database: String,

    /// Username (default: "root").
    #[serde(default = "default_root")]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// SSL mode: disable, prefer, require, verify-ca, verify-full (default: "disable").
    #[serde(default = "default_disable")]
    pub ssl_mode: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            r#type: default_mysql(),
            host: default_localhost(),
            port: default_mysql_port(),
            database: default_storeapp(),
            user: default_root(),
            password: String::new(),
            ssl_mode: default_disable(),
        }
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Rows per destination flush (default: 500).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_mysql() -> String {
    "mysql".to_string()
}

fn default_localhost() -> String {
    "localhost".to_string()
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_storeapp() -> String {
    "storeapp".to_string()
}

fn default_root() -> String {
    "root".to_string()
}

fn default_disable() -> String {
    "disable".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
