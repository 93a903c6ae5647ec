//! Database driver implementations.
//!
//! This module provides database-specific implementations of the core traits:
//!
//! - [`sqlite`]: legacy source reader, and a writer for SQLite-backed POS stores
//! - [`mysql`]: POS destination writer
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/`
//! 2. Implement `Dialect` and `SourceReader` and/or `TargetWriter`
//! 3. Accept the new type in `config::validation` if the CLI should reach it

pub mod mysql;
pub mod sqlite;

pub use mysql::{MysqlDialect, MysqlWriter};
pub use sqlite::{SqliteDialect, SqliteReader, SqliteWriter};
