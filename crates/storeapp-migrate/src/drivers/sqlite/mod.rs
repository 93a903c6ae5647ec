//! SQLite database driver.
//!
//! - [`SqliteDialect`]: SQL syntax strategy
//! - [`SqliteReader`]: legacy product store reader (read-only)
//! - [`SqliteWriter`]: `products` writer for SQLite-backed POS stores
//!
//! # Connection String
//!
//! The reader takes a file path. The writer takes a SQLx URL:
//! ```text
//! sqlite://path/to/pos.db?mode=rwc
//! sqlite::memory:
//! ```

mod dialect;
mod reader;
mod writer;

pub use dialect::SqliteDialect;
pub use reader::SqliteReader;
pub use writer::SqliteWriter;
