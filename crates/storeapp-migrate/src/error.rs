//! Error types for the migration library.

use thiserror::Error;

use crate::core::schema::CanonicalField;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code when either store cannot be opened.
pub const EXIT_CONNECTIVITY_ERROR: u8 = 2;
/// Exit code when the source schema cannot be matched.
pub const EXIT_SCHEMA_ERROR: u8 = 3;
/// Exit code when the destination transaction was rolled back.
pub const EXIT_TRANSACTION_ERROR: u8 = 4;
/// Exit code for a cancelled run.
pub const EXIT_CANCELLED: u8 = 5;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Either store could not be opened. Nothing was started.
    #[error("Cannot open {store}: {message}")]
    Connectivity { store: String, message: String },

    /// No plausible product table in the source catalog.
    #[error("Could not find a products table in source. Checked tables: [{}]", checked.join(", "))]
    SchemaNotFound { checked: Vec<String> },

    /// The source catalog could not be read while looking for the product table.
    #[error("Cannot read source catalog{}", catalog_context(table))]
    Catalog {
        table: Option<String>,
        #[source]
        source: Box<MigrateError>,
    },

    /// One or more mandatory canonical fields have no matching source column.
    #[error(
        "Missing required columns in source table '{table}': [{}] (found map={mapping})",
        missing.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
    )]
    ColumnResolution {
        table: String,
        missing: Vec<CanonicalField>,
        mapping: String,
    },

    /// A read or write failed after the destination transaction began.
    /// All writes of the run were rolled back.
    #[error("Migration of table '{table}' rolled back after {rows} rows (columns={mapping})")]
    Transaction {
        table: String,
        mapping: String,
        rows: u64,
        #[source]
        source: Box<MigrateError>,
    },

    /// Source database query error
    #[error("Source database error: {0}")]
    Source(#[from] sqlx::Error),

    /// Target database query error
    #[error("Target database error: {0}")]
    Target(#[from] mysql_async::Error),

    /// A source row could not be converted into a product record
    #[error("Invalid source row: {0}")]
    InvalidRow(String),

    /// Migration was cancelled (SIGINT, etc.)
    #[error("Migration cancelled")]
    Cancelled,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Connectivity error naming the store that failed to open.
    pub fn connectivity(store: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Connectivity {
            store: store.into(),
            message: message.to_string(),
        }
    }

    /// Wrap a catalog read failure, naming the table being inspected if any.
    pub fn catalog(table: Option<&str>, source: MigrateError) -> Self {
        MigrateError::Catalog {
            table: table.map(str::to_string),
            source: Box::new(source),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => EXIT_CONFIG_ERROR,
            MigrateError::Connectivity { .. }
            | MigrateError::Catalog { .. }
            | MigrateError::Source(_)
            | MigrateError::Target(_) => EXIT_CONNECTIVITY_ERROR,
            MigrateError::SchemaNotFound { .. } | MigrateError::ColumnResolution { .. } => {
                EXIT_SCHEMA_ERROR
            }
            MigrateError::Transaction { source, .. } if matches!(**source, MigrateError::Cancelled) => {
                EXIT_CANCELLED
            }
            MigrateError::Transaction { .. } | MigrateError::InvalidRow(_) => {
                EXIT_TRANSACTION_ERROR
            }
            MigrateError::Cancelled => EXIT_CANCELLED,
            MigrateError::Io(_) => EXIT_IO_ERROR,
            _ => EXIT_CONFIG_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

fn catalog_context(table: &Option<String>) -> String {
    match table {
        Some(t) => format!(" (columns of table '{}')", t),
        None => String::new(),
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_not_found_lists_checked_tables() {
        let err = MigrateError::SchemaNotFound {
            checked: vec!["customers".into(), "orders".into()],
        };
        assert_eq!(
            err.to_string(),
            "Could not find a products table in source. Checked tables: [customers, orders]"
        );
        assert_eq!(err.exit_code(), EXIT_SCHEMA_ERROR);
    }

    #[test]
    fn test_column_resolution_names_missing_fields() {
        let err = MigrateError::ColumnResolution {
            table: "products".into(),
            missing: vec![CanonicalField::ProductId, CanonicalField::Quantity],
            mapping: "{productID=<unresolved>}".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("[productID, quantity]"));
        assert!(msg.contains("found map={productID=<unresolved>}"));
    }

    #[test]
    fn test_transaction_error_chain_is_formatted() {
        let err = MigrateError::Transaction {
            table: "products".into(),
            mapping: "{}".into(),
            rows: 599,
            source: Box::new(MigrateError::InvalidRow("NULL productID".into())),
        };
        let detailed = err.format_detailed();
        assert!(detailed.contains("rolled back after 599 rows"));
        assert!(detailed.contains("Caused by:\n  1: Invalid source row: NULL productID"));
        assert_eq!(err.exit_code(), EXIT_TRANSACTION_ERROR);
    }

    #[test]
    fn test_catalog_error_names_table() {
        let err = MigrateError::catalog(
            Some("Inventory"),
            MigrateError::InvalidRow("disk I/O error".into()),
        );
        assert_eq!(
            err.to_string(),
            "Cannot read source catalog (columns of table 'Inventory')"
        );
        assert!(err.format_detailed().contains("Caused by:\n  1: Invalid source row: disk I/O error"));
        assert_eq!(err.exit_code(), EXIT_CONNECTIVITY_ERROR);

        let err = MigrateError::catalog(None, MigrateError::Cancelled);
        assert_eq!(err.to_string(), "Cannot read source catalog");
    }

    #[test]
    fn test_driver_errors_do_not_exit_as_config_errors() {
        let err = MigrateError::Source(sqlx::Error::PoolClosed);
        assert_eq!(err.exit_code(), EXIT_CONNECTIVITY_ERROR);
        let err = MigrateError::InvalidRow("productID is NULL".into());
        assert_eq!(err.exit_code(), EXIT_TRANSACTION_ERROR);
    }

    #[test]
    fn test_cancelled_transaction_exit_code() {
        let err = MigrateError::Transaction {
            table: "products".into(),
            mapping: "{}".into(),
            rows: 10,
            source: Box::new(MigrateError::Cancelled),
        };
        assert_eq!(err.exit_code(), EXIT_CANCELLED);
    }
}
