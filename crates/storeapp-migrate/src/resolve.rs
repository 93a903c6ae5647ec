//! Mapping canonical product fields onto the source table's columns.
//!
//! Each [`CanonicalField`] carries an alias list in priority order. The first
//! alias present in the table (compared case-insensitively) is used, with the
//! column's original casing restored so it can be quoted in the SELECT.

use std::collections::HashMap;

use tracing::debug;

use crate::core::schema::{CanonicalField, ColumnMapping, ResolvedColumns};
use crate::core::traits::SourceReader;
use crate::error::{MigrateError, Result};

/// Map every canonical field to a column of `table`, leaving unmatched fields empty.
pub async fn resolve_columns(reader: &dyn SourceReader, table: &str) -> Result<ColumnMapping> {
    let columns = reader
        .table_columns(table)
        .await
        .map_err(|e| MigrateError::catalog(Some(table), e))?;
    let mapping = resolve_from_columns(&columns);
    debug!("Column mapping for '{}': {}", table, mapping);
    Ok(mapping)
}

/// Resolve and require all four fields.
///
/// Fails with [`crate::MigrateError::ColumnResolution`] listing the missing
/// fields and the partial mapping.
pub async fn resolve_required(reader: &dyn SourceReader, table: &str) -> Result<ResolvedColumns> {
    resolve_columns(reader, table).await?.require_all(table)
}

/// Pure resolution over a column list.
pub fn resolve_from_columns(columns: &[String]) -> ColumnMapping {
    // First occurrence wins if two columns differ only by case.
    let mut by_lower: HashMap<String, &str> = HashMap::with_capacity(columns.len());
    for column in columns {
        by_lower
            .entry(column.to_lowercase())
            .or_insert(column.as_str());
    }

    let mut mapping = ColumnMapping::default();
    for field in CanonicalField::ALL {
        let actual = field
            .aliases()
            .iter()
            .find_map(|alias| by_lower.get(*alias))
            .map(|column| column.to_string());
        mapping.set(field, actual);
    }
    mapping
}
