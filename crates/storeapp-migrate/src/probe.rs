//! Locating the product table in an unfamiliar source catalog.
//!
//! A table literally named `products` or `product` wins outright. Otherwise
//! the first table in catalog order that has a `name` column and a price-like
//! column is taken. There is no scoring between several plausible tables.

use std::collections::HashSet;

use tracing::debug;

use crate::core::traits::SourceReader;
use crate::error::{MigrateError, Result};

/// Table names accepted without looking at their columns (case-insensitive).
const EXACT_TABLE_NAMES: [&str; 2] = ["products", "product"];

/// Column that must be present for the fallback match.
const NAME_COLUMN: &str = "name";

/// At least one of these must be present for the fallback match.
const PRICE_COLUMNS: [&str; 3] = ["price", "cost", "unitprice"];

/// Find the source table holding products.
///
/// Returns [`MigrateError::SchemaNotFound`] naming every table checked when
/// nothing qualifies.
pub async fn find_products_table(reader: &dyn SourceReader) -> Result<String> {
    let tables = reader
        .list_tables()
        .await
        .map_err(|e| MigrateError::catalog(None, e))?;

    if let Some(table) = exact_name_match(&tables) {
        debug!("Products table '{}' matched by name", table);
        return Ok(table.clone());
    }

    for table in &tables {
        let columns = lowercase_columns(reader, table).await?;
        if looks_like_products(&columns) {
            debug!("Products table '{}' matched by columns {:?}", table, columns);
            return Ok(table.clone());
        }
    }

    Err(MigrateError::SchemaNotFound { checked: tables })
}

fn exact_name_match(tables: &[String]) -> Option<&String> {
    tables.iter().find(|t| {
        EXACT_TABLE_NAMES
            .iter()
            .any(|name| t.eq_ignore_ascii_case(name))
    })
}

async fn lowercase_columns(reader: &dyn SourceReader, table: &str) -> Result<HashSet<String>> {
    Ok(reader
        .table_columns(table)
        .await
        .map_err(|e| MigrateError::catalog(Some(table), e))?
        .into_iter()
        .map(|c| c.to_lowercase())
        .collect())
}

fn looks_like_products(columns: &HashSet<String>) -> bool {
    columns.contains(NAME_COLUMN) && PRICE_COLUMNS.iter().any(|c| columns.contains(*c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticCatalog;

    #[tokio::test]
    async fn test_exact_name_beats_heuristic_match() {
        // "catalog" sorts first and satisfies the fallback rule
        let source = StaticCatalog::new()
            .with_table("catalog", &["id", "name", "price"])
            .with_table("PRODUCTS", &["sku", "label"]);

        let table = find_products_table(&source).await.unwrap();
        assert_eq!(table, "PRODUCTS");
        assert_eq!(source.column_lookups(), 0);
    }

    #[tokio::test]
    async fn test_singular_name_matches() {
        let source = StaticCatalog::new()
            .with_table("orders", &["id"])
            .with_table("Product", &["id"]);
        assert_eq!(find_products_table(&source).await.unwrap(), "Product");
    }

    #[tokio::test]
    async fn test_first_qualifying_table_wins() {
        let source = StaticCatalog::new()
            .with_table("customers", &["id", "Name", "email"])
            .with_table("items", &["ID", "Name", "UnitPrice"])
            .with_table("stock", &["id", "name", "cost"]);

        assert_eq!(find_products_table(&source).await.unwrap(), "items");
    }

    #[tokio::test]
    async fn test_each_price_alias_qualifies() {
        for price in PRICE_COLUMNS {
            let source = StaticCatalog::new().with_table("goods", &["name", price]);
            assert_eq!(find_products_table(&source).await.unwrap(), "goods");
        }
    }

    #[tokio::test]
    async fn test_name_without_price_does_not_qualify() {
        let source = StaticCatalog::new()
            .with_table("users", &["id", "name"])
            .with_table("prices", &["id", "price"]);

        let err = find_products_table(&source).await.unwrap_err();
        match err {
            MigrateError::SchemaNotFound { checked } => {
                assert_eq!(checked, vec!["users".to_string(), "prices".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_column_lookup_failure_names_table() {
        let source = StaticCatalog::new()
            .with_table("customers", &["id", "email"])
            .with_broken_table("ledger");

        let err = find_products_table(&source).await.unwrap_err();
        match err {
            MigrateError::Catalog { table, source } => {
                assert_eq!(table.as_deref(), Some("ledger"));
                assert!(matches!(*source, MigrateError::InvalidRow(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_catalog_is_not_found() {
        let err = find_products_table(&StaticCatalog::new()).await.unwrap_err();
        assert!(matches!(err, MigrateError::SchemaNotFound { checked } if checked.is_empty()));
    }
}
