//! SQLite SQL dialect.

use crate::core::schema::{CanonicalField, ResolvedColumns, PRODUCTS_TABLE, PRODUCT_COLUMNS};
use crate::core::traits::Dialect;

/// SQLITE_MAX_VARIABLE_NUMBER for SQLite 3.32+.
const SQLITE_MAX_VARIABLES: usize = 32766;

/// Storage class of the raw key value, as reported by `typeof()`.
pub(crate) const KEY_TYPE_ALIAS: &str = "productIDType";

/// Raw key value rendered as text, for validating the INTEGER cast.
pub(crate) const KEY_TEXT_ALIAS: &str = "productIDText";

/// SQLite dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Create a new SQLite dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// SELECT over the resolved source columns, aliased to canonical names.
    ///
    /// SQLite is dynamically typed, so every value is coerced here rather than
    /// trusted to the declared column type: the key to INTEGER, the name to
    /// TEXT and the amounts to REAL. The key cast silently maps `'A-1'` to 0,
    /// so the raw key's storage class and text come along for validation.
    pub fn build_product_select(&self, table: &str, columns: &ResolvedColumns) -> String {
        let key = self.quote_ident(columns.column(CanonicalField::ProductId));
        let mut select_list = CanonicalField::ALL
            .iter()
            .map(|field| {
                let target_type = match field {
                    CanonicalField::ProductId => "INTEGER",
                    CanonicalField::ProductName => "TEXT",
                    CanonicalField::Price | CanonicalField::Quantity => "REAL",
                };
                format!(
                    "CAST({} AS {}) AS {}",
                    self.quote_ident(columns.column(*field)),
                    target_type,
                    self.quote_ident(field.name())
                )
            })
            .collect::<Vec<_>>();
        select_list.push(format!("typeof({}) AS {}", key, self.quote_ident(KEY_TYPE_ALIAS)));
        select_list.push(format!(
            "CAST({} AS TEXT) AS {}",
            key,
            self.quote_ident(KEY_TEXT_ALIAS)
        ));

        format!(
            "SELECT {} FROM {}",
            select_list.join(", "),
            self.quote_ident(table)
        )
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn build_product_upsert(&self, rows: usize) -> String {
        let col_list = PRODUCT_COLUMNS
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        let values = vec!["(?, ?, ?, ?, NULL)"; rows.max(1)].join(", ");

        let update_set = PRODUCT_COLUMNS[1..]
            .iter()
            .map(|c| {
                let quoted = self.quote_ident(c);
                format!("{} = excluded.{}", quoted, quoted)
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES {} ON CONFLICT({}) DO UPDATE SET {}",
            self.quote_ident(PRODUCTS_TABLE),
            col_list,
            values,
            self.quote_ident(PRODUCT_COLUMNS[0]),
            update_set
        )
    }

    fn max_params(&self) -> usize {
        SQLITE_MAX_VARIABLES
    }
}
