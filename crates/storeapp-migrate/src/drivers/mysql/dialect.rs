//! MySQL/MariaDB SQL dialect (Strategy pattern).
//!
//! Provides MySQL-specific identifier quoting and the product upsert statement.

use crate::core::schema::{PRODUCTS_TABLE, PRODUCT_COLUMNS};
use crate::core::traits::Dialect;

/// MySQL max placeholders per prepared statement.
const MYSQL_MAX_PLACEHOLDERS: usize = 65535;

/// MySQL/MariaDB dialect implementation.
///
/// Compatible with MySQL 5.7+, 8.0+, and MariaDB 10.2+.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn quote_ident(&self, name: &str) -> String {
        // MySQL uses backticks for identifier quoting
        // Handle names that contain backticks by doubling them
        format!("`{}`", name.replace('`', "``"))
    }

    fn build_product_upsert(&self, rows: usize) -> String {
        let col_list = PRODUCT_COLUMNS
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        let values = vec!["(?, ?, ?, ?, NULL)"; rows.max(1)].join(", ");

        // sellerID = VALUES(sellerID) clears any owner assigned in the POS.
        let update_set = PRODUCT_COLUMNS[1..]
            .iter()
            .map(|c| {
                let quoted = self.quote_ident(c);
                format!("{} = VALUES({})", quoted, quoted)
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES {} ON DUPLICATE KEY UPDATE {}",
            self.quote_ident(PRODUCTS_TABLE),
            col_list,
            values,
            update_set
        )
    }

    fn max_params(&self) -> usize {
        MYSQL_MAX_PLACEHOLDERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        let dialect = MysqlDialect::new();
        assert_eq!(dialect.quote_ident("products"), "`products`");
        assert_eq!(dialect.quote_ident("odd`name"), "`odd``name`");
    }

    #[test]
    fn test_build_product_upsert_single_row() {
        let sql = MysqlDialect::new().build_product_upsert(1);
        assert_eq!(
            sql,
            "INSERT INTO `products` (`productID`, `productName`, `price`, `quantity`, `sellerID`) \
             VALUES (?, ?, ?, ?, NULL) ON DUPLICATE KEY UPDATE `productName` = VALUES(`productName`), \
             `price` = VALUES(`price`), `quantity` = VALUES(`quantity`), `sellerID` = VALUES(`sellerID`)"
        );
    }

    #[test]
    fn test_build_product_upsert_multi_row() {
        let sql = MysqlDialect::new().build_product_upsert(3);
        assert_eq!(sql.matches("(?, ?, ?, ?, NULL)").count(), 3);
        assert_eq!(sql.matches('?').count(), 12);
    }

    #[test]
    fn test_max_rows_per_statement() {
        assert_eq!(MysqlDialect::new().max_rows_per_statement(), 16383);
    }
}
