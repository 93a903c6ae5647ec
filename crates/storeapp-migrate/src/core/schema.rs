//! Product schema types shared by the prober, resolver, and transcriber.
//!
//! The destination layout is fixed:
//!
//! ```sql
//! products(productID PK, productName, price, quantity, sellerID NULL)
//! ```
//!
//! The source layout is not. Each run discovers it and records the result as a
//! [`ColumnMapping`], which becomes a [`ResolvedColumns`] once every mandatory
//! field has a source column.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Destination table read and written by the POS application.
pub const PRODUCTS_TABLE: &str = "products";

/// Destination columns in insert order. `sellerID` is always written as NULL.
pub const PRODUCT_COLUMNS: [&str; 5] = ["productID", "productName", "price", "quantity", "sellerID"];

/// Rows per flush to the destination.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// A product attribute required by the destination schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    #[serde(rename = "productID")]
    ProductId,
    #[serde(rename = "productName")]
    ProductName,
    #[serde(rename = "price")]
    Price,
    #[serde(rename = "quantity")]
    Quantity,
}

impl CanonicalField {
    /// All fields in destination column order. Every one is mandatory.
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::ProductId,
        CanonicalField::ProductName,
        CanonicalField::Price,
        CanonicalField::Quantity,
    ];

    /// Destination column name.
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::ProductId => "productID",
            CanonicalField::ProductName => "productName",
            CanonicalField::Price => "price",
            CanonicalField::Quantity => "quantity",
        }
    }

    /// Lower-cased source column names accepted for this field, highest priority first.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::ProductId => &["productid", "id"],
            CanonicalField::ProductName => &["productname", "name", "title"],
            CanonicalField::Price => &["price", "unitprice", "cost"],
            CanonicalField::Quantity => &["quantity", "qty", "stock"],
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical field to source column, as discovered. A field is `None` when
/// no alias matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    product_id: Option<String>,
    product_name: Option<String>,
    price: Option<String>,
    quantity: Option<String>,
}

impl ColumnMapping {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: CanonicalField, column: Option<String>) {
        *self.slot_mut(field) = column;
    }

    /// Fields with no source column, in canonical order.
    pub fn unresolved(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|f| self.get(*f).map_or(true, str::is_empty))
            .collect()
    }

    /// Require every field to be present.
    ///
    /// `table` is only used to make the error self-describing.
    pub fn require_all(self, table: &str) -> crate::error::Result<ResolvedColumns> {
        let missing = self.unresolved();
        if !missing.is_empty() {
            return Err(crate::error::MigrateError::ColumnResolution {
                table: table.to_string(),
                missing,
                mapping: self.to_string(),
            });
        }

        // unresolved() was empty, so every slot holds a column name.
        Ok(ResolvedColumns {
            product_id: self.product_id.unwrap_or_default(),
            product_name: self.product_name.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            quantity: self.quantity.unwrap_or_default(),
        })
    }

    fn slot(&self, field: CanonicalField) -> &Option<String> {
        match field {
            CanonicalField::ProductId => &self.product_id,
            CanonicalField::ProductName => &self.product_name,
            CanonicalField::Price => &self.price,
            CanonicalField::Quantity => &self.quantity,
        }
    }

    fn slot_mut(&mut self, field: CanonicalField) -> &mut Option<String> {
        match field {
            CanonicalField::ProductId => &mut self.product_id,
            CanonicalField::ProductName => &mut self.product_name,
            CanonicalField::Price => &mut self.price,
            CanonicalField::Quantity => &mut self.quantity,
        }
    }
}

impl fmt::Display for ColumnMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = CanonicalField::ALL
            .iter()
            .map(|field| format!("{}={}", field, self.get(*field).unwrap_or("<unresolved>")))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}

/// A mapping in which every canonical field has a source column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumns {
    #[serde(rename = "productID")]
    pub product_id: String,
    #[serde(rename = "productName")]
    pub product_name: String,
    pub price: String,
    pub quantity: String,
}

impl ResolvedColumns {
    /// Source column for a field.
    pub fn column(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::ProductId => &self.product_id,
            CanonicalField::ProductName => &self.product_name,
            CanonicalField::Price => &self.price,
            CanonicalField::Quantity => &self.quantity,
        }
    }
}

impl fmt::Display for ResolvedColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = CanonicalField::ALL
            .iter()
            .map(|field| format!("{}={}", field, self.column(*field)))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}

/// One source row in destination shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub product_id: i64,
    pub product_name: Option<String>,
    pub price: Decimal,
    pub quantity: Decimal,
}
