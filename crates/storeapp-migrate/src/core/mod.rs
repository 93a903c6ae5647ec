//! Core abstractions for the product import.
//!
//! - [`schema`]: canonical fields, column mappings and product records
//! - [`traits`]: reader, writer and dialect seams implemented by `drivers`
//!
//! Driver modules (`drivers/sqlite`, `drivers/mysql`) implement these traits;
//! the prober, resolver and transcriber only ever see the traits.

pub mod schema;
pub mod traits;

pub use schema::{
    CanonicalField, ColumnMapping, ProductRecord, ResolvedColumns, DEFAULT_BATCH_SIZE,
    PRODUCTS_TABLE, PRODUCT_COLUMNS,
};
pub use traits::{Dialect, SourceReader, TargetWriter};
