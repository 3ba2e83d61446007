//! Product catalog module.
//!
//! This crate contains the catalog's business rules (product validation, tag
//! normalization, CSV ingestion), implemented as deterministic domain logic
//! (no HTTP, no storage).

pub mod import;
pub mod product;
pub mod tag;

pub use import::{CatalogImportError, load_csv, parse_csv};
pub use product::{NewProduct, Product, ProductId, ProductPatch, format_price, parse_price};
pub use tag::{Tag, TagSet};
