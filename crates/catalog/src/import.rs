//! CSV ingestion for the product catalog.
//!
//! Expected header: `Product`, `Targets`, `Suitable for`, `When to apply`.
//! Optional columns: `Brand`, `Category`, `Description`, `Price`, `Stock`.
//! Free-text tag columns are normalized into [`TagSet`]s here, once.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::product::{NewProduct, parse_price};
use crate::tag::TagSet;

/// Brand used when the CSV has no `Brand` column.
pub const DEFAULT_BRAND: &str = "Aurora Beauty";

/// Category used when neither a `Category` column nor a multi-word name is available.
pub const DEFAULT_CATEGORY: &str = "Skincare";

#[derive(Debug, Error)]
pub enum CatalogImportError {
    #[error("failed to open catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid catalog row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Product")]
    product: String,
    #[serde(rename = "Targets", default)]
    targets: String,
    #[serde(rename = "Suitable for", default)]
    suitable_for: String,
    #[serde(rename = "When to apply", default)]
    when_to_apply: String,
    #[serde(rename = "Brand", default)]
    brand: Option<String>,
    #[serde(rename = "Category", default)]
    category: Option<String>,
    #[serde(rename = "Description", default)]
    description: Option<String>,
    #[serde(rename = "Price", default)]
    price: Option<String>,
    #[serde(rename = "Stock", default)]
    stock: Option<u32>,
}

/// Load product drafts from a CSV file on disk.
pub fn load_csv(path: &Path) -> Result<Vec<NewProduct>, CatalogImportError> {
    let file = File::open(path)?;
    parse_csv(file)
}

/// Parse product drafts from CSV. Rows with an empty product name are skipped;
/// order of the returned drafts follows the file.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<NewProduct>, CatalogImportError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut drafts = Vec::new();

    for (idx, result) in rdr.deserialize::<CatalogRow>().enumerate() {
        let row = result?;
        // Row numbers are 1-based and skip the header line.
        let row_no = idx + 2;

        if row.product.trim().is_empty() {
            continue;
        }

        let draft = row_to_draft(row).map_err(|reason| CatalogImportError::InvalidRow { row: row_no, reason })?;
        drafts.push(draft);
    }

    Ok(drafts)
}

fn row_to_draft(row: CatalogRow) -> Result<NewProduct, String> {
    let name = row.product.trim().to_string();

    let category = non_blank(row.category).unwrap_or_else(|| category_from_name(&name));
    let brand = non_blank(row.brand).unwrap_or_else(|| DEFAULT_BRAND.to_string());

    let price = match non_blank(row.price) {
        Some(raw) => parse_price(&raw).map_err(|e| e.to_string())?,
        None => 0,
    };

    let description = non_blank(row.description).unwrap_or_else(|| {
        format!(
            "Targets: {}. Suitable for: {}. Apply: {}",
            row.targets, row.suitable_for, row.when_to_apply
        )
    });

    let draft = NewProduct {
        name,
        brand,
        category,
        description,
        price,
        stock: row.stock.unwrap_or(0),
        targets: TagSet::parse_list(&row.targets),
        suitable_for: TagSet::parse_list(&row.suitable_for),
        when_to_apply: row.when_to_apply,
        image_url: None,
    };
    draft.validate().map_err(|e| e.to_string())?;
    Ok(draft)
}

/// Category fallback: the first word of a multi-word product name.
fn category_from_name(name: &str) -> String {
    match name.split_once(' ') {
        Some((first, _)) if !first.is_empty() => first.to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
