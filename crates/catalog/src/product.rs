use serde::{Deserialize, Serialize};

use aurora_core::{DomainError, DomainResult};

use crate::tag::TagSet;

/// Catalog product identifier.
///
/// Sequential, assigned by the catalog store; catalog order is id order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("ProductId: {e}")))
    }
}

/// A catalog product as seen by the rest of the system.
///
/// Immutable once loaded into a catalog snapshot; changes go through
/// [`ProductPatch`] and produce a new value in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub stock: u32,
    /// Concerns the product addresses.
    pub targets: TagSet,
    /// Skin types the product is suitable for.
    pub suitable_for: TagSet,
    pub when_to_apply: String,
    pub image_url: Option<String>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Product draft (not yet assigned an id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: u64,
    pub stock: u32,
    #[serde(default)]
    pub targets: TagSet,
    #[serde(default)]
    pub suitable_for: TagSet,
    #[serde(default)]
    pub when_to_apply: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Check the draft against catalog rules.
    pub fn validate(&self) -> DomainResult<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("brand", &self.brand)?;
        require_non_empty("category", &self.category)?;
        if let Some(url) = &self.image_url {
            require_non_empty("image_url", url)?;
        }
        Ok(())
    }

    /// Validate and assign an id.
    pub fn into_product(self, id: ProductId) -> DomainResult<Product> {
        self.validate()?;
        Ok(Product {
            id,
            name: self.name.trim().to_string(),
            brand: self.brand.trim().to_string(),
            category: self.category.trim().to_string(),
            description: self.description,
            price: self.price,
            stock: self.stock,
            targets: self.targets,
            suitable_for: self.suitable_for,
            when_to_apply: self.when_to_apply,
            image_url: self.image_url,
        })
    }
}

/// Partial update of a product. Absent fields are left unchanged; the id never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub stock: Option<u32>,
    pub targets: Option<TagSet>,
    pub suitable_for: Option<TagSet>,
    pub when_to_apply: Option<String>,
    pub image_url: Option<String>,
}

impl ProductPatch {
    /// Apply the patch, returning the updated product. The input is left untouched on error.
    pub fn apply(self, product: &Product) -> DomainResult<Product> {
        let mut next = product.clone();

        if let Some(name) = self.name {
            require_non_empty("name", &name)?;
            next.name = name.trim().to_string();
        }
        if let Some(brand) = self.brand {
            require_non_empty("brand", &brand)?;
            next.brand = brand.trim().to_string();
        }
        if let Some(category) = self.category {
            require_non_empty("category", &category)?;
            next.category = category.trim().to_string();
        }
        if let Some(description) = self.description {
            next.description = description;
        }
        if let Some(price) = self.price {
            next.price = price;
        }
        if let Some(stock) = self.stock {
            next.stock = stock;
        }
        if let Some(targets) = self.targets {
            next.targets = targets;
        }
        if let Some(suitable_for) = self.suitable_for {
            next.suitable_for = suitable_for;
        }
        if let Some(when) = self.when_to_apply {
            next.when_to_apply = when;
        }
        if let Some(url) = self.image_url {
            require_non_empty("image_url", &url)?;
            next.image_url = Some(url);
        }

        Ok(next)
    }
}

fn require_non_empty(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Parse a decimal price (`"24.99"`, `"$10"`, `"7.5"`) into cents.
pub fn parse_price(raw: &str) -> DomainResult<u64> {
    let trimmed = raw.trim().trim_start_matches('$').trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("price must not be empty"));
    }

    let invalid = || DomainError::validation(format!("invalid price: {raw:?}"));

    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if frac.len() > 2 || !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let cents: u64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };

    whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(invalid)
}

/// Render cents as a decimal string (`2499` → `"24.99"`).
pub fn format_price(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}
