use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use aurora_catalog::{NewProduct, Product, ProductPatch, TagSet, format_price, parse_price};
use aurora_core::DomainResult;
use aurora_infra::records::AnalysisRecord;
use aurora_triage::{Alternative, Condition, TriageOutcome};

// -------------------------
// Request DTOs
// -------------------------

/// Product draft as sent by admins. Tag lists are comma-separated prose and
/// prices decimal strings (`"24.99"`).
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<String>,
    pub stock: Option<u32>,
    #[serde(default)]
    pub targets: String,
    #[serde(default)]
    pub suitable_for: String,
    #[serde(default)]
    pub when_to_apply: String,
    pub image_url: Option<String>,
}

impl CreateProductRequest {
    pub fn into_draft(self) -> DomainResult<NewProduct> {
        let price = match self.price.as_deref() {
            Some(raw) => parse_price(raw)?,
            None => 0,
        };

        Ok(NewProduct {
            name: self.name,
            brand: self.brand,
            category: self.category,
            description: self.description,
            price,
            stock: self.stock.unwrap_or(0),
            targets: TagSet::parse_list(&self.targets),
            suitable_for: TagSet::parse_list(&self.suitable_for),
            when_to_apply: self.when_to_apply,
            image_url: self.image_url,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub stock: Option<u32>,
    pub targets: Option<String>,
    pub suitable_for: Option<String>,
    pub when_to_apply: Option<String>,
    pub image_url: Option<String>,
}

impl UpdateProductRequest {
    pub fn into_patch(self) -> DomainResult<ProductPatch> {
        let price = self.price.as_deref().map(parse_price).transpose()?;

        Ok(ProductPatch {
            name: self.name,
            brand: self.brand,
            category: self.category,
            description: self.description,
            price,
            stock: self.stock,
            targets: self.targets.as_deref().map(TagSet::parse_list),
            suitable_for: self.suitable_for.as_deref().map(TagSet::parse_list),
            when_to_apply: self.when_to_apply,
            image_url: self.image_url,
        })
    }
}

/// A classification supplied directly by the caller (`POST /triage`).
#[derive(Debug, Deserialize)]
pub struct TriageRequest {
    pub condition: String,
    pub confidence: f64,
    #[serde(default)]
    pub alternatives: Vec<TriageAlternative>,
    pub top_k: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TriageAlternative {
    pub condition: String,
    pub confidence: f64,
}

impl TriageAlternative {
    pub fn parse(&self) -> Result<Alternative, aurora_triage::TriageError> {
        Ok(Alternative {
            label: self.condition.parse::<Condition>()?,
            confidence: self.confidence,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TopKParams {
    pub top_k: Option<i64>,
}

/// Negative `top_k` means "recommend nothing".
pub fn clamp_top_k(requested: Option<i64>, default: usize) -> usize {
    match requested {
        Some(k) if k <= 0 => 0,
        Some(k) => usize::try_from(k).unwrap_or(usize::MAX),
        None => default,
    }
}

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    pub appointment_date: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmAppointmentRequest {
    pub assigned_dermatologist: Option<String>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn product_to_json(p: &Product) -> Value {
    json!({
        "id": p.id,
        "name": p.name,
        "brand": p.brand,
        "category": p.category,
        "description": p.description,
        "price": format_price(p.price),
        "price_cents": p.price,
        "stock": p.stock,
        "in_stock": p.in_stock(),
        "targets": p.targets,
        "suitable_for": p.suitable_for,
        "when_to_apply": p.when_to_apply,
        "image_url": p.image_url,
    })
}

pub fn outcome_to_json(outcome: &TriageOutcome) -> Value {
    json!({
        "category": outcome.category,
        "message": outcome.message,
        "recommendations": outcome.recommendations.iter().map(product_to_json).collect::<Vec<_>>(),
    })
}

pub fn analysis_to_json(record: &AnalysisRecord, recommendations: &[Product]) -> Value {
    json!({
        "id": record.id.to_string(),
        "image_id": record.image_id.to_string(),
        "condition": record.condition,
        "confidence": record.confidence,
        "critical": record.condition.is_critical(),
        "alternatives": record.alternatives,
        "category": record.category,
        "message": record.message,
        "recommended_product_ids": record.recommended_product_ids,
        "recommendations": recommendations.iter().map(product_to_json).collect::<Vec<_>>(),
        "created_at": record.created_at.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_clamps_negative_and_defaults_when_absent() {
        assert_eq!(clamp_top_k(None, 3), 3);
        assert_eq!(clamp_top_k(Some(-4), 3), 0);
        assert_eq!(clamp_top_k(Some(0), 3), 0);
        assert_eq!(clamp_top_k(Some(7), 3), 7);
    }

    #[test]
    fn create_request_normalizes_tags_and_price() {
        let req: CreateProductRequest = serde_json::from_value(json!({
            "name": "Niacinamide Serum",
            "brand": "Aurora Beauty",
            "category": "Serum",
            "price": "$18.50",
            "targets": "Excess oil, Enlarged pores"
        }))
        .unwrap();

        let draft = req.into_draft().unwrap();
        assert_eq!(draft.price, 1850);
        assert_eq!(draft.stock, 0);
        assert_eq!(draft.targets.to_string(), "EnlargedPores, ExcessOil");
    }

    #[test]
    fn bad_price_is_a_validation_error() {
        let req = UpdateProductRequest {
            price: Some("12.345".to_string()),
            ..UpdateProductRequest::default()
        };
        assert!(req.into_patch().is_err());
    }
}
