//! Persisted per-user records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aurora_catalog::ProductId;
use aurora_core::{AnalysisId, DomainError, DomainResult, ImageId, UserId};
use aurora_triage::{Alternative, ClassificationResult, Condition, RecommendationCategory, TriageOutcome};

/// Metadata of an uploaded image. Bytes live in an [`ImageStore`](crate::image_store::ImageStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub user_id: UserId,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// One completed analysis: classifier verdict plus the triage decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: AnalysisId,
    pub user_id: UserId,
    pub image_id: ImageId,
    pub condition: Condition,
    pub confidence: f64,
    pub alternatives: Vec<Alternative>,
    pub category: RecommendationCategory,
    pub message: Option<String>,
    pub recommended_product_ids: Vec<ProductId>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(
        id: AnalysisId,
        user_id: UserId,
        image_id: ImageId,
        result: ClassificationResult,
        outcome: &TriageOutcome,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            image_id,
            condition: result.label,
            confidence: result.confidence,
            alternatives: result.alternatives,
            category: outcome.category,
            message: outcome.message.clone(),
            recommended_product_ids: outcome.recommendations.iter().map(|p| p.id).collect(),
            created_at: now,
        }
    }
}

pub const MAX_AGE: u8 = 120;

/// Self-reported skin profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub age: Option<u8>,
    pub sex: Option<String>,
    pub country: Option<String>,
    pub skin_type: Option<String>,
    pub concerns: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement of a user's profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub age: Option<u8>,
    pub sex: Option<String>,
    pub country: Option<String>,
    pub skin_type: Option<String>,
    pub concerns: Vec<String>,
}

impl UserProfile {
    pub fn empty(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            age: None,
            sex: None,
            country: None,
            skin_type: None,
            concerns: Vec::new(),
            updated_at: now,
        }
    }

    pub fn from_update(user_id: UserId, update: ProfileUpdate, now: DateTime<Utc>) -> DomainResult<Self> {
        if let Some(age) = update.age {
            if age == 0 || age > MAX_AGE {
                return Err(DomainError::validation(format!("age must be between 1 and {MAX_AGE}")));
            }
        }

        let concerns = update
            .concerns
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        Ok(Self {
            user_id,
            age: update.age,
            sex: non_blank(update.sex),
            country: non_blank(update.country),
            skin_type: non_blank(update.skin_type),
            concerns,
            updated_at: now,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
