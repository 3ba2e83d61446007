//! Confidence/criticality triage policy.
//!
//! The policy is an ordered rule table: rules are evaluated top to bottom and
//! the first one whose predicate holds decides the category. The last rule is a
//! catch-all, so every valid classification matches exactly one rule.

use serde::{Deserialize, Serialize};

use crate::result::ClassificationResult;

/// At or above this confidence the classifier's verdict is trusted outright.
pub const CONFIDENT_THRESHOLD: f64 = 0.99;

/// Below this confidence a critical condition is referred to a specialist.
pub const REFERRAL_THRESHOLD: f64 = 0.90;

pub const REFERRAL_MESSAGE: &str =
    "Model is not confident and condition is critical. Please consult a dermatologist.";

pub const CAUTION_MESSAGE: &str = "Model is moderately confident. Use recommended products with care.";

/// Recommendation category chosen by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationCategory {
    #[serde(rename = "products")]
    Products,
    #[serde(rename = "cautious_products")]
    CautiousProducts,
    #[serde(rename = "refer")]
    ReferToSpecialist,
}

impl RecommendationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationCategory::Products => "products",
            RecommendationCategory::CautiousProducts => "cautious_products",
            RecommendationCategory::ReferToSpecialist => "refer",
        }
    }
}

impl core::fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the policy table.
#[derive(Debug)]
pub struct PolicyRule {
    pub name: &'static str,
    pub applies: fn(&ClassificationResult) -> bool,
    pub category: RecommendationCategory,
    pub message: Option<&'static str>,
}

pub static POLICY: &[PolicyRule] = &[
    PolicyRule {
        name: "confident",
        applies: is_confident,
        category: RecommendationCategory::Products,
        message: None,
    },
    PolicyRule {
        name: "uncertain_critical",
        applies: is_uncertain_critical,
        category: RecommendationCategory::ReferToSpecialist,
        message: Some(REFERRAL_MESSAGE),
    },
    PolicyRule {
        name: "cautious",
        applies: always,
        category: RecommendationCategory::CautiousProducts,
        message: Some(CAUTION_MESSAGE),
    },
];

fn is_confident(result: &ClassificationResult) -> bool {
    result.confidence >= CONFIDENT_THRESHOLD
}

fn is_uncertain_critical(result: &ClassificationResult) -> bool {
    result.confidence < REFERRAL_THRESHOLD && result.label.is_critical()
}

fn always(_: &ClassificationResult) -> bool {
    true
}

/// First matching rule for `result`.
pub fn decide(result: &ClassificationResult) -> &'static PolicyRule {
    POLICY
        .iter()
        .find(|rule| (rule.applies)(result))
        .unwrap_or(&POLICY[POLICY.len() - 1])
}
