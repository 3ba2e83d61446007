use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use aurora_catalog::Product;

use crate::condition::Condition;
use crate::policy::{self, RecommendationCategory};
use crate::result::{ClassificationResult, TriageError};
use crate::targets::relevant_tags;

/// Number of products recommended when the caller does not say otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Triage decision for one classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageOutcome {
    pub category: RecommendationCategory,
    pub message: Option<String>,
    pub recommendations: Vec<Product>,
}

/// Decide a recommendation category for `result` and pick up to `top_k` products
/// from `catalog`.
///
/// Fails only on invalid input; an empty catalog yields an empty recommendation list.
pub fn classify(
    result: &ClassificationResult,
    catalog: &[Product],
    top_k: usize,
) -> Result<TriageOutcome, TriageError> {
    classify_with_rng(result, catalog, top_k, &mut rand::rng())
}

/// [`classify`] with an explicit random source for the no-match fallback.
pub fn classify_with_rng<R: Rng + ?Sized>(
    result: &ClassificationResult,
    catalog: &[Product],
    top_k: usize,
    rng: &mut R,
) -> Result<TriageOutcome, TriageError> {
    result.validate()?;

    let rule = policy::decide(result);
    let recommendations = select_products_with_rng(result.label, catalog, top_k, rng);

    Ok(TriageOutcome {
        category: rule.category,
        message: rule.message.map(str::to_string),
        recommendations,
    })
}

/// Products whose targets intersect the tags relevant to `label`, in catalog
/// order, truncated to `top_k`.
///
/// When nothing matches, a uniform random sample of `min(top_k, catalog.len())`
/// products from the whole catalog is returned instead.
pub fn select_products(label: Condition, catalog: &[Product], top_k: usize) -> Vec<Product> {
    select_products_with_rng(label, catalog, top_k, &mut rand::rng())
}

/// [`select_products`] with an explicit random source for the fallback.
pub fn select_products_with_rng<R: Rng + ?Sized>(
    label: Condition,
    catalog: &[Product],
    top_k: usize,
    rng: &mut R,
) -> Vec<Product> {
    if top_k == 0 || catalog.is_empty() {
        return Vec::new();
    }

    let wanted = relevant_tags(label);
    let matching: Vec<Product> = catalog
        .iter()
        .filter(|p| p.targets.intersects(wanted))
        .take(top_k)
        .cloned()
        .collect();

    if !matching.is_empty() {
        return matching;
    }

    catalog.choose_multiple(rng, top_k.min(catalog.len())).cloned().collect()
}
