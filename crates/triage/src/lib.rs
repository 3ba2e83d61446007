//! `aurora-triage`
//!
//! **Responsibility:** turn a raw skin-classifier verdict into a recommendation.
//!
//! This crate is a pure decision boundary:
//! - It never calls the classifier or reads storage; inputs are provided by callers.
//! - It never persists its outcome; the caller decides what to store.
//! - Apart from the no-match product fallback, output is a deterministic
//!   function of `(result, catalog, top_k)`.

pub mod condition;
pub mod engine;
pub mod policy;
pub mod result;
pub mod targets;

pub use condition::Condition;
pub use engine::{
    DEFAULT_TOP_K, TriageOutcome, classify, classify_with_rng, select_products, select_products_with_rng,
};
pub use policy::{POLICY, PolicyRule, RecommendationCategory};
pub use result::{Alternative, ClassificationResult, TriageError};
pub use targets::relevant_tags;
