use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::condition::Condition;

/// Output of the external skin classifier, validated.
///
/// This is an input to triage, not a decision. It can be persisted alongside the
/// outcome by higher layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Primary predicted condition.
    pub label: Condition,

    /// Confidence in \[0, 1\] for the primary label.
    pub confidence: f64,

    /// Secondary predictions, confidence-descending, never repeating `label`.
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub label: Condition,
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn new(label: Condition, confidence: f64) -> Result<Self, TriageError> {
        check_confidence(confidence)?;
        Ok(Self {
            label,
            confidence,
            alternatives: Vec::new(),
        })
    }

    /// Build from raw classifier fields (label text + confidence).
    pub fn from_raw(label: &str, confidence: f64) -> Result<Self, TriageError> {
        Self::new(label.parse()?, confidence)
    }

    /// Attach secondary predictions.
    ///
    /// Entries repeating the primary label are dropped and the remainder is
    /// sorted by confidence, highest first.
    pub fn with_alternatives(
        mut self,
        alternatives: impl IntoIterator<Item = Alternative>,
    ) -> Result<Self, TriageError> {
        let mut alts = Vec::new();
        for alt in alternatives {
            check_confidence(alt.confidence)?;
            if alt.label != self.label {
                alts.push(alt);
            }
        }
        alts.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        self.alternatives = alts;
        Ok(self)
    }

    /// Re-check invariants (fields are public, so callers can build invalid values).
    pub fn validate(&self) -> Result<(), TriageError> {
        check_confidence(self.confidence)?;
        for alt in &self.alternatives {
            check_confidence(alt.confidence)?;
        }
        Ok(())
    }
}

fn check_confidence(confidence: f64) -> Result<(), TriageError> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(TriageError::InvalidInput(format!(
            "confidence must be within [0, 1], got {confidence}"
        )));
    }
    Ok(())
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TriageError {
    #[error("invalid triage input: {0}")]
    InvalidInput(String),
}
