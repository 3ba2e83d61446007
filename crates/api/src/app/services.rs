//! Service wiring: stores, classifier client, and the analysis workflow.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use aurora_appointments::Appointment;
use aurora_catalog::{Product, ProductId};
use aurora_core::{AnalysisId, AppointmentId, ImageId, UserId};
use aurora_infra::{
    classifier::{Classifier, ClassifierError, ImagePayload},
    image_store::{ImageStore, ImageStoreError},
    records::{AnalysisRecord, ImageRecord, UserProfile},
    store::{InMemoryUserStore, ProductStore, UserStore},
};
use aurora_triage::{TriageError, classify};

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("image not found")]
    ImageNotFound,

    #[error(transparent)]
    Storage(#[from] ImageStoreError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Triage(#[from] TriageError),
}

/// Tunables that shape request handling.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub default_top_k: usize,
    pub max_upload_bytes: usize,
}

pub struct AppServices {
    pub products: Arc<dyn ProductStore>,
    pub images: InMemoryUserStore<ImageId, ImageRecord>,
    pub image_bytes: Arc<dyn ImageStore>,
    pub analyses: InMemoryUserStore<AnalysisId, AnalysisRecord>,
    pub appointments: InMemoryUserStore<AppointmentId, Appointment>,
    pub profiles: InMemoryUserStore<UserId, UserProfile>,
    pub classifier: Arc<dyn Classifier>,
    pub limits: Limits,
}

impl AppServices {
    pub fn new(
        products: Arc<dyn ProductStore>,
        image_bytes: Arc<dyn ImageStore>,
        classifier: Arc<dyn Classifier>,
        limits: Limits,
    ) -> Self {
        Self {
            products,
            images: InMemoryUserStore::new(),
            image_bytes,
            analyses: InMemoryUserStore::new(),
            appointments: InMemoryUserStore::new(),
            profiles: InMemoryUserStore::new(),
            classifier,
            limits,
        }
    }

    /// Classify a stored image, triage it against the current catalog and
    /// persist the analysis.
    ///
    /// Nothing is persisted unless every step succeeds.
    pub async fn analyze(
        &self,
        user_id: UserId,
        image_id: ImageId,
        top_k: usize,
    ) -> Result<(AnalysisRecord, Vec<Product>), AnalyzeError> {
        let image = self
            .images
            .get(user_id, &image_id)
            .ok_or(AnalyzeError::ImageNotFound)?;
        let bytes = self.image_bytes.load(image_id).await?;

        tracing::info!(user_id = %user_id, image_id = %image_id, top_k, "analysis requested");

        let result = self
            .classifier
            .predict(ImagePayload {
                filename: image.filename,
                bytes,
            })
            .await?;

        let catalog = self.products.snapshot();
        let outcome = classify(&result, &catalog, top_k)?;

        let record = AnalysisRecord::new(AnalysisId::new(), user_id, image_id, result, &outcome, Utc::now());
        self.analyses.upsert(user_id, record.id, record.clone());

        tracing::info!(
            analysis_id = %record.id,
            condition = record.condition.display_name(),
            confidence = record.confidence,
            category = %record.category,
            recommended = record.recommended_product_ids.len(),
            "triage decided"
        );

        Ok((record, outcome.recommendations))
    }

    /// Resolve stored product ids against the current catalog, skipping removed products.
    pub fn resolve_products(&self, ids: &[ProductId]) -> Vec<Product> {
        ids.iter().filter_map(|id| self.products.get(*id)).collect()
    }

    /// A user's analyses, newest first.
    pub fn analyses_for(&self, user_id: UserId) -> Vec<AnalysisRecord> {
        let mut items = self.analyses.list(user_id);
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        items
    }
}
