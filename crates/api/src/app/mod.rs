//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, classifier client, the analysis workflow
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router};
use tower::ServiceBuilder;

use aurora_auth::Hs256JwtValidator;
use aurora_infra::{
    classifier::{Classifier, HttpClassifier},
    image_store::{ImageStore, InMemoryImageStore, LocalDiskImageStore},
    store::InMemoryProductStore,
};

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::{AppServices, Limits};

/// Build the full HTTP router from configuration (public entrypoint used by `main.rs`).
///
/// Loads the catalog CSV and opens image storage; fails if either is unusable.
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let products = match &config.catalog_csv {
        Some(path) => {
            let drafts = aurora_catalog::load_csv(path)
                .with_context(|| format!("failed to load catalog from {}", path.display()))?;
            let store = InMemoryProductStore::seeded(drafts).context("catalog contains invalid products")?;
            tracing::info!(path = %path.display(), products = store.len(), "catalog loaded");
            store
        }
        None => {
            tracing::warn!("AURORA_CATALOG_CSV not set; starting with an empty catalog");
            InMemoryProductStore::new()
        }
    };

    let image_bytes: Arc<dyn ImageStore> = match &config.upload_dir {
        Some(dir) => Arc::new(
            LocalDiskImageStore::open(dir)
                .await
                .with_context(|| format!("failed to open upload dir {}", dir.display()))?,
        ),
        None => Arc::new(InMemoryImageStore::new()),
    };

    let classifier: Arc<dyn Classifier> = Arc::new(
        HttpClassifier::new(&config.classifier_url, config.classifier_timeout)
            .context("failed to build classifier client")?,
    );
    tracing::info!(url = %config.classifier_url, timeout_secs = config.classifier_timeout.as_secs(), "classifier configured");

    let services = AppServices::new(
        Arc::new(products),
        image_bytes,
        classifier,
        Limits {
            default_top_k: config.default_top_k,
            max_upload_bytes: config.max_upload_bytes,
        },
    );

    Ok(build_router(services, &config.jwt_secret))
}

/// Assemble routes around already-built services.
pub fn build_router(services: AppServices, jwt_secret: &str) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let max_upload_bytes = services.limits.max_upload_bytes;
    let services = Arc::new(services);

    // Protected routes: require a valid bearer token.
    let protected = routes::router(max_upload_bytes).layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    routes::public_router()
        .merge(protected)
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
