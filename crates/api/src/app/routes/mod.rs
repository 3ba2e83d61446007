use axum::{
    Router,
    routing::{get, post},
};

pub mod admin;
pub mod analyses;
pub mod appointments;
pub mod images;
pub mod products;
pub mod profile;
pub mod system;
pub mod triage;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(products::public_router())
}

/// Router for all authenticated endpoints.
pub fn router(max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/triage", post(triage::run_triage))
        .route("/profile", get(profile::get_profile).put(profile::put_profile))
        .merge(products::admin_router())
        .nest("/images", images::router(max_upload_bytes))
        .nest("/analyses", analyses::router())
        .nest("/appointments", appointments::router())
        .nest("/admin", admin::router())
}
