use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use aurora_core::AnalysisId;
use aurora_infra::store::UserStore;

use crate::app::{dto, errors, services::AppServices};
use crate::authz::{self, ANALYSES_READ};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_analyses))
        .route("/:id", get(get_analysis))
}

/// GET /analyses - the caller's history, newest first.
pub async fn list_analyses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, ANALYSES_READ) {
        return errors::forbidden(e);
    }

    let items = services
        .analyses_for(principal.user_id())
        .iter()
        .map(|record| dto::analysis_to_json(record, &services.resolve_products(&record.recommended_product_ids)))
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_analysis(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, ANALYSES_READ) {
        return errors::forbidden(e);
    }
    let id: AnalysisId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("analysis"),
    };

    match services.analyses.get(principal.user_id(), &id) {
        Some(record) => {
            let products = services.resolve_products(&record.recommended_product_ids);
            (StatusCode::OK, Json(dto::analysis_to_json(&record, &products))).into_response()
        }
        None => errors::not_found("analysis"),
    }
}
