use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use aurora_infra::store::ProductStore;
use aurora_triage::{ClassificationResult, TriageError, classify};

use crate::app::{dto, errors, services::AppServices};
use crate::authz::{self, TRIAGE_RUN};
use crate::context::PrincipalContext;

/// POST /triage - run the engine on a caller-supplied classification.
///
/// Nothing is persisted.
pub async fn run_triage(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::TriageRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, TRIAGE_RUN) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let top_k = dto::clamp_top_k(body.top_k, services.limits.default_top_k);

    let outcome = build_result(&body).and_then(|result| {
        let catalog = services.products.snapshot();
        classify(&result, &catalog, top_k)
    });

    match outcome {
        Ok(outcome) => (StatusCode::OK, Json(dto::outcome_to_json(&outcome))).into_response(),
        Err(e) => errors::json_error(StatusCode::BAD_REQUEST, "invalid_input", e.to_string()),
    }
}

fn build_result(body: &dto::TriageRequest) -> Result<ClassificationResult, TriageError> {
    let alternatives = body
        .alternatives
        .iter()
        .map(dto::TriageAlternative::parse)
        .collect::<Result<Vec<_>, _>>()?;

    ClassificationResult::from_raw(&body.condition, body.confidence)?.with_alternatives(alternatives)
}
