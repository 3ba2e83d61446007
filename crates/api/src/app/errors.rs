use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use aurora_auth::AuthzError;
use aurora_core::DomainError;
use aurora_infra::classifier::ClassifierError;
use aurora_infra::image_store::ImageStoreError;

use crate::app::services::AnalyzeError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Malformed or mistyped JSON body.
pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_input", rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_input", rejection.body_text())
}

pub fn forbidden(err: AuthzError) -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn invalid_id(what: &str) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
}

pub fn not_found(what: &str) -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
    }
}

pub fn classifier_error_to_response(err: ClassifierError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        ClassifierError::Timeout(_) => json_error(StatusCode::GATEWAY_TIMEOUT, "classifier_timeout", message),
        ClassifierError::Unavailable(_) | ClassifierError::UpstreamStatus(_) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "classifier_unavailable", message)
        }
        ClassifierError::InvalidResponse(_) => {
            json_error(StatusCode::BAD_GATEWAY, "classifier_bad_response", message)
        }
    }
}

pub fn image_store_error_to_response(err: ImageStoreError) -> axum::response::Response {
    match err {
        ImageStoreError::NotFound => not_found("image"),
        other => {
            tracing::error!(error = %other, "image storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", other.to_string())
        }
    }
}

pub fn analyze_error_to_response(err: AnalyzeError) -> axum::response::Response {
    match err {
        AnalyzeError::ImageNotFound => not_found("image"),
        AnalyzeError::Storage(e) => image_store_error_to_response(e),
        AnalyzeError::Classifier(e) => classifier_error_to_response(e),
        // The engine only rejects what the classifier handed back.
        AnalyzeError::Triage(e) => json_error(StatusCode::BAD_GATEWAY, "classifier_bad_response", e.to_string()),
    }
}
