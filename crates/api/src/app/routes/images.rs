//! Image uploads and the analysis trigger.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Extension, Multipart, Path, Query, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use aurora_core::ImageId;
use aurora_infra::records::ImageRecord;
use aurora_infra::store::UserStore;

use crate::app::{dto, errors, services::AppServices};
use crate::authz::{self, IMAGES_READ, IMAGES_WRITE};
use crate::context::PrincipalContext;

/// Multipart field carrying the upload.
pub const IMAGE_FIELD: &str = "image";

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Room for multipart boundaries and part headers on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router {
    Router::new()
        .route(
            "/",
            post(upload_image)
                .get(list_images)
                .layer(DefaultBodyLimit::max(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD))),
        )
        .route("/:id", get(get_image))
        .route("/:id/analyze", post(analyze_image))
}

fn parse_id(raw: &str) -> Result<ImageId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("image"))
}

fn has_allowed_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn too_large(limit: usize) -> axum::response::Response {
    errors::json_error(
        StatusCode::PAYLOAD_TOO_LARGE,
        "payload_too_large",
        format!("image exceeds {limit} bytes"),
    )
}

/// POST /images - multipart upload, field `image`.
pub async fn upload_image(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    mut multipart: Multipart,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, IMAGES_WRITE) {
        return errors::forbidden(e);
    }
    let limit = services.limits.max_upload_bytes;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => return too_large(limit),
            Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.body_text()),
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        if filename.is_empty() {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "no file selected");
        }
        if !has_allowed_extension(&filename) {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                format!("file type not allowed; expected one of {}", ALLOWED_EXTENSIONS.join(", ")),
            );
        }

        let bytes = match field.bytes().await {
            Ok(b) => b,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => return too_large(limit),
            Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", e.body_text()),
        };
        if bytes.len() > limit {
            return too_large(limit);
        }
        if bytes.is_empty() {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "empty image");
        }

        let user_id = principal.user_id();
        let record = ImageRecord {
            id: ImageId::new(),
            user_id,
            filename,
            content_type,
            size: bytes.len() as u64,
            uploaded_at: Utc::now(),
        };

        if let Err(e) = services.image_bytes.save(record.id, bytes.to_vec()).await {
            return errors::image_store_error_to_response(e);
        }
        services.images.upsert(user_id, record.id, record.clone());

        tracing::info!(user_id = %user_id, image_id = %record.id, size = record.size, "image uploaded");
        return (StatusCode::CREATED, Json(record)).into_response();
    }

    errors::json_error(
        StatusCode::BAD_REQUEST,
        "validation_error",
        format!("missing multipart field '{IMAGE_FIELD}'"),
    )
}

/// GET /images - the caller's uploads, newest first.
pub async fn list_images(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, IMAGES_READ) {
        return errors::forbidden(e);
    }
    let mut items = services.images.list(principal.user_id());
    items.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_image(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, IMAGES_READ) {
        return errors::forbidden(e);
    }
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.images.get(principal.user_id(), &id) {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => errors::not_found("image"),
    }
}

/// POST /images/:id/analyze?top_k=N - classify, triage and persist.
pub async fn analyze_image(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    params: Result<Query<dto::TopKParams>, QueryRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, IMAGES_WRITE) {
        return errors::forbidden(e);
    }
    let Query(params) = match params {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let top_k = dto::clamp_top_k(params.top_k, services.limits.default_top_k);

    match services.analyze(principal.user_id(), id, top_k).await {
        Ok((record, recommendations)) => {
            (StatusCode::CREATED, Json(dto::analysis_to_json(&record, &recommendations))).into_response()
        }
        Err(e) => {
            tracing::warn!(image_id = %id, error = %e, "analysis failed");
            errors::analyze_error_to_response(e)
        }
    }
}
