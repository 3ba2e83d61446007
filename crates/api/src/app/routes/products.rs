use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use aurora_catalog::ProductId;
use aurora_infra::store::ProductStore;

use crate::app::{dto, errors, services::AppServices};
use crate::authz::{self, PRODUCTS_WRITE};
use crate::context::PrincipalContext;

/// Catalog browsing; no token needed.
pub fn public_router() -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
}

/// Catalog management; merged under the auth layer.
pub fn admin_router() -> Router {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", axum::routing::patch(update_product).delete(delete_product))
}

fn parse_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("product"))
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let items = services
        .products
        .snapshot()
        .iter()
        .map(dto::product_to_json)
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.products.get(id) {
        Some(p) => (StatusCode::OK, Json(dto::product_to_json(&p))).into_response(),
        None => errors::not_found("product"),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, PRODUCTS_WRITE) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let created = body
        .into_draft()
        .and_then(|draft| services.products.insert(draft));

    match created {
        Ok(p) => {
            tracing::info!(product_id = %p.id, name = %p.name, "product created");
            (StatusCode::CREATED, Json(dto::product_to_json(&p))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, PRODUCTS_WRITE) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let updated = body
        .into_patch()
        .and_then(|patch| services.products.update(id, patch));

    match updated {
        Ok(p) => (StatusCode::OK, Json(dto::product_to_json(&p))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, PRODUCTS_WRITE) {
        return errors::forbidden(e);
    }
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.remove(id) {
        Ok(p) => {
            tracing::info!(product_id = %p.id, "product removed");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
