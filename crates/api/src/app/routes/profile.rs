use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use aurora_infra::records::{ProfileUpdate, UserProfile};
use aurora_infra::store::UserStore;

use crate::app::{errors, services::AppServices};
use crate::authz::{self, PROFILE_WRITE};
use crate::context::PrincipalContext;

/// GET /profile - the caller's profile (blank if never set).
pub async fn get_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let user_id = principal.user_id();
    let profile = services
        .profiles
        .get(user_id, &user_id)
        .unwrap_or_else(|| UserProfile::empty(user_id, Utc::now()));
    (StatusCode::OK, Json(profile)).into_response()
}

/// PUT /profile - replace the caller's profile.
pub async fn put_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, PROFILE_WRITE) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let user_id = principal.user_id();
    match UserProfile::from_update(user_id, body, Utc::now()) {
        Ok(profile) => {
            services.profiles.upsert(user_id, user_id, profile.clone());
            (StatusCode::OK, Json(profile)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
