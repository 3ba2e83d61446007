//! Staff-only views.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use aurora_core::UserId;
use aurora_infra::store::UserStore;

use crate::app::{errors, services::AppServices};
use crate::authz::{self, USERS_READ};
use crate::context::PrincipalContext;

pub const NO_ANALYSIS_YET: &str = "No analysis yet";

pub fn router() -> Router {
    Router::new().route("/users", get(list_users))
}

/// GET /admin/users - every known user with their profile and last analysed condition.
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, USERS_READ) {
        return errors::forbidden(e);
    }

    let mut users: BTreeSet<UserId> = services.profiles.list_all().into_iter().map(|(u, _)| u).collect();
    users.extend(services.analyses.list_all().into_iter().map(|(u, _)| u));

    let items = users
        .into_iter()
        .map(|user_id| {
            let profile = services.profiles.get(user_id, &user_id);
            let history = services.analyses_for(user_id);
            let last_condition = history
                .first()
                .map(|a| a.condition.display_name())
                .unwrap_or(NO_ANALYSIS_YET);

            serde_json::json!({
                "user_id": user_id.to_string(),
                "profile": profile,
                "analyses": history.len(),
                "last_condition": last_condition,
            })
        })
        .collect::<Vec<_>>();

    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}
