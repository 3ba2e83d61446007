use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;

use aurora_appointments::{Appointment, BookAppointment};
use aurora_core::{AppointmentId, DomainError, DomainResult};
use aurora_infra::store::UserStore;

use crate::app::{dto, errors, services::AppServices};
use crate::authz::{self, APPOINTMENTS_BOOK, APPOINTMENTS_MANAGE};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(book_appointment).get(list_appointments))
        .route("/:id/cancel", post(cancel_appointment))
        .route("/:id/confirm", post(confirm_appointment))
        .route("/:id/complete", post(complete_appointment))
}

pub async fn book_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::BookAppointmentRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, APPOINTMENTS_BOOK) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let user_id = principal.user_id();
    let cmd = BookAppointment {
        user_id,
        appointment_date: body.appointment_date,
        message: body.message,
    };

    match Appointment::book(AppointmentId::new(), cmd, Utc::now()) {
        Ok(appt) => {
            services.appointments.upsert(user_id, appt.id(), appt.clone());
            tracing::info!(appointment_id = %appt.id(), user_id = %user_id, "appointment booked");
            (StatusCode::CREATED, Json(appt)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /appointments - own appointments; admins see everyone's.
pub async fn list_appointments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let mut items: Vec<Appointment> = if authz::require(&principal, APPOINTMENTS_MANAGE).is_ok() {
        services.appointments.list_all().into_iter().map(|(_, a)| a).collect()
    } else {
        if let Err(e) = authz::require(&principal, APPOINTMENTS_BOOK) {
            return errors::forbidden(e);
        }
        services.appointments.list(principal.user_id())
    };
    items.sort_by(|a, b| a.appointment_date().cmp(&b.appointment_date()).then(a.id().cmp(&b.id())));

    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn cancel_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    // Owners may cancel their own; managers may cancel any.
    let is_manager = authz::require(&principal, APPOINTMENTS_MANAGE).is_ok();
    if !is_manager {
        if let Err(e) = authz::require(&principal, APPOINTMENTS_BOOK) {
            return errors::forbidden(e);
        }
    }
    transition(&services, &principal, &id, is_manager, |appt| appt.cancel())
}

pub async fn confirm_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Option<Json<dto::ConfirmAppointmentRequest>>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, APPOINTMENTS_MANAGE) {
        return errors::forbidden(e);
    }
    let dermatologist = body.and_then(|Json(b)| b.assigned_dermatologist);
    transition(&services, &principal, &id, true, move |appt| appt.confirm(dermatologist))
}

pub async fn complete_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, APPOINTMENTS_MANAGE) {
        return errors::forbidden(e);
    }
    transition(&services, &principal, &id, true, |appt| appt.complete())
}

fn transition(
    services: &AppServices,
    principal: &PrincipalContext,
    raw_id: &str,
    any_owner: bool,
    apply: impl FnOnce(&mut Appointment) -> DomainResult<()>,
) -> axum::response::Response {
    let id: AppointmentId = match raw_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("appointment"),
    };

    // Foreign appointments look missing to non-managers.
    let caller = principal.user_id();
    let mut apply = Some(apply);
    let updated = services.appointments.update(&id, &mut |owner, appt| {
        if !any_owner && owner != caller {
            return Err(DomainError::NotFound);
        }
        match apply.take() {
            Some(f) => f(appt),
            None => Err(DomainError::conflict("appointment update already applied")),
        }
    });

    let appt = match updated {
        Ok((_owner, appt)) => appt,
        Err(DomainError::NotFound) => return errors::not_found("appointment"),
        Err(e) => return errors::domain_error_to_response(e),
    };

    tracing::info!(appointment_id = %id, status = %appt.status(), "appointment updated");
    (StatusCode::OK, Json(appt)).into_response()
}
