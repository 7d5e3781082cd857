// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Attendee endpoints

use crate::auth::Claims;
use crate::services::{AuthService, DashboardService, EventService, RegistrationService};
use crate::state::AppState;
use crate::ServerResult;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use conf_rest_api_contract::*;

/// Browse events
#[utoipa::path(
    get,
    path = "/attendee/events",
    responses((status = 200, description = "All events", body = Vec<EventResponse>)),
    security(("bearer" = []))
)]
pub async fn list_events(State(state): State<AppState>) -> ServerResult<Json<Vec<EventResponse>>> {
    Ok(Json(EventService::new(&state).list()?))
}

/// Register the caller for an event
#[utoipa::path(
    post,
    path = "/attendee/events/{id}/register",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 201, description = "Registered", body = RegistrationResponse),
        (status = 404, description = "Event not found", body = ProblemDetails),
        (status = 409, description = "Already registered", body = ProblemDetails)
    ),
    security(("bearer" = []))
)]
pub async fn register_for_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(event_id): Path<i64>,
) -> ServerResult<(StatusCode, Json<RegistrationResponse>)> {
    let user = AuthService::new(&state).current_user(&claims)?;
    let registration = RegistrationService::new(&state).register(user.id, event_id)?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// The caller's registrations with their QR codes
#[utoipa::path(
    get,
    path = "/attendee/registrations",
    responses((status = 200, description = "Registrations", body = Vec<RegistrationResponse>)),
    security(("bearer" = []))
)]
pub async fn my_registrations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ServerResult<Json<Vec<RegistrationResponse>>> {
    let user = AuthService::new(&state).current_user(&claims)?;
    Ok(Json(RegistrationService::new(&state).list_for_user(user.id)?))
}

/// QR code of one of the caller's registrations as PNG
#[utoipa::path(
    get,
    path = "/attendee/registrations/{id}/qr",
    params(("id" = i64, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "QR code", content_type = "image/png"),
        (status = 404, description = "No such registration for this account", body = ProblemDetails)
    ),
    security(("bearer" = []))
)]
pub async fn registration_qr(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> ServerResult<impl IntoResponse> {
    let user = AuthService::new(&state).current_user(&claims)?;
    let png = RegistrationService::new(&state).qr_png(user.id, id)?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"registration-{id}.png\""),
            ),
        ],
        png,
    ))
}

/// Personal dashboard
#[utoipa::path(
    get,
    path = "/attendee/dashboard/stats",
    responses((status = 200, description = "Statistics", body = AttendeeDashboardStatsResponse)),
    security(("bearer" = []))
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ServerResult<Json<AttendeeDashboardStatsResponse>> {
    let user = AuthService::new(&state).current_user(&claims)?;
    Ok(Json(DashboardService::new(&state).attendee_stats(user.id)?))
}
