// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Event management endpoints (staff only)

use crate::services::{AttendanceService, EventService, ExportService};
use super::ApiJson;
use crate::state::AppState;
use crate::ServerResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use conf_rest_api_contract::*;

/// Create an event
#[utoipa::path(
    post,
    path = "/event/create",
    request_body = EventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid request", body = ProblemDetails),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not a staff account")
    ),
    security(("bearer" = []))
)]
pub async fn create_event(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EventRequest>,
) -> ServerResult<(StatusCode, Json<EventResponse>)> {
    let event = EventService::new(&state).create(&request)?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// List all events
#[utoipa::path(
    get,
    path = "/event/showevents",
    responses((status = 200, description = "All events", body = Vec<EventResponse>)),
    security(("bearer" = []))
)]
pub async fn list_events(State(state): State<AppState>) -> ServerResult<Json<Vec<EventResponse>>> {
    Ok(Json(EventService::new(&state).list()?))
}

#[utoipa::path(
    get,
    path = "/event/getevent/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "The event", body = EventResponse),
        (status = 404, description = "Event not found", body = ProblemDetails)
    ),
    security(("bearer" = []))
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServerResult<Json<EventResponse>> {
    Ok(Json(EventService::new(&state).get(id)?))
}

#[utoipa::path(
    put,
    path = "/event/updateevent/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Invalid request", body = ProblemDetails),
        (status = 404, description = "Event not found", body = ProblemDetails)
    ),
    security(("bearer" = []))
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<EventRequest>,
) -> ServerResult<Json<EventResponse>> {
    Ok(Json(EventService::new(&state).update(id, &request)?))
}

/// Delete an event together with its registrations and attendance marks
#[utoipa::path(
    delete,
    path = "/event/deleteevent/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = ProblemDetails)
    ),
    security(("bearer" = []))
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServerResult<StatusCode> {
    EventService::new(&state).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attendee roster with derived status and credit hours
#[utoipa::path(
    get,
    path = "/event/{id}/attendees",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Roster", body = Vec<EventAttendeeResponse>),
        (status = 404, description = "Event not found", body = ProblemDetails)
    ),
    security(("bearer" = []))
)]
pub async fn event_attendees(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServerResult<Json<Vec<EventAttendeeResponse>>> {
    Ok(Json(AttendanceService::new(&state).event_attendees(id)?))
}

/// Check out everyone still present at the event
#[utoipa::path(
    post,
    path = "/event/{id}/checkoutall",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Checkout summary", body = BulkCheckoutResponse),
        (status = 404, description = "Event not found", body = ProblemDetails)
    ),
    security(("bearer" = []))
)]
pub async fn checkout_all(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServerResult<Json<BulkCheckoutResponse>> {
    Ok(Json(AttendanceService::new(&state).bulk_checkout(id)?))
}

#[utoipa::path(
    get,
    path = "/event/{id}/export/attendees",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "CSV export", body = AttendeeExportResponse),
        (status = 404, description = "Event not found", body = ProblemDetails)
    ),
    security(("bearer" = []))
)]
pub async fn export_attendees(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServerResult<Json<AttendeeExportResponse>> {
    Ok(Json(ExportService::new(&state).export_attendees(id)?))
}
