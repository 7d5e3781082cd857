// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! QR scan endpoint

use crate::auth::Claims;
use crate::services::AttendanceService;
use super::ApiJson;
use crate::state::AppState;
use crate::ServerResult;
use axum::{extract::State, Extension, Json};
use conf_rest_api_contract::*;

/// Record an attendance mark for a scanned code
#[utoipa::path(
    post,
    path = "/scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Mark recorded or replayed", body = ScanResponse),
        (status = 400, description = "Malformed payload or action", body = ProblemDetails),
        (status = 404, description = "Invalid code", body = ProblemDetails)
    ),
    security(("bearer" = []))
)]
pub async fn scan(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<ScanRequest>,
) -> ServerResult<Json<ScanResponse>> {
    Ok(Json(AttendanceService::new(&state).handle_scan(&request, &claims.sub)?))
}
