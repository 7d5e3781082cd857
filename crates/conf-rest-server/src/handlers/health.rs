// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Health check endpoints

use crate::state::AppState;
use crate::ServerResult;
use axum::{extract::State, Json};
use conf_rest_api_contract::{HealthResponse, VersionResponse};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Server is up", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> ServerResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: state.now().to_rfc3339(),
    }))
}

/// Readiness check endpoint; fails while the database is unusable
#[utoipa::path(
    get,
    path = "/readyz",
    responses(
        (status = 200, description = "Server can serve requests", body = HealthResponse),
        (status = 500, description = "Database unavailable")
    )
)]
pub async fn readiness_check(State(state): State<AppState>) -> ServerResult<Json<HealthResponse>> {
    state.db().count_events()?;
    Ok(Json(HealthResponse {
        status: "ready".to_string(),
        timestamp: state.now().to_rfc3339(),
    }))
}

/// Version endpoint
#[utoipa::path(
    get,
    path = "/version",
    responses((status = 200, description = "Server version", body = VersionResponse))
)]
pub async fn version() -> ServerResult<Json<VersionResponse>> {
    Ok(Json(VersionResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
