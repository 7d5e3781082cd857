// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::services::DashboardService;
use crate::state::AppState;
use crate::ServerResult;
use axum::{extract::State, Json};
use conf_rest_api_contract::DashboardStatsResponse;

/// Global counts for the staff dashboard
#[utoipa::path(
    get,
    path = "/admin/dashboard/stats",
    responses((status = 200, description = "Counts", body = DashboardStatsResponse)),
    security(("bearer" = []))
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
) -> ServerResult<Json<DashboardStatsResponse>> {
    Ok(Json(DashboardService::new(&state).admin_stats()?))
}
