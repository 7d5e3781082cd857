// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Account registration and sign-in endpoints

use crate::services::AuthService;
use super::{blocking, ApiJson};
use crate::state::AppState;
use crate::ServerResult;
use axum::{extract::State, http::StatusCode, Json};
use conf_rest_api_contract::*;

/// Register an attendee account
#[utoipa::path(
    post,
    path = "/auth/api/users/register",
    request_body = UserRegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ProblemDetails),
        (status = 409, description = "Email already registered", body = ProblemDetails)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UserRegisterRequest>,
) -> ServerResult<(StatusCode, Json<UserResponse>)> {
    let user = blocking(move || AuthService::new(&state).register_user(&request)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Register a staff account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = AdminRegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AdminResponse),
        (status = 400, description = "Invalid request", body = ProblemDetails),
        (status = 403, description = "Invalid validation code", body = ProblemDetails),
        (status = 409, description = "Email already registered", body = ProblemDetails)
    )
)]
pub async fn register_admin(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AdminRegisterRequest>,
) -> ServerResult<(StatusCode, Json<AdminResponse>)> {
    let admin = blocking(move || AuthService::new(&state).register_admin(&request)).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

/// Sign in and receive a bearer token
#[utoipa::path(
    post,
    path = "/auth/signin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = ProblemDetails)
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ServerResult<Json<LoginResponse>> {
    let login = blocking(move || AuthService::new(&state).login(&request)).await?;
    Ok(Json(login))
}
