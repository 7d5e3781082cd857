// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server error types and handling

use conf_rest_api_contract::{validation::field_errors, ApiContractError, ProblemDetails};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

const PROBLEM_BASE: &str = "https://docs.conference-attendance.dev/errors";

/// Server result type
pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] conf_local_db::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Rate limited")]
    RateLimited,
}

impl ServerError {
    /// Convert error to Problem+JSON response
    pub fn to_problem(&self) -> ProblemDetails {
        match self {
            ServerError::Database(conf_local_db::Error::Conflict(msg)) | ServerError::Conflict(msg) => {
                problem("conflict", "Conflict", StatusCode::CONFLICT, msg.clone())
            }
            ServerError::Database(conf_local_db::Error::NotFound(what)) => problem(
                "not-found",
                "Not Found",
                StatusCode::NOT_FOUND,
                format!("{what} not found"),
            ),
            ServerError::Database(err) => problem(
                "database",
                "Database Error",
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database operation failed: {err}"),
            ),
            ServerError::Auth(msg) => problem(
                "auth",
                "Authentication Failed",
                StatusCode::UNAUTHORIZED,
                msg.clone(),
            ),
            ServerError::Authorization(msg) => problem(
                "authz",
                "Authorization Failed",
                StatusCode::FORBIDDEN,
                msg.clone(),
            ),
            ServerError::Validation(err) => problem(
                "validation",
                "Validation Error",
                StatusCode::BAD_REQUEST,
                "Request validation failed",
            )
            .with_errors(field_errors(err)),
            ServerError::NotFound(msg) => {
                problem("not-found", "Not Found", StatusCode::NOT_FOUND, msg.clone())
            }
            ServerError::BadRequest(msg) => problem(
                "bad-request",
                "Bad Request",
                StatusCode::BAD_REQUEST,
                msg.clone(),
            ),
            ServerError::Internal(msg) => problem(
                "internal",
                "Internal Server Error",
                StatusCode::INTERNAL_SERVER_ERROR,
                msg.clone(),
            ),
            ServerError::RateLimited => problem(
                "rate-limited",
                "Rate Limited",
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests",
            ),
        }
    }
}

fn problem(kind: &str, title: &str, status: StatusCode, detail: impl Into<String>) -> ProblemDetails {
    ProblemDetails::new(format!("{PROBLEM_BASE}/{kind}"), title, status.as_u16(), detail)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let problem = self.to_problem();
        let status = StatusCode::from_u16(problem.status.unwrap_or(500))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/problem+json")],
            Json(problem),
        )
            .into_response()
    }
}

/// Convert any error to ServerError
impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl From<ApiContractError> for ServerError {
    fn from(err: ApiContractError) -> Self {
        match err {
            ApiContractError::Validation(errors) => ServerError::Validation(errors),
            other => ServerError::BadRequest(other.to_string()),
        }
    }
}

impl From<conf_domain_types::DomainError> for ServerError {
    fn from(err: conf_domain_types::DomainError) -> Self {
        ServerError::BadRequest(err.to_string())
    }
}

/// Convert IO errors
impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_from_database_maps_to_409() {
        let err = ServerError::from(conf_local_db::Error::Conflict("email taken".to_string()));
        let problem = err.to_problem();
        assert_eq!(problem.status, Some(409));
        assert_eq!(problem.detail, "email taken");
        assert_eq!(problem.message, "email taken");
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (ServerError::Auth("x".into()), 401),
            (ServerError::Authorization("x".into()), 403),
            (ServerError::NotFound("x".into()), 404),
            (ServerError::BadRequest("x".into()), 400),
            (ServerError::RateLimited, 429),
            (ServerError::Internal("x".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.to_problem().status, Some(status), "{err}");
        }
    }

    #[test]
    fn domain_errors_are_bad_requests() {
        let err: ServerError = conf_domain_types::DomainError::InvalidAction("FLY".into()).into();
        let problem = err.to_problem();
        assert_eq!(problem.status, Some(400));
        assert_eq!(problem.detail, "Invalid action: FLY");
    }
}
