// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Client error types

use conf_rest_api_contract::ProblemDetails;
use reqwest::StatusCode;

pub type RestClientResult<T> = Result<T, RestClientError>;

#[derive(Debug, thiserror::Error)]
pub enum RestClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a Problem+JSON body
    #[error("Server error ({status}): {}", details.display_message())]
    Server {
        status: StatusCode,
        details: ProblemDetails,
    },

    /// Missing, invalid or expired token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Local session problems: not signed in, wrong role
    #[error("{0}")]
    Auth(String),

    #[error("Invalid QR payload: {0}")]
    InvalidPayload(#[from] conf_domain_types::DomainError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RestClientError {
    /// HTTP status reported by the server, when there was a response
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RestClientError::Server { status, .. } => Some(*status),
            RestClientError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            RestClientError::Http(err) => err.status(),
            _ => None,
        }
    }
}
