// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Request handlers

pub mod admin;
pub mod attendee;
pub mod auth;
pub mod events;
pub mod health;
pub mod openapi;
pub mod scan;

use crate::error::{ServerError, ServerResult};
use axum::extract::{rejection::JsonRejection, FromRequest};

/// JSON body extractor whose rejections are problem documents
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

/// Run synchronous service work (Argon2, SQLite) on the blocking pool
pub(crate) async fn blocking<T, F>(work: F) -> ServerResult<T>
where
    F: FnOnce() -> ServerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ServerError::Internal(format!("Blocking task failed: {err}")))?
}
