// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Errors raised while parsing domain values

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid QR payload: {0}")]
    InvalidQrPayload(String),
}
