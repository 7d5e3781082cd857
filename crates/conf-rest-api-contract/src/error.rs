// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for API contract validation and parsing

use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during API contract validation and parsing
#[derive(Debug, Error)]
pub enum ApiContractError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] conf_domain_types::DomainError),
}

/// Problem+JSON error response format as per RFC 7807
///
/// `message` repeats `detail` for clients that only look at that field.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub detail: String,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub errors: HashMap<String, Vec<String>>,
}

impl ProblemDetails {
    pub fn new(
        problem_type: impl Into<String>,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
    ) -> Self {
        let detail = detail.into();
        Self {
            problem_type: problem_type.into(),
            title: title.into(),
            status: Some(status),
            message: detail.clone(),
            detail,
            errors: HashMap::new(),
        }
    }

    pub fn with_errors(mut self, errors: HashMap<String, Vec<String>>) -> Self {
        self.errors = errors;
        self
    }

    /// Most specific human readable message carried by the problem
    pub fn display_message(&self) -> &str {
        if !self.detail.is_empty() {
            &self.detail
        } else if !self.message.is_empty() {
            &self.message
        } else {
            &self.title
        }
    }
}
