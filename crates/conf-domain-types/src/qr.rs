// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Text encoded in registration QR codes

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

const REG_TAG: &str = "REG";
const EVENT_TAG: &str = "EVENT";
const USER_TAG: &str = "USER";

/// Payload rendered into a registration's QR code:
/// `REG:{code}:EVENT:{event_id}:USER:{user_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub code: String,
    pub event_id: i64,
    pub user_id: i64,
}

impl QrPayload {
    pub fn new(code: impl Into<String>, event_id: i64, user_id: i64) -> Self {
        Self {
            code: code.into(),
            event_id,
            user_id,
        }
    }

    /// Registration code carried by scanned text.
    ///
    /// Scanners may deliver either the full tagged payload or a bare
    /// registration code (older tickets encoded only the code).
    pub fn extract_code(text: &str) -> Result<String, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::InvalidQrPayload("empty payload".to_string()));
        }
        if text.starts_with(&format!("{REG_TAG}:")) {
            return Ok(text.parse::<QrPayload>()?.code);
        }
        if text.contains(':') || text.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidQrPayload(text.to_string()));
        }
        Ok(text.to_string())
    }
}

impl std::fmt::Display for QrPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{REG_TAG}:{}:{EVENT_TAG}:{}:{USER_TAG}:{}",
            self.code, self.event_id, self.user_id
        )
    }
}

impl std::str::FromStr for QrPayload {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidQrPayload(s.to_string());
        let parts: Vec<&str> = s.trim().split(':').collect();

        match parts.as_slice() {
            [REG_TAG, code, EVENT_TAG, event_id, USER_TAG, user_id] if !code.is_empty() => {
                Ok(QrPayload {
                    code: (*code).to_string(),
                    event_id: event_id.parse().map_err(|_| invalid())?,
                    user_id: user_id.parse().map_err(|_| invalid())?,
                })
            }
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_tagged_payload() {
        let payload = QrPayload::new("abc123", 7, 42);
        assert_eq!(payload.to_string(), "REG:abc123:EVENT:7:USER:42");
        assert_eq!("REG:abc123:EVENT:7:USER:42".parse::<QrPayload>().unwrap(), payload);
    }

    #[test]
    fn extracts_code_from_tagged_or_bare_text() {
        assert_eq!(
            QrPayload::extract_code("REG:deadbeef:EVENT:1:USER:2\n").unwrap(),
            "deadbeef"
        );
        assert_eq!(QrPayload::extract_code("  deadbeef ").unwrap(), "deadbeef");
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(QrPayload::extract_code("").is_err());
        assert!(QrPayload::extract_code("REG:abc:EVENT:x:USER:2").is_err());
        assert!(QrPayload::extract_code("REG::EVENT:1:USER:2").is_err());
        assert!(QrPayload::extract_code("REG:abc:EVENT:1").is_err());
        assert!(QrPayload::extract_code("https://example.com/ticket").is_err());
    }
}
