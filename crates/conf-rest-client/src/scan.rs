// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Scanner-side processing of decoded QR text

use crate::client::RestClient;
use crate::error::RestClientResult;
use conf_domain_types::QrPayload;
use conf_rest_api_contract::{ScanRequest, ScanResponse};
use rand::Rng;
use std::time::{Duration, Instant};

/// Window in which a repeated payload is ignored
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(3);

const KEY_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Drops the same payload when it is read again within `window`.
///
/// Readers report a code several times per second while it stays in view.
#[derive(Debug, Clone)]
pub struct ScanDebouncer {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl Default for ScanDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl ScanDebouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether `payload` read at `at` should be sent to the server
    pub fn should_process(&mut self, payload: &str, at: Instant) -> bool {
        if let Some((last_payload, last_at)) = &self.last {
            if last_payload == payload && at.saturating_duration_since(*last_at) < self.window {
                return false;
            }
        }
        self.last = Some((payload.to_string(), at));
        true
    }
}

/// Fresh idempotency key: `scan_{unix millis}_{9 base36 chars}`
pub fn new_idempotency_key() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..KEY_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("scan_{millis}_{suffix}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Recorded(ScanResponse),
    Debounced,
}

/// Debounces, validates and submits scanned payloads
#[derive(Debug)]
pub struct Scanner {
    client: RestClient,
    debouncer: ScanDebouncer,
    action: Option<String>,
}

impl Scanner {
    pub fn new(client: RestClient, debouncer: ScanDebouncer) -> Self {
        Self {
            client,
            debouncer,
            action: None,
        }
    }

    /// Force a mark (`CHECKIN`, `PAUSE`, `RESUME`, `CHECKOUT`) instead of toggling
    pub fn with_action(mut self, action: Option<String>) -> Self {
        self.action = action;
        self
    }

    /// Submit one decoded payload.
    ///
    /// Malformed payloads fail locally and never reach the server.
    pub async fn scan(&mut self, payload: &str) -> RestClientResult<ScanOutcome> {
        let payload = payload.trim();
        if !self.debouncer.should_process(payload, Instant::now()) {
            tracing::debug!(payload, "Ignoring repeated scan");
            return Ok(ScanOutcome::Debounced);
        }

        QrPayload::extract_code(payload)?;
        let request = ScanRequest {
            code: payload.to_string(),
            action: self.action.clone(),
            idempotency_key: Some(new_idempotency_key()),
        };
        let response = self.client.scan(&request).await?;
        tracing::info!(
            registration_id = response.registration_id,
            status = ?response.status,
            duplicate = response.duplicate,
            "Scan recorded"
        );
        Ok(ScanOutcome::Recorded(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::error::RestClientError;

    #[test]
    fn debouncer_suppresses_repeats_inside_window() {
        let start = Instant::now();
        let mut debouncer = ScanDebouncer::default();

        assert!(debouncer.should_process("REG:a:EVENT:1:USER:2", start));
        assert!(!debouncer.should_process("REG:a:EVENT:1:USER:2", start + Duration::from_secs(2)));
        assert!(debouncer.should_process("REG:b:EVENT:1:USER:3", start + Duration::from_secs(2)));
        assert!(debouncer.should_process("REG:a:EVENT:1:USER:2", start + Duration::from_secs(2)));
        assert!(debouncer.should_process("REG:a:EVENT:1:USER:2", start + Duration::from_secs(6)));
    }

    #[test]
    fn idempotency_key_shape() {
        let key = new_idempotency_key();
        let parts: Vec<&str> = key.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "scan");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), KEY_SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
        assert_ne!(key, new_idempotency_key());
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected_locally() {
        // Nothing listens here; reaching the network would be an Http error
        let client = RestClient::from_url("http://127.0.0.1:9", AuthConfig::default()).unwrap();
        let mut scanner = Scanner::new(client, ScanDebouncer::default());

        let err = scanner.scan("REG:only:two").await.unwrap_err();
        assert!(matches!(err, RestClientError::InvalidPayload(_)));

        assert_eq!(scanner.scan("REG:only:two").await.unwrap(), ScanOutcome::Debounced);
    }
}
