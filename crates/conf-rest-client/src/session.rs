// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Persisted sign-in state
//!
//! The token is stored as issued together with its role. Expiry is read from
//! the token payload without verifying the signature; the server remains the
//! authority and answers 401 for anything it no longer accepts.

use crate::error::{RestClientError, RestClientResult};
use base64::Engine;
use chrono::{DateTime, Utc};
use conf_domain_types::Role;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "conference-attendance";
const SESSION_FILE: &str = "session.json";

/// Token and role saved after a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub role: Role,
}

impl StoredSession {
    pub fn new(token: impl Into<String>, role: Role) -> Self {
        Self {
            token: token.into(),
            role,
        }
    }

    pub fn save(&self, path: &Path) -> RestClientResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;

        // Restrict permissions to owner read/write
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut permissions = std::fs::metadata(path)?.permissions();
            permissions.set_mode(0o600);
            std::fs::set_permissions(path, permissions)?;
        }

        Ok(())
    }

    /// `None` when nothing has been saved
    pub fn load(path: &Path) -> RestClientResult<Option<Self>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn clear(path: &Path) -> RestClientResult<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        token_expiry(&self.token)
    }

    /// Tokens without a readable expiry count as expired
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map_or(true, |exp| exp <= now)
    }
}

/// `exp` claim of a JWT, decoded without verification
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    #[derive(Deserialize)]
    struct Payload {
        exp: i64,
    }

    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let payload: Payload = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(payload.exp, 0)
}

/// Default session location under the platform config directory
pub fn default_session_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join(SESSION_FILE)
}

/// Sign-in state restored at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated(StoredSession),
}

impl AuthState {
    /// Load the saved session, discarding it when the token has expired
    pub fn restore(path: &Path, now: DateTime<Utc>) -> RestClientResult<Self> {
        match StoredSession::load(path)? {
            Some(session) if session.is_expired(now) => {
                tracing::info!(path = %path.display(), "Stored session expired; clearing it");
                StoredSession::clear(path)?;
                Ok(AuthState::Anonymous)
            }
            Some(session) => Ok(AuthState::Authenticated(session)),
            None => Ok(AuthState::Anonymous),
        }
    }

    pub fn session(&self) -> Option<&StoredSession> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            AuthState::Anonymous => None,
        }
    }

    /// The session, provided it belongs to an account of `expected` role
    pub fn ensure_role(&self, expected: Role) -> RestClientResult<&StoredSession> {
        let session = self
            .session()
            .ok_or_else(|| RestClientError::Auth("Not logged in. Run `confctl login` first.".to_string()))?;
        ensure_role(session.role, expected)?;
        Ok(session)
    }
}

/// Fail unless `actual` is `expected`
pub fn ensure_role(actual: Role, expected: Role) -> RestClientResult<()> {
    if actual != expected {
        return Err(RestClientError::Auth(format!(
            "Access denied. This account is not an {}.",
            expected.noun()
        )));
    }
    Ok(())
}
