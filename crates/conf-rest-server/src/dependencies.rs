// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Dependency wiring for the REST server

use crate::{auth::TokenKeys, config::ServerConfig, state::AppState};
use anyhow::Result;
use chrono::{DateTime, Utc};
use conf_local_db::Database;
use rand::RngCore;
use std::sync::{Arc, Mutex};

/// Source of the current time, injectable so tests can pin scan timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = at;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Default dependency builder: SQLite storage, HS256 tokens, system clock
pub struct DefaultServerDependencies {
    state: AppState,
}

impl DefaultServerDependencies {
    pub async fn new(config: ServerConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    /// Build dependencies around a caller-supplied clock
    pub async fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let db = if config.database_path == ":memory:" {
            Arc::new(Database::open_in_memory()?)
        } else {
            Arc::new(Database::open(&config.database_path)?)
        };

        let secret = match &config.jwt_secret {
            Some(secret) if !secret.is_empty() => secret.clone(),
            _ => {
                tracing::warn!(
                    "No JWT secret configured; generated an ephemeral one. \
                     Issued tokens will not survive a restart."
                );
                generate_secret()
            }
        };
        let keys = Arc::new(TokenKeys::new(secret.as_bytes(), config.token_ttl_secs));

        let state = AppState {
            db,
            config,
            keys,
            clock,
        };

        Ok(Self { state })
    }

    /// Consume the dependency builder and return the resulting app state
    pub fn into_state(self) -> AppState {
        self.state
    }
}

fn generate_secret() -> String {
    use base64::Engine;

    let mut bytes = [0u8; 48];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::STANDARD_NO_PAD.encode(bytes)
}
