// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server state management

use crate::auth::TokenKeys;
use crate::config::ServerConfig;
use crate::dependencies::Clock;
use chrono::{DateTime, Utc};
use conf_local_db::Database;
use std::sync::Arc;

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: Arc<Database>,

    /// Server configuration
    pub config: ServerConfig,

    /// Token signing and verification keys
    pub keys: Arc<TokenKeys>,

    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Get database reference
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Get configuration reference
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
