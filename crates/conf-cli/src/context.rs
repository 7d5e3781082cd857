// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-invocation settings shared by all commands

use chrono::Utc;
use conf_domain_types::Role;
use conf_rest_client::{AuthConfig, AuthState, RestClient};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone)]
pub struct Context {
    pub server: Url,
    pub session_path: PathBuf,
    pub json: bool,
}

impl Context {
    /// Client without credentials, for sign-in and registration
    pub fn anonymous_client(&self) -> anyhow::Result<RestClient> {
        Ok(RestClient::new(self.server.clone(), AuthConfig::default())?)
    }

    /// Client for the stored session, which must belong to a `role` account.
    ///
    /// Fails before any request is made when the session is missing,
    /// expired or of the other role.
    pub fn client_for(&self, role: Role) -> anyhow::Result<RestClient> {
        let state = AuthState::restore(&self.session_path, Utc::now())?;
        let session = state.ensure_role(role)?;
        Ok(RestClient::new(
            self.server.clone(),
            AuthConfig::bearer(session.token.clone()),
        )?)
    }
}
