// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! command-line flags and environment variables (applied by the binary).

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default lifetime of issued tokens
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,

    /// Path to SQLite database, or `:memory:`
    pub database_path: String,

    /// Allow any origin instead of `cors_origins`
    pub enable_cors: bool,

    /// Origins allowed when `enable_cors` is off
    pub cors_origins: Vec<String>,

    /// HS256 secret for issued tokens; generated at startup when absent
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens in seconds
    pub token_ttl_secs: u64,

    /// When set, staff registration must present this code
    pub admin_invite_code: Option<String>,

    /// Minimum edge length of rendered QR codes in pixels
    pub qr_size: u32,

    /// Configuration file the settings were read from
    pub config_file: Option<PathBuf>,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_path: ":memory:".to_string(),
            enable_cors: false,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            jwt_secret: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            admin_invite_code: None,
            qr_size: 250,
            config_file: None,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with the contents of a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config file {}: {e}", path.display()))?;
        let file: FileConfig = toml::from_str(&text)
            .map_err(|e| anyhow::anyhow!("invalid config file {}: {e}", path.display()))?;

        let mut config = Self::default();
        config.apply_file(file);
        config.config_file = Some(path.to_path_buf());
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(bind) = file.bind {
            self.bind_addr = bind;
        }
        if let Some(database) = file.database {
            self.database_path = database;
        }
        if let Some(cors) = file.cors {
            self.enable_cors = cors;
        }
        if let Some(origins) = file.cors_origins {
            self.cors_origins = origins;
        }
        if file.jwt_secret.is_some() {
            self.jwt_secret = file.jwt_secret;
        }
        if let Some(ttl) = file.token_ttl_secs {
            self.token_ttl_secs = ttl;
        }
        if file.admin_invite_code.is_some() {
            self.admin_invite_code = file.admin_invite_code;
        }
        if let Some(size) = file.qr_size {
            self.qr_size = size;
        }
        if let Some(rate_limit) = file.rate_limit {
            if let Some(rpm) = rate_limit.requests_per_minute {
                self.rate_limit.requests_per_minute = rpm;
            }
            if let Some(enabled) = rate_limit.enabled {
                self.rate_limit.enabled = enabled;
            }
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Requests per minute per client
    pub requests_per_minute: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 120,
        }
    }
}

/// On-disk representation; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileConfig {
    bind: Option<SocketAddr>,
    database: Option<String>,
    cors: Option<bool>,
    cors_origins: Option<Vec<String>>,
    jwt_secret: Option<String>,
    token_ttl_secs: Option<u64>,
    admin_invite_code: Option<String>,
    qr_size: Option<u32>,
    rate_limit: Option<FileRateLimit>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileRateLimit {
    enabled: Option<bool>,
    requests_per_minute: Option<u64>,
}
