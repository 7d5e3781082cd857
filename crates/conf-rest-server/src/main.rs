// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Conference attendance REST API server binary

use clap::Parser;
use conf_logging::{CliLogLevel, CliLoggingArgs};
use conf_rest_server::{Server, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bind address for the server
    #[arg(short, long, env = "CONF_BIND")]
    bind: Option<SocketAddr>,

    /// Database path (SQLite), or `:memory:`
    #[arg(short, long, env = "CONF_DATABASE")]
    database: Option<String>,

    /// Allow requests from any origin
    #[arg(long)]
    cors: bool,

    /// TOML configuration file to load before applying flags
    #[arg(long, env = "CONF_CONFIG")]
    config: Option<PathBuf>,

    /// Secret for signing tokens; generated at startup when omitted
    #[arg(long, env = "CONF_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Code that staff registrations must present
    #[arg(long, env = "CONF_ADMIN_INVITE_CODE", hide_env_values = true)]
    admin_invite_code: Option<String>,

    /// Lifetime of issued tokens in seconds
    #[arg(long, env = "CONF_TOKEN_TTL_SECS")]
    token_ttl_secs: Option<u64>,

    #[command(flatten)]
    logging: CliLoggingArgs,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(database) = self.database {
            config.database_path = database;
        }
        if self.cors {
            config.enable_cors = true;
        }
        if self.jwt_secret.is_some() {
            config.jwt_secret = self.jwt_secret;
        }
        if self.admin_invite_code.is_some() {
            config.admin_invite_code = self.admin_invite_code;
        }
        if let Some(ttl) = self.token_ttl_secs {
            config.token_ttl_secs = ttl;
        }
        Ok(config)
    }
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

/// Resolve once `signal` fires; never resolve when it cannot be listened for
async fn wait_for_signal<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
        Err(err) => {
            tracing::error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    args.logging.init("conf-rest-server", CliLogLevel::Info)?;

    tracing::info!("Starting conference attendance REST API server");

    let config = args.into_config()?;
    tracing::info!(
        bind = %config.bind_addr,
        database = %config.database_path,
        cors = config.enable_cors,
        invite_required = config.admin_invite_code.is_some(),
        jwt_secret = ?config.jwt_secret.as_ref().map(conf_logging::redact),
        "Loaded configuration"
    );

    // Create and start server
    let server = Server::new(config).await?;
    server.run_with_shutdown(shutdown_signal()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_listener_failure_keeps_serving() {
        let failed = async { Err(std::io::Error::other("no signal handler")) };
        let waited = tokio::time::timeout(Duration::from_millis(50), wait_for_signal(failed)).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn signal_triggers_shutdown() {
        let waited = tokio::time::timeout(Duration::from_millis(50), wait_for_signal(async { Ok(()) })).await;
        assert!(waited.is_ok());
    }
}
