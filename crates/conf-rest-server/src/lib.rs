// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Conference attendance REST API server
//!
//! Serves account registration and sign-in, event management, QR scanning
//! with idempotent retries, rosters, CSV exports and dashboards over an
//! SQLite database.

pub mod auth;
pub mod config;
pub mod dependencies;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::Server;
