// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Custom middleware

use crate::config::RateLimitConfig;
use crate::error::ServerError;
use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(60);

/// Requests seen per client inside the current window
struct Windows {
    requests: HashMap<String, Vec<Instant>>,
    last_sweep: Instant,
}

/// Rate limiting state
#[derive(Clone)]
pub struct RateLimitState {
    windows: Arc<Mutex<Windows>>,
    config: RateLimitConfig,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(Mutex::new(Windows {
                requests: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            config,
        }
    }

    /// Record a request from `key`; `false` when the client is over its limit
    pub async fn check_rate_limit(&self, key: &str) -> bool {
        self.check_rate_limit_at(key, Instant::now()).await
    }

    async fn check_rate_limit_at(&self, key: &str, now: Instant) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut windows = self.windows.lock().await;

        // Forget clients whose newest request has left the window
        if now.saturating_duration_since(windows.last_sweep) >= WINDOW {
            windows.requests.retain(|_, times| {
                times
                    .last()
                    .is_some_and(|&time| now.saturating_duration_since(time) < WINDOW)
            });
            windows.last_sweep = now;
        }

        let client_requests = windows.requests.entry(key.to_string()).or_default();
        client_requests.retain(|&time| now.saturating_duration_since(time) < WINDOW);

        let allowed = client_requests.len() < self.config.requests_per_minute as usize;
        if allowed {
            client_requests.push(now);
        } else if client_requests.is_empty() {
            windows.requests.remove(key);
        }
        allowed
    }

    #[cfg(test)]
    async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.requests.len()
    }
}

/// Client key: first `x-forwarded-for` hop, else the peer address
fn client_key(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Sliding-window rate limiting middleware
pub async fn rate_limit_middleware(state: Arc<RateLimitState>, req: Request, next: Next) -> Response {
    let client = client_key(&req);

    if state.check_rate_limit(&client).await {
        next.run(req).await
    } else {
        tracing::warn!(client = %client, "Rate limit exceeded");
        ServerError::RateLimited.into_response()
    }
}
