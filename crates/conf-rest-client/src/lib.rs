// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! REST client for the conference attendance service
//!
//! Provides typed access to every endpoint, the persisted sign-in session,
//! scanner helpers (debouncing, idempotency keys) and roster polling.

pub mod auth;
pub mod client;
pub mod error;
pub mod poll;
pub mod scan;
pub mod session;

pub use auth::AuthConfig;
pub use client::RestClient;
pub use error::{RestClientError, RestClientResult};
pub use poll::{poll_attendees, DEFAULT_POLL_INTERVAL};
pub use scan::{new_idempotency_key, ScanDebouncer, ScanOutcome, Scanner, DEFAULT_DEBOUNCE};
pub use session::{default_session_path, token_expiry, AuthState, StoredSession};
