// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Domain types for the conference attendance suite
//!
//! This crate contains the domain entities and rules that are shared across
//! the REST server, the local database, the REST client and the CLI.
//!
//! The attendance rules (scan toggling, active-time accounting, credit hours)
//! live here as pure functions so every component computes them the same way.

pub mod attendance;
pub mod error;
pub mod qr;
pub mod role;

// Re-export commonly used types
pub use attendance::*;
pub use error::DomainError;
pub use qr::QrPayload;
pub use role::Role;
