// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Business logic services
//!
//! Services are built per request from [`AppState`](crate::state::AppState)
//! and run synchronously against the database; handlers only translate
//! between HTTP and these calls.

pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod events;
pub mod export;
pub mod qr;
pub mod registration;

pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use events::EventService;
pub use export::ExportService;
pub use registration::RegistrationService;
