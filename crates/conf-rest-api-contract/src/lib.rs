// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Conference attendance REST API contract types and validation
//!
//! These types are shared between the server, the REST client and the CLI.
//! Field names are camelCase on the wire so the existing web frontend keeps
//! working against the service unchanged.

pub mod error;
pub mod types;
pub mod validation;

pub use error::*;
pub use types::*;

/// Generate OpenAPI schema for the API contract types
#[cfg(feature = "utoipa")]
pub fn openapi_schema() -> utoipa::openapi::OpenApi {
    use conf_domain_types::{AttendanceEventType, AttendanceStatus, RegistrationStatus, Role};
    use utoipa::OpenApi;

    #[derive(OpenApi)]
    #[openapi(
        info(title = "Conference Attendance REST API"),
        paths(),
        components(schemas(
            Role,
            AttendanceEventType,
            AttendanceStatus,
            RegistrationStatus,
            UserRegisterRequest,
            UserResponse,
            AdminRegisterRequest,
            AdminResponse,
            LoginRequest,
            LoginResponse,
            EventRequest,
            EventResponse,
            RegistrationResponse,
            ScanRequest,
            ScanResponse,
            EventAttendeeResponse,
            BulkCheckoutResponse,
            AttendeeExportResponse,
            DashboardStatsResponse,
            RecentActivityResponse,
            AttendeeDashboardStatsResponse,
            HealthResponse,
            VersionResponse,
            ProblemDetails
        ))
    )]
    struct ApiDoc;
    ApiDoc::openapi()
}
