// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! OpenAPI specification endpoint

use crate::handlers;
use crate::ServerResult;
use axum::response::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(title = "Conference Attendance REST API"),
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::health::version,
        handlers::auth::register_user,
        handlers::auth::register_admin,
        handlers::auth::signin,
        handlers::events::create_event,
        handlers::events::list_events,
        handlers::events::get_event,
        handlers::events::update_event,
        handlers::events::delete_event,
        handlers::events::event_attendees,
        handlers::events::checkout_all,
        handlers::events::export_attendees,
        handlers::admin::dashboard_stats,
        handlers::scan::scan,
        handlers::attendee::list_events,
        handlers::attendee::register_for_event,
        handlers::attendee::my_registrations,
        handlers::attendee::registration_qr,
        handlers::attendee::dashboard_stats,
    ),
    modifiers(&BearerAuth)
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Full API description: handler paths plus the contract schemas
pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.merge(conf_rest_api_contract::openapi_schema());
    doc
}

/// OpenAPI specification endpoint
pub async fn openapi_spec() -> ServerResult<Json<utoipa::openapi::OpenApi>> {
    Ok(Json(api_doc()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_schemas() {
        let doc = api_doc();
        assert!(doc.paths.paths.contains_key("/scan"));
        assert!(doc.paths.paths.contains_key("/event/{id}/checkoutall"));

        let components = doc.components.expect("components");
        assert!(components.schemas.contains_key("ScanResponse"));
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
