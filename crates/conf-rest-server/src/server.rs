// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Main server implementation

use crate::auth::{auth_middleware, require_admin, require_attendee};
use crate::config::ServerConfig;
use crate::dependencies::DefaultServerDependencies;
use crate::error::{ServerError, ServerResult};
use crate::handlers;
use crate::middleware::{rate_limit_middleware, RateLimitState};
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

/// REST API server
pub struct Server {
    config: ServerConfig,
    app: Router,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let state = DefaultServerDependencies::new(config.clone()).await?.into_state();
        Self::with_state(config, state).await
    }

    /// Construct a server from an already-built app state (used for custom dependencies)
    pub async fn with_state(config: ServerConfig, state: AppState) -> ServerResult<Self> {
        let app = Self::build_app(state, &config);
        Ok(Self { config, app })
    }

    fn cors_layer(config: &ServerConfig) -> CorsLayer {
        if config.enable_cors {
            return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
        }

        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
    }

    /// Build the Axum application with routes and middleware
    fn build_app(state: AppState, config: &ServerConfig) -> Router {
        // Build middleware stack
        let middleware_stack = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            // CORS wraps the limiter so rejected requests still carry CORS headers
            .layer(Self::cors_layer(config))
            .layer(CompressionLayer::new())
            .layer(from_fn({
                let rate_limit_state = Arc::new(RateLimitState::new(config.rate_limit.clone()));
                move |req, next| {
                    let state = Arc::clone(&rate_limit_state);
                    rate_limit_middleware(state, req, next)
                }
            }));

        let public_routes = Router::new()
            // Health and status endpoints
            .route("/healthz", get(handlers::health::health_check))
            .route("/readyz", get(handlers::health::readiness_check))
            .route("/version", get(handlers::health::version))
            .route("/openapi.json", get(handlers::openapi::openapi_spec))
            // Accounts
            .route("/auth/api/users/register", post(handlers::auth::register_user))
            .route("/auth/register", post(handlers::auth::register_admin))
            .route("/auth/signin", post(handlers::auth::signin));

        let admin_routes = Router::new()
            // Event management
            .route("/event/create", post(handlers::events::create_event))
            .route("/event/showevents", get(handlers::events::list_events))
            .route("/event/getevent/:id", get(handlers::events::get_event))
            .route("/event/updateevent/:id", put(handlers::events::update_event))
            .route("/event/deleteevent/:id", delete(handlers::events::delete_event))
            // Attendance
            .route("/event/:id/attendees", get(handlers::events::event_attendees))
            .route("/event/:id/checkoutall", post(handlers::events::checkout_all))
            .route(
                "/event/:id/export/attendees",
                get(handlers::events::export_attendees),
            )
            .route("/scan", post(handlers::scan::scan))
            .route("/admin/dashboard/stats", get(handlers::admin::dashboard_stats))
            .route_layer(from_fn(require_admin));

        let attendee_routes = Router::new()
            .route("/attendee/events", get(handlers::attendee::list_events))
            .route(
                "/attendee/events/:id/register",
                post(handlers::attendee::register_for_event),
            )
            .route("/attendee/registrations", get(handlers::attendee::my_registrations))
            .route(
                "/attendee/registrations/:id/qr",
                get(handlers::attendee::registration_qr),
            )
            .route(
                "/attendee/dashboard/stats",
                get(handlers::attendee::dashboard_stats),
            )
            .route_layer(from_fn(require_attendee));

        // role checks run after the token has been validated
        let protected_routes = admin_routes
            .merge(attendee_routes)
            .route_layer(from_fn_with_state(state.clone(), auth_middleware));

        Router::new()
            .merge(public_routes)
            .merge(protected_routes)
            .with_state(state)
            .layer(middleware_stack)
    }

    /// Run the server until the process is stopped
    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Run the server until `shutdown` completes, letting in-flight requests finish
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_addr;
        info!("Starting server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| ServerError::Internal(format!("REST server error: {err}")))?;

        info!("Server stopped");
        Ok(())
    }

    /// Get the bind address
    pub fn addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
