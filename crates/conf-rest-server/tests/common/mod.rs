// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only
#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use conf_rest_api_contract::{AdminRegisterRequest, EventRequest, LoginRequest, UserRegisterRequest};
use conf_rest_client::{AuthConfig, RestClient};
use conf_rest_server::{
    dependencies::{DefaultServerDependencies, ManualClock},
    Server, ServerConfig,
};
use tokio::task::JoinHandle;

pub const PASSWORD: &str = "secret123";

/// Test configuration on a free port with rate limiting off
pub fn base_config() -> ServerConfig {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = ServerConfig {
        bind_addr: addr,
        jwt_secret: Some("integration-test-secret".into()),
        ..ServerConfig::default()
    };
    config.rate_limit.enabled = false;
    config
}

pub struct TestServer {
    pub client: RestClient,
    pub clock: Arc<ManualClock>,
    pub handle: JoinHandle<()>,
}

impl TestServer {
    pub fn base_url(&self) -> String {
        self.client.base_url().to_string()
    }
}

/// 2025-03-14 09:00 UTC, the start of the seeded event
pub fn start_of_day() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap()
}

pub async fn spawn_server() -> TestServer {
    spawn_server_with(|_| {}).await
}

/// Spawn a server on a manual clock, optionally adjusting its config
pub async fn spawn_server_with(configure: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let mut config = base_config();
    configure(&mut config);

    let clock = Arc::new(ManualClock::new(start_of_day()));
    let deps = DefaultServerDependencies::with_clock(config.clone(), clock.clone())
        .await
        .expect("deps");
    let server = Server::with_state(config.clone(), deps.into_state()).await.expect("server");
    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });

    let client = RestClient::from_url(&format!("http://{}", config.bind_addr), AuthConfig::default())
        .expect("client");
    wait_for_health(&client).await;

    TestServer {
        client,
        clock,
        handle,
    }
}

async fn wait_for_health(client: &RestClient) {
    for _ in 0..50 {
        if client.health().await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not become healthy");
}

fn wall_clock(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 14)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn event_request(name: &str) -> EventRequest {
    EventRequest {
        event_name: name.to_string(),
        event_start_time: wall_clock(9, 0),
        event_end_time: wall_clock(17, 0),
    }
}

/// Register and sign in a staff account, returning a client carrying its token
pub async fn admin_client(server: &TestServer, email: &str) -> RestClient {
    server
        .client
        .register_admin(&AdminRegisterRequest {
            staff_name: "Front Desk".to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            validation_code: None,
        })
        .await
        .expect("register admin");
    signed_in(server, email).await
}

/// Register and sign in an attendee, returning a client carrying its token
pub async fn attendee_client(server: &TestServer, email: &str) -> RestClient {
    server
        .client
        .register_user(&UserRegisterRequest {
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .expect("register user");
    signed_in(server, email).await
}

pub async fn signed_in(server: &TestServer, email: &str) -> RestClient {
    let login = server
        .client
        .signin(&LoginRequest {
            email: email.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .expect("signin");
    server.client.with_auth(AuthConfig::bearer(login.token))
}
