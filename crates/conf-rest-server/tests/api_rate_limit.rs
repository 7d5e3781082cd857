// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

mod common;

use common::*;
use reqwest::StatusCode;

#[tokio::test]
async fn requests_over_the_limit_get_429() {
    let server = spawn_server_with(|config| {
        config.rate_limit.enabled = true;
        config.rate_limit.requests_per_minute = 60;
    })
    .await;

    // health polling during startup already used part of the window
    let mut limited = None;
    for _ in 0..61 {
        if let Err(err) = server.client.version().await {
            limited = Some(err);
            break;
        }
    }

    let err = limited.expect("limit was never hit");
    assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let server = spawn_server().await;
    let body: serde_json::Value = reqwest::get(format!("{}openapi.json", server.base_url()))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(body["paths"]["/scan"].is_object());
    assert!(body["components"]["schemas"]["ScanRequest"].is_object());
}

#[tokio::test]
async fn limited_responses_keep_cors_headers() {
    let server = spawn_server_with(|config| {
        config.enable_cors = true;
        config.rate_limit.enabled = true;
        config.rate_limit.requests_per_minute = 60;
    })
    .await;

    let http = reqwest::Client::new();
    let url = format!("{}version", server.base_url());
    let mut limited = None;
    for _ in 0..61 {
        let response = http
            .get(&url)
            .header("origin", "https://scanner.example.org")
            .send()
            .await
            .unwrap();
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            limited = Some(response);
            break;
        }
    }

    let response = limited.expect("limit was never hit");
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
}
