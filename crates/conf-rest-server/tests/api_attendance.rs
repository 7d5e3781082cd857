// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

mod common;

use common::*;
use conf_domain_types::{AttendanceEventType, QrPayload};
use conf_rest_api_contract::{RegistrationResponse, ScanRequest};
use conf_rest_client::RestClient;
use reqwest::StatusCode;

struct Seeded {
    server: TestServer,
    admin: RestClient,
    attendee: RestClient,
    event_id: i64,
    registration: RegistrationResponse,
}

async fn seeded() -> Seeded {
    let server = spawn_server().await;
    let admin = admin_client(&server, "desk@example.com").await;
    let attendee = attendee_client(&server, "ada@example.com").await;
    let event = admin.create_event(&event_request("RustConf")).await.unwrap();
    let registration = attendee.register_for_event(event.id).await.unwrap();

    Seeded {
        server,
        admin,
        attendee,
        event_id: event.id,
        registration,
    }
}

fn scan_request(code: &str, key: &str) -> ScanRequest {
    ScanRequest {
        code: code.to_string(),
        action: None,
        idempotency_key: Some(key.to_string()),
    }
}

#[tokio::test]
async fn registering_twice_conflicts() {
    let s = seeded().await;
    let err = s.attendee.register_for_event(s.event_id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));

    let err = s.attendee.register_for_event(9999).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn scans_toggle_and_accumulate_credit() {
    let s = seeded().await;
    assert_eq!(s.attendee.attendee_dashboard_stats().await.unwrap().qr_scans, 0);

    let payload = QrPayload::new(&s.registration.code, s.event_id, 0).to_string();

    let first = s.admin.scan(&scan_request(&payload, "scan_1")).await.unwrap();
    assert_eq!(first.status, AttendanceEventType::Checkin);
    assert_eq!(first.registration_id, s.registration.registration_id);
    assert_eq!(first.total_active_seconds, 0);

    s.server.clock.advance(chrono::Duration::minutes(90));
    let second = s
        .admin
        .scan(&scan_request(&s.registration.code, "scan_2"))
        .await
        .unwrap();
    assert_eq!(second.status, AttendanceEventType::Pause);
    assert_eq!(second.total_active_seconds, 90 * 60);
    assert_eq!(second.credit_hours, 1.5);

    s.server.clock.advance(chrono::Duration::minutes(30));
    let third = s.admin.scan(&scan_request(&payload, "scan_3")).await.unwrap();
    assert_eq!(third.status, AttendanceEventType::Resume);
    assert_eq!(third.total_active_seconds, 90 * 60);

    let roster = s.admin.event_attendees(s.event_id).await.unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].current_status, "ACTIVE");
    assert_eq!(roster[0].last_action, "RESUME");
    assert_eq!(roster[0].user_email, "ada@example.com");
}

#[tokio::test]
async fn repeated_idempotency_key_does_not_record_twice() {
    let s = seeded().await;
    let request = scan_request(&s.registration.code, "scan_same");

    let first = s.admin.scan(&request).await.unwrap();
    assert!(!first.duplicate);

    s.server.clock.advance(chrono::Duration::minutes(5));
    let replay = s.admin.scan(&request).await.unwrap();
    assert!(replay.duplicate);
    assert_eq!(replay.status, AttendanceEventType::Checkin);

    let stats = s.attendee.attendee_dashboard_stats().await.unwrap();
    assert_eq!(stats.qr_scans, 1);
    assert_eq!(stats.recent_activity.len(), 1);
}

#[tokio::test]
async fn explicit_action_overrides_toggle() {
    let s = seeded().await;
    let mut request = scan_request(&s.registration.code, "scan_a");
    request.action = Some("checkout".to_string());

    let response = s.admin.scan(&request).await.unwrap();
    assert_eq!(response.status, AttendanceEventType::Checkout);

    request.action = Some("teleport".to_string());
    request.idempotency_key = Some("scan_b".to_string());
    let err = s.admin.scan(&request).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn unknown_and_malformed_codes_are_rejected() {
    let s = seeded().await;

    let err = s.admin.scan(&scan_request("deadbeef", "k1")).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    let err = s.admin.scan(&scan_request("REG:x:EVENT:one", "k2")).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn bulk_checkout_skips_checked_out_registrations() {
    let s = seeded().await;
    let other = attendee_client(&s.server, "bob@example.com").await;
    let other_registration = other.register_for_event(s.event_id).await.unwrap();

    let mut checkout = scan_request(&other_registration.code, "k1");
    checkout.action = Some("CHECKOUT".to_string());
    s.admin.scan(&checkout).await.unwrap();

    let result = s.admin.checkout_all(s.event_id).await.unwrap();
    assert_eq!(result.total_registrations, 2);
    assert_eq!(result.checked_out_count, 1);
    assert_eq!(result.already_checked_out_count, 1);

    let again = s.admin.checkout_all(s.event_id).await.unwrap();
    assert_eq!(again.checked_out_count, 0);
    assert_eq!(again.already_checked_out_count, 2);

    let roster = s.admin.event_attendees(s.event_id).await.unwrap();
    assert!(roster.iter().all(|row| row.current_status == "CHECKED_OUT"));
}

#[tokio::test]
async fn export_lists_registrations_as_csv() {
    let s = seeded().await;
    s.admin.scan(&scan_request(&s.registration.code, "k1")).await.unwrap();
    s.server.clock.advance(chrono::Duration::hours(2));
    s.admin.checkout_all(s.event_id).await.unwrap();

    let export = s.admin.export_attendees(s.event_id).await.unwrap();
    assert!(export.filename.starts_with("attendees_RustConf_"));
    assert!(export.filename.ends_with(".csv"));

    let mut lines = export.csv_content.lines();
    let header = lines.next().unwrap();
    assert!(header.contains("Email"));
    let row = lines.next().unwrap();
    assert!(row.contains("ada@example.com"));
    assert!(row.contains("2025-03-14T09:00:00Z"));
    assert!(row.contains(",2:00"));
    assert!(lines.next().is_none());
}

#[tokio::test]
async fn qr_codes_are_only_served_to_their_owner() {
    let s = seeded().await;

    let png = s
        .attendee
        .registration_qr(s.registration.registration_id)
        .await
        .unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let other = attendee_client(&s.server, "bob@example.com").await;
    let err = other
        .registration_qr(s.registration.registration_id)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn dashboards_count_events_people_and_registrations() {
    let s = seeded().await;
    s.admin.create_event(&event_request("Second")).await.unwrap();

    let stats = s.admin.admin_dashboard_stats().await.unwrap();
    assert_eq!(stats.total_events, 2);
    assert_eq!(stats.total_attendees, 1);
    assert_eq!(stats.total_registrations, 1);

    let registrations = s.attendee.my_registrations().await.unwrap();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].registration_id, s.registration.registration_id);
    assert_eq!(registrations[0].code, s.registration.code);
    assert_eq!(s.attendee.attendee_events().await.unwrap().len(), 2);
}
