// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Attendee registrations and their QR codes

use super::qr;
use crate::dependencies::Clock;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use conf_domain_types::QrPayload;
use conf_local_db::{Database, RegistrationRecord};
use conf_rest_api_contract::RegistrationResponse;
use std::sync::Arc;

/// Registration service
pub struct RegistrationService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    qr_size: u32,
}

impl RegistrationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: Arc::clone(&state.db),
            clock: Arc::clone(&state.clock),
            qr_size: state.config.qr_size,
        }
    }

    /// Register `user_id` for `event_id` and issue its code
    pub fn register(&self, user_id: i64, event_id: i64) -> ServerResult<RegistrationResponse> {
        if self.db.get_user(user_id)?.is_none() {
            return Err(ServerError::NotFound(format!("User {user_id} not found")));
        }
        if self.db.get_event(event_id)?.is_none() {
            return Err(ServerError::NotFound(format!("Event {event_id} not found")));
        }
        if self.db.registration_exists(user_id, event_id)? {
            return Err(ServerError::Conflict(
                "You are already registered for this event".to_string(),
            ));
        }

        let code = uuid::Uuid::new_v4().simple().to_string();
        let registration = self
            .db
            .insert_registration(user_id, event_id, &code, self.clock.now())?;
        tracing::info!(
            registration_id = registration.id,
            user_id,
            event_id,
            "Registered attendee for event"
        );

        self.response(&registration)
    }

    /// The user's registrations, each with its QR code
    pub fn list_for_user(&self, user_id: i64) -> ServerResult<Vec<RegistrationResponse>> {
        self.db
            .list_registrations_for_user(user_id)?
            .iter()
            .map(|row| self.response(&row.registration))
            .collect()
    }

    /// QR PNG of registration `id`; 404 unless it belongs to `user_id`
    pub fn qr_png(&self, user_id: i64, id: i64) -> ServerResult<Vec<u8>> {
        let registration = self
            .db
            .get_registration_for_user(id, user_id)?
            .ok_or_else(|| ServerError::NotFound(format!("Registration {id} not found")))?;
        qr::render_png(&payload(&registration).to_string(), self.qr_size)
    }

    fn response(&self, registration: &RegistrationRecord) -> ServerResult<RegistrationResponse> {
        Ok(RegistrationResponse {
            registration_id: registration.id,
            event_id: registration.event_id,
            code: registration.code.clone(),
            qr_base64: qr::render_base64(&payload(registration).to_string(), self.qr_size)?,
        })
    }
}

fn payload(registration: &RegistrationRecord) -> QrPayload {
    QrPayload::new(
        registration.code.clone(),
        registration.event_id,
        registration.user_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::dependencies::DefaultServerDependencies;
    use chrono::{NaiveDate, Utc};

    async fn seeded() -> (RegistrationService, i64, i64) {
        let config = ServerConfig {
            qr_size: 64,
            ..Default::default()
        };
        let state = DefaultServerDependencies::new(config).await.unwrap().into_state();
        let user = state.db.insert_user("Ada", "ada@example.com", "hash", Utc::now()).unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let event = state
            .db
            .insert_event(
                "RustConf",
                day.and_hms_opt(9, 0, 0).unwrap(),
                day.and_hms_opt(17, 0, 0).unwrap(),
                Utc::now(),
            )
            .unwrap();
        (RegistrationService::new(&state), user.id, event.id)
    }

    #[tokio::test]
    async fn register_issues_hex_code_once() {
        let (service, user_id, event_id) = seeded().await;

        let registration = service.register(user_id, event_id).unwrap();
        assert_eq!(registration.code.len(), 32);
        assert!(registration.code.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!registration.qr_base64.is_empty());

        let err = service.register(user_id, event_id).unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
        assert!(matches!(service.register(user_id, 999), Err(ServerError::NotFound(_))));
        assert!(matches!(service.register(999, event_id), Err(ServerError::NotFound(_))));

        let listed = service.list_for_user(user_id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].code, registration.code);
    }

    #[tokio::test]
    async fn qr_is_only_served_to_owner() {
        let (service, user_id, event_id) = seeded().await;
        let registration = service.register(user_id, event_id).unwrap();

        let png = service.qr_png(user_id, registration.registration_id).unwrap();
        assert!(png.starts_with(b"\x89PNG"));

        let err = service.qr_png(user_id + 1, registration.registration_id).unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }
}
