// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Event management

use crate::dependencies::Clock;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use conf_local_db::{Database, EventRecord};
use conf_rest_api_contract::*;
use conf_rest_api_contract::validation::validate_event_request;
use std::sync::Arc;

pub fn event_response(event: &EventRecord) -> EventResponse {
    EventResponse {
        id: event.id,
        event_name: event.event_name.clone(),
        event_start_time: event.start_time,
        event_end_time: event.end_time,
    }
}

fn event_not_found(id: i64) -> ServerError {
    ServerError::NotFound(format!("Event {id} not found"))
}

/// Event service
pub struct EventService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl EventService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: Arc::clone(&state.db),
            clock: Arc::clone(&state.clock),
        }
    }

    pub fn create(&self, request: &EventRequest) -> ServerResult<EventResponse> {
        validate_event_request(request)?;
        let event = self.db.insert_event(
            request.event_name.trim(),
            request.event_start_time,
            request.event_end_time,
            self.clock.now(),
        )?;
        tracing::info!(event_id = event.id, name = %event.event_name, "Created event");
        Ok(event_response(&event))
    }

    pub fn list(&self) -> ServerResult<Vec<EventResponse>> {
        Ok(self.db.list_events()?.iter().map(event_response).collect())
    }

    pub fn get(&self, id: i64) -> ServerResult<EventResponse> {
        self.record(id).map(|event| event_response(&event))
    }

    /// Stored event `id`, or 404
    pub fn record(&self, id: i64) -> ServerResult<EventRecord> {
        self.db.get_event(id)?.ok_or_else(|| event_not_found(id))
    }

    pub fn update(&self, id: i64, request: &EventRequest) -> ServerResult<EventResponse> {
        validate_event_request(request)?;
        let name = request.event_name.trim();
        if !self.db.update_event(id, name, request.event_start_time, request.event_end_time)? {
            return Err(event_not_found(id));
        }
        tracing::info!(event_id = id, "Updated event");
        self.get(id)
    }

    /// Remove the event with its registrations and marks
    pub fn delete(&self, id: i64) -> ServerResult<()> {
        if !self.db.delete_event(id)? {
            return Err(event_not_found(id));
        }
        tracing::info!(event_id = id, "Deleted event");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::dependencies::DefaultServerDependencies;
    use chrono::NaiveDate;

    fn request(name: &str, start_hour: u32, end_hour: u32) -> EventRequest {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        EventRequest {
            event_name: name.to_string(),
            event_start_time: day.and_hms_opt(start_hour, 0, 0).unwrap(),
            event_end_time: day.and_hms_opt(end_hour, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn crud_reports_missing_events() {
        let state = DefaultServerDependencies::new(ServerConfig::default())
            .await
            .unwrap()
            .into_state();
        let service = EventService::new(&state);

        let created = service.create(&request("  RustConf ", 9, 17)).unwrap();
        assert_eq!(created.event_name, "RustConf");

        let updated = service.update(created.id, &request("RustConf Day 2", 10, 18)).unwrap();
        assert_eq!(updated.event_name, "RustConf Day 2");
        assert_eq!(service.list().unwrap(), vec![updated]);

        assert!(matches!(service.get(999), Err(ServerError::NotFound(_))));
        assert!(matches!(
            service.update(999, &request("x", 9, 10)),
            Err(ServerError::NotFound(_))
        ));

        service.delete(created.id).unwrap();
        assert!(matches!(service.delete(created.id), Err(ServerError::NotFound(_))));
    }

    #[tokio::test]
    async fn invalid_window_is_rejected() {
        let state = DefaultServerDependencies::new(ServerConfig::default())
            .await
            .unwrap()
            .into_state();
        let err = EventService::new(&state).create(&request("Backwards", 17, 9)).unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
    }
}
