// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Scan processing, rosters and bulk checkout

use crate::dependencies::Clock;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use chrono::{DateTime, Utc};
use conf_domain_types::{
    active_duration, attendance_status, credit_hours, next_event_type, AttendanceEventType,
    AttendanceMark, QrPayload,
};
use conf_local_db::{Database, MarkRecord, MarkStore, NewMark, RegistrationStore};
use conf_rest_api_contract::*;
use conf_rest_api_contract::validation::validate_scan_request;
use serde_json::json;
use std::sync::Arc;

/// Active seconds across `marks`, counting an open interval up to `now`
pub fn active_seconds(marks: &[MarkRecord], now: DateTime<Utc>) -> i64 {
    let marks: Vec<AttendanceMark> = marks.iter().map(MarkRecord::mark).collect();
    active_duration(&marks, Some(now)).num_seconds()
}

/// Attendance service
pub struct AttendanceService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

struct ScanResult {
    registration_id: i64,
    event_type: AttendanceEventType,
    marks: Vec<MarkRecord>,
    duplicate: bool,
}

impl AttendanceService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: Arc::clone(&state.db),
            clock: Arc::clone(&state.clock),
        }
    }

    /// Record the mark for a scanned code.
    ///
    /// A retried request carrying an idempotency key already seen for the
    /// registration is answered from the stored mark without writing.
    pub fn handle_scan(&self, request: &ScanRequest, scanned_by: &str) -> ServerResult<ScanResponse> {
        validate_scan_request(request)?;
        let code = QrPayload::extract_code(&request.code)?;
        let requested = request
            .action
            .as_deref()
            .map(AttendanceEventType::parse_action)
            .transpose()?;
        let key = request.idempotency_key.as_deref();
        let now = self.clock.now();

        let result = self.db.with_transaction(|tx| {
            let Some(registration) = RegistrationStore::new(tx).find_by_code(&code)? else {
                return Ok(None);
            };
            let marks = MarkStore::new(tx);

            if let Some(key) = key {
                if let Some(existing) = marks.find_by_idempotency_key(registration.id, key)? {
                    return Ok(Some(ScanResult {
                        registration_id: registration.id,
                        event_type: existing.event_type,
                        marks: marks.list(registration.id)?,
                        duplicate: true,
                    }));
                }
            }

            let last = marks.last(registration.id)?.map(|mark| mark.event_type);
            let event_type = next_event_type(last, requested);
            marks.insert(&NewMark {
                registration_id: registration.id,
                event_type,
                at: now,
                idempotency_key: key,
                meta: Some(json!({ "idempotency": key, "scannedBy": scanned_by })),
            })?;

            Ok(Some(ScanResult {
                registration_id: registration.id,
                event_type,
                marks: marks.list(registration.id)?,
                duplicate: false,
            }))
        })?;

        let result = result.ok_or_else(|| ServerError::NotFound("Invalid code".to_string()))?;
        let total_active_seconds = active_seconds(&result.marks, now);
        let credit_hours = credit_hours(total_active_seconds);

        if result.duplicate {
            tracing::info!(
                registration_id = result.registration_id,
                "Replayed duplicate scan"
            );
        } else {
            tracing::info!(
                registration_id = result.registration_id,
                status = %result.event_type,
                "Recorded scan"
            );
        }
        tracing::debug!(
            registration_id = result.registration_id,
            total_active_seconds,
            credit_hours,
            "Computed attendance totals"
        );

        Ok(ScanResponse {
            registration_id: result.registration_id,
            status: result.event_type,
            credit_hours,
            total_active_seconds,
            duplicate: result.duplicate,
        })
    }

    /// Check out every registration of the event that is not already out
    pub fn bulk_checkout(&self, event_id: i64) -> ServerResult<BulkCheckoutResponse> {
        self.ensure_event(event_id)?;
        let now = self.clock.now();

        let (total, checked_out, already) = self.db.with_transaction(|tx| {
            let registrations = RegistrationStore::new(tx).list_for_event(event_id)?;
            let marks = MarkStore::new(tx);
            let mut checked_out = 0u64;
            let mut already = 0u64;

            for row in &registrations {
                let id = row.registration.id;
                let last = marks.last(id)?.map(|mark| mark.event_type);
                if last == Some(AttendanceEventType::Checkout) {
                    already += 1;
                    continue;
                }
                marks.insert(&NewMark {
                    registration_id: id,
                    event_type: AttendanceEventType::Checkout,
                    at: now,
                    idempotency_key: None,
                    meta: Some(json!({ "adminBulkCheckout": true })),
                })?;
                checked_out += 1;
            }

            Ok((registrations.len() as u64, checked_out, already))
        })?;

        tracing::info!(event_id, checked_out, already, "Bulk checkout completed");

        Ok(BulkCheckoutResponse {
            event_id,
            total_registrations: total,
            checked_out_count: checked_out,
            already_checked_out_count: already,
            message: format!(
                "Checked out {checked_out} attendee(s); {already} already checked out"
            ),
        })
    }

    /// Roster of the event with derived status and credit hours
    pub fn event_attendees(&self, event_id: i64) -> ServerResult<Vec<EventAttendeeResponse>> {
        self.ensure_event(event_id)?;
        let now = self.clock.now();

        self.db
            .list_registrations_for_event(event_id)?
            .into_iter()
            .map(|row| -> ServerResult<EventAttendeeResponse> {
                let registration = row.registration;
                let marks = self.db.list_marks(registration.id)?;
                let last = marks.last();
                let last_type = last.map(|mark| mark.event_type);

                Ok(EventAttendeeResponse {
                    registration_id: registration.id,
                    user_id: registration.user_id,
                    user_name: row.user_name,
                    user_email: row.user_email,
                    current_status: attendance_status(last_type).to_string(),
                    last_activity: last.map_or(registration.created_at, |mark| mark.created_at),
                    total_credit_hours: credit_hours(active_seconds(&marks, now)),
                    last_action: last_type.map_or_else(|| "NONE".to_string(), |t| t.to_string()),
                    registration_code: registration.code,
                })
            })
            .collect()
    }

    fn ensure_event(&self, event_id: i64) -> ServerResult<()> {
        if self.db.get_event(event_id)?.is_none() {
            return Err(ServerError::NotFound(format!("Event {event_id} not found")));
        }
        Ok(())
    }
}
