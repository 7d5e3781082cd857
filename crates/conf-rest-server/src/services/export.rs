// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! CSV export of an event's attendees

use crate::dependencies::Clock;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use conf_domain_types::{active_duration, format_duration, AttendanceEventType, AttendanceMark};
use conf_local_db::{Database, MarkRecord};
use conf_rest_api_contract::AttendeeExportResponse;
use std::sync::Arc;

const HEADER: [&str; 9] = [
    "Attendee Name",
    "Email",
    "Registration Status",
    "Registration Date",
    "Total Time (Hours)",
    "Check-in Time",
    "Check-out Time",
    "Total Attendance Events",
    "Last Activity",
];

const NOT_AVAILABLE: &str = "N/A";

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn first_of(marks: &[MarkRecord], event_type: AttendanceEventType) -> Option<&MarkRecord> {
    marks.iter().find(|mark| mark.event_type == event_type)
}

fn last_of(marks: &[MarkRecord], event_type: AttendanceEventType) -> Option<&MarkRecord> {
    marks.iter().rev().find(|mark| mark.event_type == event_type)
}

/// Time spent in closed intervals only
fn total_time(marks: &[MarkRecord]) -> String {
    if marks.is_empty() {
        return "0s".to_string();
    }
    let marks: Vec<AttendanceMark> = marks.iter().map(MarkRecord::mark).collect();
    format_duration(active_duration(&marks, None).num_seconds())
}

/// `attendees_{name}_{YYYYMMDD_HHMMSS}.csv` with non-alphanumerics replaced
pub fn export_filename(event_name: &str, at: DateTime<Local>) -> String {
    let name: String = event_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("attendees_{name}_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Export service
pub struct ExportService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl ExportService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: Arc::clone(&state.db),
            clock: Arc::clone(&state.clock),
        }
    }

    pub fn export_attendees(&self, event_id: i64) -> ServerResult<AttendeeExportResponse> {
        let event = self
            .db
            .get_event(event_id)?
            .ok_or_else(|| ServerError::NotFound(format!("Event {event_id} not found")))?;
        let registrations = self.db.list_registrations_for_event(event_id)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(HEADER).map_err(csv_error)?;

        for row in &registrations {
            let marks = self.db.list_marks(row.registration.id)?;
            let time_of = |mark: Option<&MarkRecord>| {
                mark.map_or_else(|| NOT_AVAILABLE.to_string(), |m| iso(m.created_at))
            };

            let record = [
                row.user_name.clone(),
                row.user_email.clone(),
                row.registration.status.to_string(),
                iso(row.registration.created_at),
                total_time(&marks),
                time_of(first_of(&marks, AttendanceEventType::Checkin)),
                time_of(last_of(&marks, AttendanceEventType::Checkout)),
                marks.len().to_string(),
                time_of(marks.last()),
            ];
            writer.write_record(&record).map_err(csv_error)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ServerError::Internal(format!("CSV generation failed: {e}")))?;
        let csv_content = String::from_utf8(bytes)
            .map_err(|e| ServerError::Internal(format!("CSV generation failed: {e}")))?;

        tracing::info!(event_id, rows = registrations.len(), "Exported attendees");
        Ok(AttendeeExportResponse {
            csv_content,
            filename: export_filename(&event.event_name, self.clock.now().with_timezone(&Local)),
        })
    }
}

fn csv_error(err: csv::Error) -> ServerError {
    ServerError::Internal(format!("CSV generation failed: {err}"))
}
