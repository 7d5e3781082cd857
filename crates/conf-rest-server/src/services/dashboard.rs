// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Dashboard statistics

use super::attendance::active_seconds;
use crate::dependencies::Clock;
use crate::error::ServerResult;
use crate::state::AppState;
use chrono::Local;
use conf_domain_types::{activity_label, activity_status, credit_hours, AttendanceEventType};
use conf_local_db::Database;
use conf_rest_api_contract::*;
use std::sync::Arc;

const RECENT_ACTIVITY_LIMIT: usize = 5;

pub struct DashboardService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: Arc::clone(&state.db),
            clock: Arc::clone(&state.clock),
        }
    }

    pub fn admin_stats(&self) -> ServerResult<DashboardStatsResponse> {
        Ok(DashboardStatsResponse {
            total_events: self.db.count_events()?,
            total_attendees: self.db.count_users()?,
            total_registrations: self.db.count_registrations()?,
        })
    }

    /// Personal statistics; event times are compared as local wall-clock times
    pub fn attendee_stats(&self, user_id: i64) -> ServerResult<AttendeeDashboardStatsResponse> {
        let now = self.clock.now();
        let local_now = now.with_timezone(&Local).naive_local();
        let registrations = self.db.list_registrations_for_user(user_id)?;

        let upcoming_events = registrations
            .iter()
            .filter(|row| row.event.start_time > local_now)
            .count() as u64;
        let events_attended = registrations
            .iter()
            .filter(|row| row.event.end_time < local_now)
            .count() as u64;

        let mut total_attendance_hours = 0.0;
        for row in &registrations {
            let marks = self.db.list_marks(row.registration.id)?;
            total_attendance_hours += credit_hours(active_seconds(&marks, now));
        }

        let recent_activity = self
            .db
            .list_marks_for_user(user_id)?
            .into_iter()
            .take(RECENT_ACTIVITY_LIMIT)
            .map(|entry| RecentActivityResponse {
                activity_type: activity_label(entry.mark.event_type).to_string(),
                event_name: entry.event_name,
                timestamp: entry.mark.created_at,
                status: activity_status(entry.mark.event_type).to_string(),
            })
            .collect();

        Ok(AttendeeDashboardStatsResponse {
            upcoming_events,
            total_attendance_hours,
            qr_scans: self.db.count_marks_for_user(user_id, AttendanceEventType::Checkin)?,
            events_attended,
            recent_activity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::dependencies::{DefaultServerDependencies, ManualClock};
    use chrono::{TimeZone, Utc};
    use conf_local_db::NewMark;

    #[tokio::test]
    async fn attendee_stats_split_past_and_future() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(now));
        let state = DefaultServerDependencies::with_clock(ServerConfig::default(), clock)
            .await
            .unwrap()
            .into_state();
        let db = &state.db;
        let local_now = now.with_timezone(&Local).naive_local();

        let user = db.insert_user("Ada", "ada@example.com", "hash", now).unwrap();
        let past = db
            .insert_event(
                "Past",
                local_now - chrono::Duration::days(10),
                local_now - chrono::Duration::days(9),
                now,
            )
            .unwrap();
        let future = db
            .insert_event(
                "Future",
                local_now + chrono::Duration::days(9),
                local_now + chrono::Duration::days(10),
                now,
            )
            .unwrap();
        let reg = db.insert_registration(user.id, past.id, "p", now).unwrap();
        db.insert_registration(user.id, future.id, "f", now).unwrap();

        let checkin = now - chrono::Duration::days(10);
        for (at, event_type) in [
            (checkin, AttendanceEventType::Checkin),
            (checkin + chrono::Duration::hours(3), AttendanceEventType::Checkout),
        ] {
            db.insert_mark(&NewMark {
                registration_id: reg.id,
                event_type,
                at,
                idempotency_key: None,
                meta: None,
            })
            .unwrap();
        }

        let service = DashboardService::new(&state);
        let stats = service.attendee_stats(user.id).unwrap();
        assert_eq!(stats.upcoming_events, 1);
        assert_eq!(stats.events_attended, 1);
        assert_eq!(stats.total_attendance_hours, 3.0);
        assert_eq!(stats.qr_scans, 1);
        assert_eq!(stats.recent_activity.len(), 2);
        assert_eq!(stats.recent_activity[0].activity_type, "Completed");
        assert_eq!(stats.recent_activity[0].event_name, "Past");

        let admin = service.admin_stats().unwrap();
        assert_eq!(admin.total_events, 2);
        assert_eq!(admin.total_attendees, 1);
        assert_eq!(admin.total_registrations, 2);
    }
}
