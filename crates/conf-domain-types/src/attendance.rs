// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Attendance state machine
//!
//! Every scan of a registration's QR code appends an [`AttendanceMark`]. The
//! registration's state is never stored authoritatively; it is derived from
//! the ordered list of marks:
//!
//! ```text
//!   (none) --CHECKIN--> ACTIVE --PAUSE--> PAUSED --RESUME--> ACTIVE
//!                         |                  |
//!                         +----CHECKOUT------+--> CHECKED_OUT --CHECKIN--> ACTIVE
//! ```
//!
//! Active time accumulates between an opening mark (CHECKIN/RESUME) and the
//! next closing mark (PAUSE/CHECKOUT/MANUAL).

use crate::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sessions shorter than this earn no credit
pub const MIN_CREDITED_SECONDS: i64 = 15 * 60;

/// Credit hours are rounded to this fraction of an hour
pub const CREDIT_HOUR_STEP: f64 = 0.25;

/// Kind of attendance mark recorded by a scan or an administrator
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AttendanceEventType {
    /// Scanned to start attendance
    Checkin,
    /// Scanned to mark a break
    Pause,
    /// Scanned to come back from a break
    Resume,
    /// Scanned to end attendance
    Checkout,
    /// Manual entry by an administrator
    Manual,
}

impl AttendanceEventType {
    /// Parse a client-supplied action, rejecting anything unknown
    pub fn parse_action(action: &str) -> Result<Self, DomainError> {
        action
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidAction(action.to_string()))
    }

    /// Whether this mark starts an active interval
    pub fn opens_interval(self) -> bool {
        matches!(self, Self::Checkin | Self::Resume)
    }

    /// Whether this mark ends an active interval
    pub fn closes_interval(self) -> bool {
        !self.opens_interval()
    }
}

/// Attendance state of a registration as shown to administrators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Registered,
    Active,
    Paused,
    CheckedOut,
}

/// Registration status persisted alongside the registration row
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Registered,
    CheckedIn,
    Paused,
    CheckedOut,
}

/// A single recorded scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceMark {
    pub event_type: AttendanceEventType,
    pub at: DateTime<Utc>,
}

impl AttendanceMark {
    pub fn new(event_type: AttendanceEventType, at: DateTime<Utc>) -> Self {
        Self { event_type, at }
    }
}

/// Decide which mark a scan records.
///
/// An explicit action always wins. Without one the scan toggles on the
/// previous mark; a checked-out attendee may check in again.
pub fn next_event_type(
    last: Option<AttendanceEventType>,
    requested: Option<AttendanceEventType>,
) -> AttendanceEventType {
    if let Some(requested) = requested {
        return requested;
    }

    match last {
        None => AttendanceEventType::Checkin,
        Some(AttendanceEventType::Checkin | AttendanceEventType::Resume) => {
            AttendanceEventType::Pause
        }
        Some(AttendanceEventType::Pause) => AttendanceEventType::Resume,
        Some(AttendanceEventType::Checkout | AttendanceEventType::Manual) => {
            AttendanceEventType::Checkin
        }
    }
}

/// Total active time across `marks`, which must be in chronological order.
///
/// When `now` is given, an interval that is still open is counted up to
/// `now`; otherwise only closed intervals contribute.
pub fn active_duration(marks: &[AttendanceMark], now: Option<DateTime<Utc>>) -> chrono::Duration {
    let mut open_since: Option<DateTime<Utc>> = None;
    let mut total = chrono::Duration::zero();

    for mark in marks {
        if mark.event_type.opens_interval() {
            if open_since.is_none() {
                open_since = Some(mark.at);
            }
        } else if let Some(start) = open_since.take() {
            total += non_negative(mark.at - start);
        }
    }

    if let (Some(start), Some(now)) = (open_since, now) {
        let current = non_negative(now - start);
        tracing::debug!(
            since = %start,
            current_secs = current.num_seconds(),
            "registration is currently active"
        );
        total += current;
    }

    total
}

fn non_negative(span: chrono::Duration) -> chrono::Duration {
    span.max(chrono::Duration::zero())
}

/// Credit hours earned for `total_seconds` of active time
pub fn credit_hours(total_seconds: i64) -> f64 {
    if total_seconds < MIN_CREDITED_SECONDS {
        return 0.0;
    }
    let hours = total_seconds as f64 / 3600.0;
    (hours / CREDIT_HOUR_STEP).round() * CREDIT_HOUR_STEP
}

/// Derived attendance status given the most recent mark
pub fn attendance_status(last: Option<AttendanceEventType>) -> AttendanceStatus {
    match last {
        None | Some(AttendanceEventType::Manual) => AttendanceStatus::Registered,
        Some(AttendanceEventType::Checkin | AttendanceEventType::Resume) => {
            AttendanceStatus::Active
        }
        Some(AttendanceEventType::Pause) => AttendanceStatus::Paused,
        Some(AttendanceEventType::Checkout) => AttendanceStatus::CheckedOut,
    }
}

/// Status persisted on the registration after `last` has been recorded
pub fn registration_status(last: Option<AttendanceEventType>) -> RegistrationStatus {
    match attendance_status(last) {
        AttendanceStatus::Registered => RegistrationStatus::Registered,
        AttendanceStatus::Active => RegistrationStatus::CheckedIn,
        AttendanceStatus::Paused => RegistrationStatus::Paused,
        AttendanceStatus::CheckedOut => RegistrationStatus::CheckedOut,
    }
}

/// Compact duration used in exports: `42s`, `12:05` (m:ss) or `3:07` (h:mm)
pub fn format_duration(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    if total_seconds < 60 {
        format!("{}s", total_seconds)
    } else if total_seconds < 3600 {
        format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
    } else {
        format!("{}:{:02}", total_seconds / 3600, (total_seconds % 3600) / 60)
    }
}

/// Phrase preceding the event name in an activity feed
pub fn activity_label(event_type: AttendanceEventType) -> &'static str {
    match event_type {
        AttendanceEventType::Checkin => "Checked in to",
        AttendanceEventType::Checkout => "Completed",
        AttendanceEventType::Pause => "Paused attendance at",
        AttendanceEventType::Resume => "Resumed attendance at",
        AttendanceEventType::Manual => "Updated status for",
    }
}

/// Short status shown next to an activity feed entry
pub fn activity_status(event_type: AttendanceEventType) -> &'static str {
    match event_type {
        AttendanceEventType::Checkin | AttendanceEventType::Resume => "Active",
        AttendanceEventType::Checkout => "Completed",
        AttendanceEventType::Pause => "Paused",
        AttendanceEventType::Manual => "Updated",
    }
}

#[cfg(feature = "rusqlite")]
mod sql {
    use super::{AttendanceEventType, RegistrationStatus};
    use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

    impl ToSql for AttendanceEventType {
        fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
            Ok(ToSqlOutput::from(self.as_ref()))
        }
    }

    impl FromSql for AttendanceEventType {
        fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
            value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
        }
    }

    impl ToSql for RegistrationStatus {
        fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
            Ok(ToSqlOutput::from(self.as_ref()))
        }
    }

    impl FromSql for RegistrationStatus {
        fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
            value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
        }
    }
}
