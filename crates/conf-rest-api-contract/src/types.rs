// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! API contract types for the conference attendance REST service

use chrono::{DateTime, NaiveDateTime, Utc};
use conf_domain_types::{AttendanceEventType, Role};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Attendee self-registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct UserRegisterRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Staff account registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AdminRegisterRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub staff_name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AdminResponse {
    pub id: i64,
    pub staff_name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
}

/// Event creation or update
///
/// Times are local wall-clock times as typed into a `datetime-local` input,
/// so both `2025-03-14T09:00` and `2025-03-14T09:00:00` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_event_window", skip_on_field_errors = true))]
pub struct EventRequest {
    #[validate(custom(function = "not_blank", message = "Event name is required"))]
    pub event_name: String,
    #[serde(alias = "startTime", with = "local_datetime")]
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "2025-03-14T09:00"))]
    pub event_start_time: NaiveDateTime,
    #[serde(alias = "endTime", with = "local_datetime")]
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "2025-03-14T17:00"))]
    pub event_end_time: NaiveDateTime,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_event_window(request: &EventRequest) -> Result<(), ValidationError> {
    if request.event_start_time > request.event_end_time {
        let mut err = ValidationError::new("event_window");
        err.message = Some("Event start time must not be after the end time".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: i64,
    pub event_name: String,
    #[serde(with = "local_datetime")]
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub event_start_time: NaiveDateTime,
    #[serde(with = "local_datetime")]
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub event_end_time: NaiveDateTime,
}

/// Registration of the caller for an event, with its QR code as base64 PNG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub registration_id: i64,
    pub event_id: i64,
    pub code: String,
    pub qr_base64: String,
}

/// Scan submitted by staff
///
/// `code` is the decoded QR text. `action` forces a specific mark instead of
/// toggling on the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[validate(custom(function = "not_blank", message = "Code is required"))]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 128, message = "Idempotency key must be 1-128 characters"))]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub registration_id: i64,
    /// Mark recorded by this scan, or the replayed one for a duplicate
    pub status: AttendanceEventType,
    pub credit_hours: f64,
    pub total_active_seconds: i64,
    /// Set when the idempotency key had already been processed
    #[serde(default)]
    pub duplicate: bool,
}

/// One row of an event's attendee roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EventAttendeeResponse {
    pub registration_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub registration_code: String,
    /// `REGISTERED`, `ACTIVE`, `PAUSED` or `CHECKED_OUT`
    pub current_status: String,
    pub last_activity: DateTime<Utc>,
    pub total_credit_hours: f64,
    /// Last recorded mark, or `NONE`
    pub last_action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BulkCheckoutResponse {
    pub event_id: i64,
    pub total_registrations: u64,
    pub checked_out_count: u64,
    pub already_checked_out_count: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AttendeeExportResponse {
    pub csv_content: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsResponse {
    pub total_events: u64,
    pub total_attendees: u64,
    pub total_registrations: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RecentActivityResponse {
    pub activity_type: String,
    pub event_name: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AttendeeDashboardStatsResponse {
    pub upcoming_events: u64,
    pub total_attendance_hours: f64,
    pub qr_scans: u64,
    pub events_attended: u64,
    pub recent_activity: Vec<RecentActivityResponse>,
}

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Version response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
}

/// Serde adapter for event wall-clock times
pub mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
    const INPUT_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    /// Parse a `datetime-local` style timestamp, with or without seconds
    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        INPUT_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }

    pub fn format(value: &NaiveDateTime) -> String {
        value.format(OUTPUT_FORMAT).to_string()
    }

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid date-time '{raw}'")))
    }
}
