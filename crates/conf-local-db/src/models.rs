// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Records and table stores

use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use conf_domain_types::{
    registration_status, AttendanceEventType, AttendanceMark, RegistrationStatus,
};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};

const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn local_time(at: NaiveDateTime) -> String {
    at.format(LOCAL_FORMAT).to_string()
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn get_local_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, LOCAL_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn get_meta(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<serde_json::Value>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|text| serde_json::from_str(&text).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

/// Map unique-constraint failures to [`Error::Conflict`]
fn unique_violation(err: rusqlite::Error, what: impl FnOnce() -> String) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::Conflict(what())
        }
        _ => Error::Sqlite(err),
    }
}

fn count(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<u64> {
    let n: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(n.max(0) as u64)
}

/// Attendee account
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: get_timestamp(row, 4)?,
        })
    }
}

pub struct UserStore<'a> {
    conn: &'a Connection,
}

impl<'a> UserStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord> {
        self.conn
            .execute(
                "INSERT INTO users (name, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![name, email, password_hash, timestamp(now)],
            )
            .map_err(|e| unique_violation(e, || format!("email {email} is already registered")))?;
        Ok(UserRecord {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        })
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE email = ?1",
                [email],
                UserRecord::from_row,
            )
            .optional()?)
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE id = ?1",
                [id],
                UserRecord::from_row,
            )
            .optional()?)
    }

    pub fn count(&self) -> Result<u64> {
        count(self.conn, "SELECT COUNT(*) FROM users", [])
    }
}

/// Staff account
#[derive(Debug, Clone, PartialEq)]
pub struct AdminRecord {
    pub id: i64,
    pub staff_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

pub struct AdminStore<'a> {
    conn: &'a Connection,
}

impl<'a> AdminStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(
        &self,
        staff_name: &str,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminRecord> {
        self.conn
            .execute(
                "INSERT INTO admins (staff_name, email, password_hash, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![staff_name, email, password_hash, timestamp(now)],
            )
            .map_err(|e| unique_violation(e, || format!("email {email} is already registered")))?;
        Ok(AdminRecord {
            id: self.conn.last_insert_rowid(),
            staff_name: staff_name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        })
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<AdminRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, staff_name, email, password_hash, created_at FROM admins WHERE email = ?1",
                [email],
                |row| {
                    Ok(AdminRecord {
                        id: row.get(0)?,
                        staff_name: row.get(1)?,
                        email: row.get(2)?,
                        password_hash: row.get(3)?,
                        created_at: get_timestamp(row, 4)?,
                    })
                },
            )
            .optional()?)
    }
}

/// Conference event; start and end are local wall-clock times
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: i64,
    pub event_name: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    const COLUMNS: &'static str = "id, event_name, start_time, end_time, created_at";

    fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            event_name: row.get(offset + 1)?,
            start_time: get_local_time(row, offset + 2)?,
            end_time: get_local_time(row, offset + 3)?,
            created_at: get_timestamp(row, offset + 4)?,
        })
    }
}

pub struct EventStore<'a> {
    conn: &'a Connection,
}

impl<'a> EventStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(
        &self,
        event_name: &str,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        now: DateTime<Utc>,
    ) -> Result<EventRecord> {
        self.conn.execute(
            "INSERT INTO events (event_name, start_time, end_time, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![event_name, local_time(start_time), local_time(end_time), timestamp(now)],
        )?;
        Ok(EventRecord {
            id: self.conn.last_insert_rowid(),
            event_name: event_name.to_string(),
            start_time,
            end_time,
            created_at: now,
        })
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<EventRecord>> {
        let sql = format!("SELECT {} FROM events WHERE id = ?1", EventRecord::COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, [id], |row| EventRecord::from_row_at(row, 0))
            .optional()?)
    }

    pub fn list(&self) -> Result<Vec<EventRecord>> {
        let sql = format!("SELECT {} FROM events ORDER BY start_time, id", EventRecord::COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| EventRecord::from_row_at(row, 0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update(
        &self,
        id: i64,
        event_name: &str,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE events SET event_name = ?1, start_time = ?2, end_time = ?3 WHERE id = ?4",
            params![event_name, local_time(start_time), local_time(end_time), id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM events WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    pub fn count(&self) -> Result<u64> {
        count(self.conn, "SELECT COUNT(*) FROM events", [])
    }
}

/// A user's registration for an event
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRecord {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub code: String,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

impl RegistrationRecord {
    const COLUMNS: &'static str = "r.id, r.user_id, r.event_id, r.code, r.status, r.created_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            event_id: row.get(2)?,
            code: row.get(3)?,
            status: row.get(4)?,
            created_at: get_timestamp(row, 5)?,
        })
    }
}

/// Registration joined with its attendee, for event rosters
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationWithUser {
    pub registration: RegistrationRecord,
    pub user_name: String,
    pub user_email: String,
}

/// Registration joined with its event, for an attendee's own listing
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationWithEvent {
    pub registration: RegistrationRecord,
    pub event: EventRecord,
}

pub struct RegistrationStore<'a> {
    conn: &'a Connection,
}

impl<'a> RegistrationStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(
        &self,
        user_id: i64,
        event_id: i64,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<RegistrationRecord> {
        let status = RegistrationStatus::Registered;
        self.conn
            .execute(
                "INSERT INTO registrations (user_id, event_id, code, status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, event_id, code, status, timestamp(now)],
            )
            .map_err(|e| {
                unique_violation(e, || {
                    format!("user {user_id} is already registered for event {event_id}")
                })
            })?;
        Ok(RegistrationRecord {
            id: self.conn.last_insert_rowid(),
            user_id,
            event_id,
            code: code.to_string(),
            status,
            created_at: now,
        })
    }

    pub fn exists(&self, user_id: i64, event_id: i64) -> Result<bool> {
        Ok(count(
            self.conn,
            "SELECT COUNT(*) FROM registrations WHERE user_id = ?1 AND event_id = ?2",
            [user_id, event_id],
        )? > 0)
    }

    pub fn find_by_code(&self, code: &str) -> Result<Option<RegistrationRecord>> {
        let sql = format!(
            "SELECT {} FROM registrations r WHERE r.code = ?1",
            RegistrationRecord::COLUMNS
        );
        Ok(self.conn.query_row(&sql, [code], RegistrationRecord::from_row).optional()?)
    }

    pub fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<RegistrationRecord>> {
        let sql = format!(
            "SELECT {} FROM registrations r WHERE r.id = ?1 AND r.user_id = ?2",
            RegistrationRecord::COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, [id, user_id], RegistrationRecord::from_row)
            .optional()?)
    }

    pub fn list_for_event(&self, event_id: i64) -> Result<Vec<RegistrationWithUser>> {
        let sql = format!(
            "SELECT {}, u.name, u.email FROM registrations r \
             JOIN users u ON u.id = r.user_id \
             WHERE r.event_id = ?1 ORDER BY r.id",
            RegistrationRecord::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([event_id], |row| {
            Ok(RegistrationWithUser {
                registration: RegistrationRecord::from_row(row)?,
                user_name: row.get(6)?,
                user_email: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_for_user(&self, user_id: i64) -> Result<Vec<RegistrationWithEvent>> {
        let sql = format!(
            "SELECT {}, e.id, e.event_name, e.start_time, e.end_time, e.created_at \
             FROM registrations r JOIN events e ON e.id = r.event_id \
             WHERE r.user_id = ?1 ORDER BY e.start_time, r.id",
            RegistrationRecord::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], |row| {
            Ok(RegistrationWithEvent {
                registration: RegistrationRecord::from_row(row)?,
                event: EventRecord::from_row_at(row, 6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count(&self) -> Result<u64> {
        count(self.conn, "SELECT COUNT(*) FROM registrations", [])
    }
}

/// Stored attendance mark
#[derive(Debug, Clone, PartialEq)]
pub struct MarkRecord {
    pub id: i64,
    pub registration_id: i64,
    pub event_type: AttendanceEventType,
    pub created_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
    pub meta: Option<serde_json::Value>,
}

impl MarkRecord {
    const COLUMNS: &'static str =
        "a.id, a.registration_id, a.event_type, a.created_at, a.idempotency_key, a.meta";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            registration_id: row.get(1)?,
            event_type: row.get(2)?,
            created_at: get_timestamp(row, 3)?,
            idempotency_key: row.get(4)?,
            meta: get_meta(row, 5)?,
        })
    }

    pub fn mark(&self) -> AttendanceMark {
        AttendanceMark::new(self.event_type, self.created_at)
    }
}

/// Mark joined with the name of the event it was recorded for
#[derive(Debug, Clone, PartialEq)]
pub struct UserMarkRecord {
    pub mark: MarkRecord,
    pub event_name: String,
}

/// Mark to be appended
#[derive(Debug, Clone)]
pub struct NewMark<'a> {
    pub registration_id: i64,
    pub event_type: AttendanceEventType,
    pub at: DateTime<Utc>,
    pub idempotency_key: Option<&'a str>,
    pub meta: Option<serde_json::Value>,
}

pub struct MarkStore<'a> {
    conn: &'a Connection,
}

impl<'a> MarkStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Marks of a registration in chronological order
    pub fn list(&self, registration_id: i64) -> Result<Vec<MarkRecord>> {
        let sql = format!(
            "SELECT {} FROM attendance_events a WHERE a.registration_id = ?1 \
             ORDER BY a.created_at, a.id",
            MarkRecord::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([registration_id], MarkRecord::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn last(&self, registration_id: i64) -> Result<Option<MarkRecord>> {
        let sql = format!(
            "SELECT {} FROM attendance_events a WHERE a.registration_id = ?1 \
             ORDER BY a.created_at DESC, a.id DESC LIMIT 1",
            MarkRecord::COLUMNS
        );
        Ok(self.conn.query_row(&sql, [registration_id], MarkRecord::from_row).optional()?)
    }

    pub fn find_by_idempotency_key(
        &self,
        registration_id: i64,
        key: &str,
    ) -> Result<Option<MarkRecord>> {
        let sql = format!(
            "SELECT {} FROM attendance_events a \
             WHERE a.registration_id = ?1 AND a.idempotency_key = ?2",
            MarkRecord::COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![registration_id, key], MarkRecord::from_row)
            .optional()?)
    }

    pub fn insert(&self, mark: &NewMark<'_>) -> Result<MarkRecord> {
        let meta = mark.meta.as_ref().map(serde_json::to_string).transpose()?;
        self.conn
            .execute(
                "INSERT INTO attendance_events \
                 (registration_id, event_type, created_at, idempotency_key, meta) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    mark.registration_id,
                    mark.event_type,
                    timestamp(mark.at),
                    mark.idempotency_key,
                    meta
                ],
            )
            .map_err(|e| {
                unique_violation(e, || {
                    format!(
                        "idempotency key {} was already used for registration {}",
                        mark.idempotency_key.unwrap_or_default(),
                        mark.registration_id
                    )
                })
            })?;
        let id = self.conn.last_insert_rowid();

        let status = registration_status(Some(mark.event_type));
        let updated = self.conn.execute(
            "UPDATE registrations SET status = ?1 WHERE id = ?2",
            params![status, mark.registration_id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("registration {}", mark.registration_id)));
        }

        Ok(MarkRecord {
            id,
            registration_id: mark.registration_id,
            event_type: mark.event_type,
            created_at: mark.at,
            idempotency_key: mark.idempotency_key.map(str::to_string),
            meta: mark.meta.clone(),
        })
    }

    /// Marks across all of a user's registrations, newest first
    pub fn list_for_user(&self, user_id: i64) -> Result<Vec<UserMarkRecord>> {
        let sql = format!(
            "SELECT {}, e.event_name FROM attendance_events a \
             JOIN registrations r ON r.id = a.registration_id \
             JOIN events e ON e.id = r.event_id \
             WHERE r.user_id = ?1 ORDER BY a.created_at DESC, a.id DESC",
            MarkRecord::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], |row| {
            Ok(UserMarkRecord {
                mark: MarkRecord::from_row(row)?,
                event_name: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_for_user(&self, user_id: i64, event_type: AttendanceEventType) -> Result<u64> {
        count(
            self.conn,
            "SELECT COUNT(*) FROM attendance_events a \
             JOIN registrations r ON r.id = a.registration_id \
             WHERE r.user_id = ?1 AND a.event_type = ?2",
            params![user_id, event_type],
        )
    }
}
