// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! SQLite persistence for the conference attendance service
//!
//! A [`Database`] owns a single connection guarded by a mutex. Table access
//! goes through small store types in [`models`] that borrow a connection, so
//! the same store code runs against a plain connection or inside a
//! transaction opened with [`Database::with_transaction`].

pub mod models;
pub mod schema;

pub use models::*;

use chrono::{DateTime, NaiveDateTime, Utc};
use conf_domain_types::AttendanceEventType;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Database errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Handle to the attendance database
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) a database file and bring its schema up to date
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(1_000))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        tracing::info!(path = %path.display(), "Opened attendance database");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Shared connection, for callers that need several store operations
    /// under one lock
    pub fn connection(&self) -> &Arc<Mutex<Connection>> {
        &self.conn
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::Poisoned)
    }

    /// Run `f` inside a transaction, committing only when it succeeds
    pub fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // Users

    pub fn insert_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord> {
        let conn = self.lock()?;
        UserStore::new(&conn).insert(name, email, password_hash, now)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let conn = self.lock()?;
        UserStore::new(&conn).find_by_email(email)
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRecord>> {
        let conn = self.lock()?;
        UserStore::new(&conn).get_by_id(id)
    }

    pub fn count_users(&self) -> Result<u64> {
        let conn = self.lock()?;
        UserStore::new(&conn).count()
    }

    /// Whether any account (attendee or staff) already uses `email`
    pub fn email_taken(&self, email: &str) -> Result<bool> {
        let conn = self.lock()?;
        Ok(UserStore::new(&conn).find_by_email(email)?.is_some()
            || AdminStore::new(&conn).find_by_email(email)?.is_some())
    }

    // Admins

    pub fn insert_admin(
        &self,
        staff_name: &str,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminRecord> {
        let conn = self.lock()?;
        AdminStore::new(&conn).insert(staff_name, email, password_hash, now)
    }

    pub fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminRecord>> {
        let conn = self.lock()?;
        AdminStore::new(&conn).find_by_email(email)
    }

    // Events

    pub fn insert_event(
        &self,
        event_name: &str,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        now: DateTime<Utc>,
    ) -> Result<EventRecord> {
        let conn = self.lock()?;
        EventStore::new(&conn).insert(event_name, start_time, end_time, now)
    }

    pub fn get_event(&self, id: i64) -> Result<Option<EventRecord>> {
        let conn = self.lock()?;
        EventStore::new(&conn).get_by_id(id)
    }

    pub fn list_events(&self) -> Result<Vec<EventRecord>> {
        let conn = self.lock()?;
        EventStore::new(&conn).list()
    }

    /// Returns `false` when no event has this id
    pub fn update_event(
        &self,
        id: i64,
        event_name: &str,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<bool> {
        let conn = self.lock()?;
        EventStore::new(&conn).update(id, event_name, start_time, end_time)
    }

    /// Delete an event together with its registrations and marks.
    /// Returns `false` when no event has this id.
    pub fn delete_event(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        EventStore::new(&conn).delete(id)
    }

    pub fn count_events(&self) -> Result<u64> {
        let conn = self.lock()?;
        EventStore::new(&conn).count()
    }

    // Registrations

    pub fn insert_registration(
        &self,
        user_id: i64,
        event_id: i64,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<RegistrationRecord> {
        let conn = self.lock()?;
        RegistrationStore::new(&conn).insert(user_id, event_id, code, now)
    }

    pub fn registration_exists(&self, user_id: i64, event_id: i64) -> Result<bool> {
        let conn = self.lock()?;
        RegistrationStore::new(&conn).exists(user_id, event_id)
    }

    pub fn find_registration_by_code(&self, code: &str) -> Result<Option<RegistrationRecord>> {
        let conn = self.lock()?;
        RegistrationStore::new(&conn).find_by_code(code)
    }

    /// Registration `id`, only if it belongs to `user_id`
    pub fn get_registration_for_user(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<RegistrationRecord>> {
        let conn = self.lock()?;
        RegistrationStore::new(&conn).get_for_user(id, user_id)
    }

    pub fn list_registrations_for_event(&self, event_id: i64) -> Result<Vec<RegistrationWithUser>> {
        let conn = self.lock()?;
        RegistrationStore::new(&conn).list_for_event(event_id)
    }

    pub fn list_registrations_for_user(&self, user_id: i64) -> Result<Vec<RegistrationWithEvent>> {
        let conn = self.lock()?;
        RegistrationStore::new(&conn).list_for_user(user_id)
    }

    pub fn count_registrations(&self) -> Result<u64> {
        let conn = self.lock()?;
        RegistrationStore::new(&conn).count()
    }

    // Attendance marks

    pub fn list_marks(&self, registration_id: i64) -> Result<Vec<MarkRecord>> {
        let conn = self.lock()?;
        MarkStore::new(&conn).list(registration_id)
    }

    pub fn last_mark(&self, registration_id: i64) -> Result<Option<MarkRecord>> {
        let conn = self.lock()?;
        MarkStore::new(&conn).last(registration_id)
    }

    pub fn find_mark_by_idempotency_key(
        &self,
        registration_id: i64,
        key: &str,
    ) -> Result<Option<MarkRecord>> {
        let conn = self.lock()?;
        MarkStore::new(&conn).find_by_idempotency_key(registration_id, key)
    }

    /// Append a mark and refresh the registration's stored status
    pub fn insert_mark(&self, mark: &NewMark<'_>) -> Result<MarkRecord> {
        let conn = self.lock()?;
        MarkStore::new(&conn).insert(mark)
    }

    /// Marks across all of a user's registrations, newest first
    pub fn list_marks_for_user(&self, user_id: i64) -> Result<Vec<UserMarkRecord>> {
        let conn = self.lock()?;
        MarkStore::new(&conn).list_for_user(user_id)
    }

    /// Number of marks of `event_type` across a user's registrations
    pub fn count_marks_for_user(
        &self,
        user_id: i64,
        event_type: AttendanceEventType,
    ) -> Result<u64> {
        let conn = self.lock()?;
        MarkStore::new(&conn).count_for_user(user_id, event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use conf_domain_types::RegistrationStatus;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 8, 0, 0).unwrap()
    }

    fn event_times() -> (NaiveDateTime, NaiveDateTime) {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        (day.and_hms_opt(9, 0, 0).unwrap(), day.and_hms_opt(17, 0, 0).unwrap())
    }

    fn seeded() -> (Database, UserRecord, EventRecord) {
        let db = Database::open_in_memory().unwrap();
        let user = db.insert_user("Ada", "ada@example.com", "hash", now()).unwrap();
        let (start, end) = event_times();
        let event = db.insert_event("RustConf", start, end, now()).unwrap();
        (db, user, event)
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let (db, _, _) = seeded();
        let err = db.insert_user("Ada 2", "ada@example.com", "hash", now()).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(db.email_taken("ada@example.com").unwrap());
        assert!(!db.email_taken("grace@example.com").unwrap());
    }

    #[test]
    fn test_event_crud() {
        let (db, _, event) = seeded();
        let (start, end) = event_times();

        assert_eq!(db.get_event(event.id).unwrap().unwrap().event_name, "RustConf");
        assert!(db.update_event(event.id, "RustConf 2025", start, end).unwrap());
        assert_eq!(db.list_events().unwrap()[0].event_name, "RustConf 2025");
        assert!(!db.update_event(9999, "Nope", start, end).unwrap());

        assert!(db.delete_event(event.id).unwrap());
        assert!(!db.delete_event(event.id).unwrap());
        assert_eq!(db.count_events().unwrap(), 0);
    }

    #[test]
    fn test_registration_pair_is_unique() {
        let (db, user, event) = seeded();
        db.insert_registration(user.id, event.id, "code-1", now()).unwrap();
        assert!(db.registration_exists(user.id, event.id).unwrap());

        let err = db.insert_registration(user.id, event.id, "code-2", now()).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_marks_update_stored_status_and_order() {
        let (db, user, event) = seeded();
        let reg = db.insert_registration(user.id, event.id, "code-1", now()).unwrap();
        assert_eq!(reg.status, RegistrationStatus::Registered);

        for (minutes, event_type) in [
            (0, AttendanceEventType::Checkin),
            (30, AttendanceEventType::Pause),
        ] {
            db.insert_mark(&NewMark {
                registration_id: reg.id,
                event_type,
                at: now() + chrono::Duration::minutes(minutes),
                idempotency_key: None,
                meta: None,
            })
            .unwrap();
        }

        let marks = db.list_marks(reg.id).unwrap();
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].event_type, AttendanceEventType::Checkin);
        assert_eq!(
            db.last_mark(reg.id).unwrap().unwrap().event_type,
            AttendanceEventType::Pause
        );

        let stored = db.find_registration_by_code("code-1").unwrap().unwrap();
        assert_eq!(stored.status, RegistrationStatus::Paused);
    }

    #[test]
    fn test_idempotency_key_unique_per_registration() {
        let (db, user, event) = seeded();
        let reg = db.insert_registration(user.id, event.id, "code-1", now()).unwrap();
        let mark = NewMark {
            registration_id: reg.id,
            event_type: AttendanceEventType::Checkin,
            at: now(),
            idempotency_key: Some("scan_1"),
            meta: Some(serde_json::json!({"idempotency": "scan_1"})),
        };
        db.insert_mark(&mark).unwrap();
        assert!(matches!(db.insert_mark(&mark), Err(Error::Conflict(_))));

        let found = db.find_mark_by_idempotency_key(reg.id, "scan_1").unwrap().unwrap();
        assert_eq!(found.meta.unwrap()["idempotency"], "scan_1");
    }

    #[test]
    fn test_delete_event_cascades() {
        let (db, user, event) = seeded();
        let reg = db.insert_registration(user.id, event.id, "code-1", now()).unwrap();
        db.insert_mark(&NewMark {
            registration_id: reg.id,
            event_type: AttendanceEventType::Checkin,
            at: now(),
            idempotency_key: None,
            meta: None,
        })
        .unwrap();

        assert!(db.delete_event(event.id).unwrap());
        assert_eq!(db.count_registrations().unwrap(), 0);
        assert!(db.list_marks(reg.id).unwrap().is_empty());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let (db, user, event) = seeded();
        let result: Result<()> = db.with_transaction(|tx| {
            RegistrationStore::new(tx).insert(user.id, event.id, "code-1", now())?;
            Err(Error::NotFound("forced".to_string()))
        });
        assert!(result.is_err());
        assert!(!db.registration_exists(user.id, event.id).unwrap());
    }
}
