//! SQLite backend: `subjects` and `attendance` tables.

use crate::{
    parse_date, parse_time, stamp, AttendanceEntry, AttendanceRecorder, Clock, LocalClock,
    MarkOutcome, StoreError, Subject, SubjectRegistry, DATE_FORMAT, TIME_FORMAT,
};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS subjects (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id  TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS attendance (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_ref  INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
    date         TEXT NOT NULL,
    time         TEXT NOT NULL,
    UNIQUE (subject_ref, date)
);
"#;

/// Relational attendance store and subject registry.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    clock: Box<dyn Clock>,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "opened attendance database");
        Self::with_connection(conn, Box::new(LocalClock))
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, Box::new(LocalClock))
    }

    /// Replace the clock used to stamp attendance events.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn with_connection(conn: Connection, clock: Box<dyn Clock>) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn), clock })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl AttendanceRecorder for SqliteStore {
    fn mark(&self, subject_id: &str) -> Result<MarkOutcome, StoreError> {
        let conn = self.conn()?;

        let subject_ref: Option<i64> = conn
            .query_row(
                "SELECT id FROM subjects WHERE subject_id = ?1",
                [subject_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(subject_ref) = subject_ref else {
            tracing::warn!(subject_id, "no record found for subject");
            return Ok(MarkOutcome::SubjectNotFound);
        };

        let (date, time) = stamp(self.clock.as_ref());
        let date_str = date.format(DATE_FORMAT).to_string();

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM attendance WHERE subject_ref = ?1 AND date = ?2)",
            params![subject_ref, date_str],
            |row| row.get(0),
        )?;
        if exists {
            tracing::info!(subject_id, %date, "attendance already marked today");
            return Ok(MarkOutcome::AlreadyMarked);
        }

        let inserted = conn.execute(
            "INSERT INTO attendance (subject_ref, date, time) VALUES (?1, ?2, ?3)",
            params![subject_ref, date_str, time.format(TIME_FORMAT).to_string()],
        );
        match inserted {
            Ok(_) => {
                tracing::info!(subject_id, %date, %time, "attendance marked");
                Ok(MarkOutcome::Marked { date, time })
            }
            // Another writer got there between the check and the insert.
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Ok(MarkOutcome::AlreadyMarked)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<AttendanceEntry>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.subject_id, s.name, a.date, a.time
            FROM attendance a
            JOIN subjects s ON s.id = a.subject_ref
            ORDER BY a.date, a.time, a.id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let entries = rows
            .map(|row| {
                let (subject_id, name, date, time) = row?;
                Ok(AttendanceEntry {
                    subject_id,
                    name,
                    date: parse_date(&date)?,
                    time: parse_time(&time)?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(entries)
    }
}

impl SubjectRegistry for SqliteStore {
    fn upsert_subject(&self, subject_id: &str, name: &str) -> Result<(Subject, bool), StoreError> {
        let conn = self.conn()?;

        let existing: Option<String> = conn
            .query_row(
                "SELECT name FROM subjects WHERE subject_id = ?1",
                [subject_id],
                |row| row.get(0),
            )
            .optional()?;

        let created = match existing {
            None => {
                conn.execute(
                    "INSERT INTO subjects (subject_id, name) VALUES (?1, ?2)",
                    params![subject_id, name],
                )?;
                true
            }
            Some(current) if current != name => {
                conn.execute(
                    "UPDATE subjects SET name = ?2 WHERE subject_id = ?1",
                    params![subject_id, name],
                )?;
                false
            }
            Some(_) => false,
        };

        tracing::info!(subject_id, name, created, "subject saved");
        Ok((
            Subject { subject_id: subject_id.to_string(), name: name.to_string() },
            created,
        ))
    }

    fn get_subject(&self, subject_id: &str) -> Result<Option<Subject>, StoreError> {
        let conn = self.conn()?;
        let subject = conn
            .query_row(
                "SELECT subject_id, name FROM subjects WHERE subject_id = ?1",
                [subject_id],
                |row| Ok(Subject { subject_id: row.get(0)?, name: row.get(1)? }),
            )
            .optional()?;
        Ok(subject)
    }

    fn list_subjects(&self) -> Result<Vec<Subject>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT subject_id, name FROM subjects ORDER BY subject_id")?;
        let subjects = stmt
            .query_map([], |row| Ok(Subject { subject_id: row.get(0)?, name: row.get(1)? }))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subjects)
    }
}
