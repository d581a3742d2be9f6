//! rollcall-store: Attendance and subject persistence.
//!
//! One [`AttendanceRecorder`] interface with two interchangeable backends:
//! [`SqliteStore`] (relational, also the [`SubjectRegistry`]) and
//! [`CsvRecorder`] (a `Date,Name,Time` spreadsheet).

pub mod spreadsheet;
pub mod sqlite;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use thiserror::Error;

pub use spreadsheet::CsvRecorder;
pub use sqlite::SqliteStore;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("spreadsheet: {0}")]
    Csv(#[from] csv::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value {value:?} is not a valid {what}")]
    BadValue { what: &'static str, value: String },
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result of a mark-attendance call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    /// A new event was written.
    Marked { date: NaiveDate, time: NaiveTime },
    /// The subject already has an event today; nothing was written.
    AlreadyMarked,
    /// No subject with that identifier is enrolled; nothing was written.
    SubjectNotFound,
}

/// An enrolled person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub subject_id: String,
    pub name: String,
}

/// One attendance event, as listed on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceEntry {
    pub subject_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Records at most one attendance event per subject per calendar day.
///
/// The check-then-write is not atomic across processes.
pub trait AttendanceRecorder: Send + Sync {
    fn mark(&self, subject_id: &str) -> Result<MarkOutcome, StoreError>;
    fn list(&self) -> Result<Vec<AttendanceEntry>, StoreError>;
}

/// Enrolled subjects, keyed by their unique identifier.
pub trait SubjectRegistry: Send + Sync {
    /// Get-or-create; an existing subject gets its display name updated.
    /// Returns the stored subject and whether it was newly created.
    fn upsert_subject(&self, subject_id: &str, name: &str) -> Result<(Subject, bool), StoreError>;
    fn get_subject(&self, subject_id: &str) -> Result<Option<Subject>, StoreError>;
    fn list_subjects(&self) -> Result<Vec<Subject>, StoreError>;
}

/// Source of "now" for attendance stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Split a timestamp into the stored date and (whole-second) time.
fn stamp(clock: &dyn Clock) -> (NaiveDate, NaiveTime) {
    let now = clock.now();
    let time = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());
    (now.date(), time)
}

fn parse_date(value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| StoreError::BadValue {
        what: "date",
        value: value.to_string(),
    })
}

fn parse_time(value: &str) -> Result<NaiveTime, StoreError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|_| StoreError::BadValue {
        what: "time",
        value: value.to_string(),
    })
}
