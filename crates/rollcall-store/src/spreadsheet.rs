//! Spreadsheet backend: a CSV file with a `Date,Name,Time` header.
//!
//! Every mark reads the whole sheet, scans it for today's row and, when
//! absent, rewrites the whole sheet with the new row appended. No locking.

use crate::{
    parse_date, parse_time, stamp, AttendanceEntry, AttendanceRecorder, Clock, LocalClock,
    MarkOutcome, StoreError, DATE_FORMAT, TIME_FORMAT,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const HEADER: [&str; 3] = ["Date", "Name", "Time"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SheetRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Time")]
    time: String,
}

/// Attendance kept in a single CSV spreadsheet.
pub struct CsvRecorder {
    path: PathBuf,
    clock: Box<dyn Clock>,
}

impl CsvRecorder {
    /// Use the sheet at `path`, creating it with just the header if absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let recorder = Self { path: path.into(), clock: Box::new(LocalClock) };
        if !recorder.path.exists() {
            if let Some(parent) = recorder.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            recorder.write_rows(&[])?;
            tracing::info!(path = %recorder.path.display(), "created attendance sheet");
        }
        Ok(recorder)
    }

    /// Replace the clock used to stamp attendance events.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A sheet removed since `open` reads as empty; the next mark recreates it.
    fn read_rows(&self) -> Result<Vec<SheetRow>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "attendance sheet missing, starting a new one");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let mut reader = csv::Reader::from_reader(file);
        let rows = reader.deserialize().collect::<Result<Vec<SheetRow>, _>>()?;
        Ok(rows)
    }

    fn write_rows(&self, rows: &[SheetRow]) -> Result<(), StoreError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;
        writer.write_record(HEADER)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl AttendanceRecorder for CsvRecorder {
    fn mark(&self, subject_id: &str) -> Result<MarkOutcome, StoreError> {
        let (date, time) = stamp(self.clock.as_ref());
        let today = date.format(DATE_FORMAT).to_string();

        let mut rows = self.read_rows()?;
        if rows.iter().any(|r| r.date == today && r.name == subject_id) {
            tracing::info!(subject_id, date = %today, "attendance already marked today");
            return Ok(MarkOutcome::AlreadyMarked);
        }

        rows.push(SheetRow {
            date: today,
            name: subject_id.to_string(),
            time: time.format(TIME_FORMAT).to_string(),
        });
        self.write_rows(&rows)?;

        tracing::info!(subject_id, %date, %time, "attendance marked");
        Ok(MarkOutcome::Marked { date, time })
    }

    fn list(&self) -> Result<Vec<AttendanceEntry>, StoreError> {
        self.read_rows()?
            .into_iter()
            .map(|row| {
                Ok(AttendanceEntry {
                    date: parse_date(&row.date)?,
                    time: parse_time(&row.time)?,
                    name: row.name.clone(),
                    subject_id: row.name,
                })
            })
            .collect()
    }
}
