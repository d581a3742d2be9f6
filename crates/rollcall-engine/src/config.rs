use crate::error::EngineError;
use rollcall_core::{AnalyzerError, OnnxAnalyzer, ARCFACE_MODEL_FILE, SCRFD_MODEL_FILE};
use rollcall_hw::{Camera, CameraError};
use rollcall_store::{AttendanceRecorder, CsvRecorder, SqliteStore, SubjectRegistry};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Which attendance backend records events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Sqlite,
    Csv,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "csv" | "spreadsheet" => Ok(Self::Csv),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Runtime configuration.
///
/// Layers, lowest first: built-in defaults, the TOML file named by
/// `ROLLCALL_CONFIG`, then individual `ROLLCALL_*` variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Capture devices tried in order (default: /dev/video0, /dev/video1).
    pub camera_devices: Vec<String>,
    /// Directory containing the ONNX model files.
    pub model_dir: PathBuf,
    /// Flat directory of collected face images.
    pub data_dir: PathBuf,
    /// Known-face encodings written by training.
    pub encodings_path: PathBuf,
    /// Attendance backend.
    pub store: StoreKind,
    /// Spreadsheet used by the CSV backend.
    pub attendance_csv: PathBuf,
    /// SQLite database (subjects, and attendance for the sqlite backend).
    pub db_path: PathBuf,
    /// Face images saved per collection run.
    pub samples_per_subject: usize,
    /// Web server listen address.
    pub listen_addr: String,
    /// Annotated preview written by the interactive recognizer.
    pub preview_path: PathBuf,
    /// Font for the preview labels; boxes only when unset or unreadable.
    pub preview_font: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_devices: vec!["/dev/video0".to_string(), "/dev/video1".to_string()],
            model_dir: rollcall_core::default_model_dir(),
            data_dir: PathBuf::from("face_data"),
            encodings_path: PathBuf::from("face_encodings.json"),
            store: StoreKind::Sqlite,
            attendance_csv: PathBuf::from("attendance.csv"),
            db_path: PathBuf::from("attendance.db"),
            samples_per_subject: 20,
            listen_addr: "127.0.0.1:8000".to_string(),
            preview_path: PathBuf::from("preview.jpg"),
            preview_font: Some(PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf")),
        }
    }
}

impl Config {
    /// Load configuration from the environment (and `ROLLCALL_CONFIG`, if set).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Like [`from_env`](Self::from_env), but an explicit `file` takes the
    /// place of `ROLLCALL_CONFIG`.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let env_file = std::env::var_os("ROLLCALL_CONFIG").map(PathBuf::from);
        let mut config = match file.or(env_file.as_deref()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply `ROLLCALL_*` overrides read through `lookup`.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("ROLLCALL_CAMERA_DEVICES") {
            let devices: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect();
            if !devices.is_empty() {
                self.camera_devices = devices;
            }
        }

        let path_vars: [(&str, &mut PathBuf); 6] = [
            ("ROLLCALL_MODEL_DIR", &mut self.model_dir),
            ("ROLLCALL_DATA_DIR", &mut self.data_dir),
            ("ROLLCALL_ENCODINGS_PATH", &mut self.encodings_path),
            ("ROLLCALL_ATTENDANCE_CSV", &mut self.attendance_csv),
            ("ROLLCALL_DB_PATH", &mut self.db_path),
            ("ROLLCALL_PREVIEW_PATH", &mut self.preview_path),
        ];
        for (key, slot) in path_vars {
            if let Some(v) = lookup(key) {
                *slot = PathBuf::from(v);
            }
        }

        if let Some(v) = lookup("ROLLCALL_PREVIEW_FONT") {
            self.preview_font = (!v.trim().is_empty()).then(|| PathBuf::from(v));
        }

        if let Some(v) = lookup("ROLLCALL_STORE") {
            match v.parse() {
                Ok(kind) => self.store = kind,
                Err(e) => tracing::warn!(error = %e, "ignoring ROLLCALL_STORE"),
            }
        }
        if let Some(v) = lookup("ROLLCALL_SAMPLES_PER_SUBJECT") {
            match v.parse::<usize>() {
                Ok(n) if n > 0 => self.samples_per_subject = n,
                _ => tracing::warn!(value = %v, "ignoring ROLLCALL_SAMPLES_PER_SUBJECT"),
            }
        }
        if let Some(v) = lookup("ROLLCALL_LISTEN_ADDR") {
            self.listen_addr = v;
        }
    }

    /// Path to the SCRFD detection model.
    pub fn scrfd_model_path(&self) -> String {
        self.model_dir.join(SCRFD_MODEL_FILE).to_string_lossy().into_owned()
    }

    /// Path to the ArcFace recognition model.
    pub fn arcface_model_path(&self) -> String {
        self.model_dir.join(ARCFACE_MODEL_FILE).to_string_lossy().into_owned()
    }

    /// Load both ONNX models.
    pub fn load_analyzer(&self) -> Result<OnnxAnalyzer, AnalyzerError> {
        OnnxAnalyzer::load(&self.scrfd_model_path(), &self.arcface_model_path())
    }

    /// Open the first available configured camera.
    pub fn open_camera(&self) -> Result<Camera, CameraError> {
        Camera::open_first(&self.camera_devices)
    }

    /// Open the configured attendance backend and the subject registry.
    pub fn open_stores(&self) -> Result<Stores, EngineError> {
        let db = Arc::new(SqliteStore::open(&self.db_path)?);
        let recorder: Arc<dyn AttendanceRecorder> = match self.store {
            StoreKind::Sqlite => db.clone(),
            StoreKind::Csv => Arc::new(CsvRecorder::open(&self.attendance_csv)?),
        };
        tracing::info!(backend = ?self.store, "attendance store ready");
        Ok(Stores { recorder, subjects: db })
    }
}

/// Attendance backend plus the subject registry (always relational).
#[derive(Clone)]
pub struct Stores {
    pub recorder: Arc<dyn AttendanceRecorder>,
    pub subjects: Arc<dyn SubjectRegistry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.camera_devices, vec!["/dev/video0", "/dev/video1"]);
        assert_eq!(config.samples_per_subject, 20);
        assert_eq!(config.store, StoreKind::Sqlite);
        assert!(config.scrfd_model_path().ends_with("det_10g.onnx"));
        assert!(config.arcface_model_path().ends_with("w600k_r50.onnx"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("ROLLCALL_CAMERA_DEVICES", "/dev/video2, /dev/video4"),
            ("ROLLCALL_DATA_DIR", "/srv/faces"),
            ("ROLLCALL_STORE", "CSV"),
            ("ROLLCALL_SAMPLES_PER_SUBJECT", "5"),
            ("ROLLCALL_PREVIEW_FONT", ""),
        ]));
        assert_eq!(config.camera_devices, vec!["/dev/video2", "/dev/video4"]);
        assert_eq!(config.data_dir, PathBuf::from("/srv/faces"));
        assert_eq!(config.store, StoreKind::Csv);
        assert_eq!(config.samples_per_subject, 5);
        assert_eq!(config.preview_font, None);
    }

    #[test]
    fn test_bad_env_values_keep_defaults() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("ROLLCALL_STORE", "mongodb"),
            ("ROLLCALL_SAMPLES_PER_SUBJECT", "0"),
            ("ROLLCALL_CAMERA_DEVICES", " , "),
        ]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_toml_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollcall.toml");
        std::fs::write(&path, "store = \"csv\"\nattendance_csv = \"/tmp/a.csv\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.store, StoreKind::Csv);
        assert_eq!(config.attendance_csv, PathBuf::from("/tmp/a.csv"));
        assert_eq!(config.samples_per_subject, 20);
    }

    #[test]
    fn test_toml_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollcall.toml");
        std::fs::write(&path, "encodings = \"x\"\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_open_stores_csv_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            store: StoreKind::Csv,
            attendance_csv: dir.path().join("attendance.csv"),
            db_path: dir.path().join("attendance.db"),
            ..Config::default()
        };
        let stores = config.open_stores().unwrap();
        stores.subjects.upsert_subject("s1", "Alice").unwrap();
        stores.recorder.mark("s1").unwrap();
        assert!(config.attendance_csv.exists());
        assert_eq!(stores.recorder.list().unwrap().len(), 1);
    }
}
