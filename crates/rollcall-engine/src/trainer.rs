//! Builds the known-face encodings from the collected samples.

use crate::error::EngineError;
use crate::subject::label_from_file_name;
use crate::Config;
use rollcall_core::{EncodingSet, FaceAnalyzer};
use std::path::{Path, PathBuf};

/// Counts from one training run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainReport {
    pub encoded: usize,
    pub skipped_no_face: usize,
    pub skipped_unreadable: usize,
}

pub struct Trainer {
    data_dir: PathBuf,
    encodings_path: PathBuf,
}

impl Trainer {
    pub fn new(data_dir: impl Into<PathBuf>, encodings_path: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), encodings_path: encodings_path.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.data_dir.clone(), config.encodings_path.clone())
    }

    /// Encode every image in the data directory and overwrite the encodings
    /// file with the result.
    pub fn run(&self, analyzer: &mut dyn FaceAnalyzer) -> Result<(EncodingSet, TrainReport), EngineError> {
        let (set, report) = self.encode_all(analyzer)?;
        set.save(&self.encodings_path)?;
        tracing::info!(
            encoded = report.encoded,
            skipped_no_face = report.skipped_no_face,
            skipped_unreadable = report.skipped_unreadable,
            path = %self.encodings_path.display(),
            "training complete"
        );
        Ok((set, report))
    }

    /// One embedding per image: the first (most confident) face.
    pub fn encode_all(&self, analyzer: &mut dyn FaceAnalyzer) -> Result<(EncodingSet, TrainReport), EngineError> {
        let mut set = EncodingSet::default();
        let mut report = TrainReport::default();

        for path in sample_files(&self.data_dir)? {
            let Some(label) = label_from_file_name(&path) else {
                tracing::warn!(path = %path.display(), "no subject label in file name; skipping");
                report.skipped_unreadable += 1;
                continue;
            };

            let gray = match image::open(&path) {
                Ok(img) => img.to_luma8(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot decode image; skipping");
                    report.skipped_unreadable += 1;
                    continue;
                }
            };
            let (width, height) = gray.dimensions();

            let faces = analyzer.locate(gray.as_raw(), width, height)?;
            let Some(face) = faces.first() else {
                tracing::info!(path = %path.display(), "no face found; skipping");
                report.skipped_no_face += 1;
                continue;
            };

            let embedding = analyzer.encode(gray.as_raw(), width, height, face)?;
            tracing::debug!(path = %path.display(), label, "encoded sample");
            set.push(embedding, label);
            report.encoded += 1;
        }

        Ok((set, report))
    }
}

/// Regular files directly inside `dir`, sorted by name. A missing
/// directory has no files.
fn sample_files(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(dir = %dir.display(), "data directory does not exist");
            return Ok(Vec::new());
        }
        Err(e) => return Err(EngineError::io(dir, e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EngineError::io(dir, e))?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
