//! Known-face encodings file.
//!
//! Stored as one JSON document holding two parallel sequences:
//! `{ "encodings": [[f32, ...], ...], "labels": ["s1", ...] }`.
//! The whole file is rewritten on every training run.

use crate::types::Embedding;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodingsError {
    #[error("encodings file not found: {0}; run training first")]
    NotFound(String),
    #[error("encodings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("encodings file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("encodings and labels differ in length ({encodings} vs {labels})")]
    LengthMismatch { encodings: usize, labels: usize },
    #[error("encoding {index} has dimension {found}, expected {expected}")]
    BadDimension { index: usize, found: usize, expected: usize },
}

/// On-disk shape: two parallel sequences.
#[derive(Serialize, Deserialize)]
struct StoredEncodings {
    encodings: Vec<Vec<f32>>,
    labels: Vec<String>,
}

/// Embeddings of known faces, each paired with its subject label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredEncodings", into = "StoredEncodings")]
pub struct EncodingSet {
    embeddings: Vec<Embedding>,
    labels: Vec<String>,
}

impl TryFrom<StoredEncodings> for EncodingSet {
    type Error = EncodingsError;

    fn try_from(stored: StoredEncodings) -> Result<Self, Self::Error> {
        if stored.encodings.len() != stored.labels.len() {
            return Err(EncodingsError::LengthMismatch {
                encodings: stored.encodings.len(),
                labels: stored.labels.len(),
            });
        }
        let expected = stored.encodings.first().map_or(0, Vec::len);
        for (index, values) in stored.encodings.iter().enumerate() {
            if values.is_empty() || values.len() != expected {
                return Err(EncodingsError::BadDimension {
                    index,
                    found: values.len(),
                    expected,
                });
            }
        }
        Ok(Self {
            embeddings: stored.encodings.into_iter().map(Embedding::new).collect(),
            labels: stored.labels,
        })
    }
}

impl From<EncodingSet> for StoredEncodings {
    fn from(set: EncodingSet) -> Self {
        Self {
            encodings: set.embeddings.into_iter().map(|e| e.values).collect(),
            labels: set.labels,
        }
    }
}

impl EncodingSet {
    pub fn push(&mut self, embedding: Embedding, label: impl Into<String>) {
        self.embeddings.push(embedding);
        self.labels.push(label.into());
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Load the whole set into memory.
    pub fn load(path: &Path) -> Result<Self, EncodingsError> {
        let raw = fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EncodingsError::NotFound(path.display().to_string())
            } else {
                EncodingsError::Io { path: path.display().to_string(), source: e }
            }
        })?;
        let set: EncodingSet = serde_json::from_slice(&raw)?;
        tracing::info!(path = %path.display(), count = set.len(), "loaded encodings");
        Ok(set)
    }

    /// Replace the file at `path` with this set.
    ///
    /// Writes a sibling temp file first and renames it over the target, so
    /// the previous file survives a failed write.
    pub fn save(&self, path: &Path) -> Result<(), EncodingsError> {
        let io_err = |source| EncodingsError::Io { path: path.display().to_string(), source };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec(self)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp).map_err(io_err)?;
            file.write_all(&json).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }
        fs::rename(&tmp, path).map_err(io_err)?;

        tracing::info!(path = %path.display(), count = self.len(), "saved encodings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_holds_parallel_sequences() {
        let mut set = EncodingSet::default();
        set.push(Embedding::new(vec![0.5, -0.5]), "s1");
        set.push(Embedding::new(vec![1.0, 0.0]), "s2");

        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["labels"], serde_json::json!(["s1", "s2"]));
        assert_eq!(value["encodings"][0], serde_json::json!([0.5, -0.5]));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face_encodings.json");

        let mut set = EncodingSet::default();
        set.push(Embedding::new(vec![0.25, 0.75]), "A");
        set.save(&path).unwrap();

        let loaded = EncodingSet::load(&path).unwrap();
        assert_eq!(loaded, set);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_save_overwrites_previous_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face_encodings.json");

        let mut first = EncodingSet::default();
        first.push(Embedding::new(vec![1.0]), "old");
        first.save(&path).unwrap();

        EncodingSet::default().save(&path).unwrap();
        assert!(EncodingSet::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EncodingSet::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, EncodingsError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_mismatched_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"encodings": [[1.0]], "labels": []}"#).unwrap();
        assert!(EncodingSet::load(&path).is_err());
    }

    #[test]
    fn test_load_rejects_empty_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"encodings": [[], [0.0, 1.0]], "labels": ["A", "B"]}"#).unwrap();
        let err = EncodingSet::load(&path).unwrap_err();
        assert!(err.to_string().contains("encoding 0 has dimension 0"), "{err}");
    }

    #[test]
    fn test_load_rejects_mixed_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"encodings": [[0.0, 1.0], [5.0]], "labels": ["A", "B"]}"#).unwrap();
        let err = EncodingSet::load(&path).unwrap_err();
        assert!(err.to_string().contains("encoding 1 has dimension 1, expected 2"), "{err}");
    }
}
