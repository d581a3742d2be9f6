//! rollcall-core: Face detection, embedding and matching.
//!
//! Uses SCRFD for face detection and ArcFace for face embeddings, both
//! running via ONNX Runtime on the CPU. Known faces are kept in an
//! [`EncodingSet`] and compared with the fixed-tolerance [`FirstMatchMatcher`].

pub mod alignment;
pub mod analyzer;
pub mod detector;
pub mod encodings;
pub mod recognizer;
pub mod types;

use std::path::PathBuf;

pub use analyzer::{AnalyzerError, FaceAnalyzer, OnnxAnalyzer};
pub use detector::FaceDetector;
pub use encodings::{EncodingSet, EncodingsError};
pub use recognizer::FaceRecognizer;
pub use types::{compare_faces, BoundingBox, Embedding, FirstMatchMatcher, MatchResult, Matcher, MATCH_TOLERANCE};

/// File name of the SCRFD detection model inside the model directory.
pub const SCRFD_MODEL_FILE: &str = "det_10g.onnx";
/// File name of the ArcFace recognition model inside the model directory.
pub const ARCFACE_MODEL_FILE: &str = "w600k_r50.onnx";

/// Default model directory: `$XDG_DATA_HOME/rollcall/models`, falling back
/// to `~/.local/share/rollcall/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("rollcall")
        .join("models")
}
