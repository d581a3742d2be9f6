use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("camera error: {0}")]
    Camera(#[from] rollcall_hw::CameraError),
    #[error("frame error: {0}")]
    Frame(#[from] rollcall_hw::FrameError),
    #[error("face analysis error: {0}")]
    Analyzer(#[from] rollcall_core::AnalyzerError),
    #[error("no encodings at {0}; run training first")]
    EncodingsMissing(String),
    #[error("encodings error: {0}")]
    Encodings(rollcall_core::EncodingsError),
    #[error("store error: {0}")]
    Store(#[from] rollcall_store::StoreError),
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid subject id {0:?}: must be non-empty without '_', '/', '\\' or whitespace")]
    InvalidSubject(String),
    #[error("cannot load font {path}: {reason}")]
    InvalidFont { path: String, reason: String },
    #[error("malformed upload: {0}")]
    MalformedUpload(String),
}

impl From<rollcall_core::EncodingsError> for EngineError {
    fn from(e: rollcall_core::EncodingsError) -> Self {
        match e {
            rollcall_core::EncodingsError::NotFound(path) => Self::EncodingsMissing(path),
            other => Self::Encodings(other),
        }
    }
}

impl EngineError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io { path: path.display().to_string(), source }
    }

    /// Whether the failure was the camera being unreachable.
    pub fn is_camera(&self) -> bool {
        matches!(self, Self::Camera(_))
    }
}
