use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rollcall_engine::EngineError;
use rollcall_store::StoreError;
use serde_json::json;

/// Handler error, rendered as `{"error": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn is_camera(&self) -> bool {
        matches!(self, AppError::Engine(e) if e.is_camera())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Engine(engine) => match engine {
                EngineError::InvalidSubject(_) | EngineError::MalformedUpload(_) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", engine.to_string())
                }
                EngineError::Camera(e) => {
                    tracing::error!(error = %e, "camera unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "CAMERA_UNAVAILABLE",
                        "Camera access failed".to_string(),
                    )
                }
                EngineError::EncodingsMissing(_) => {
                    (StatusCode::CONFLICT, "NOT_TRAINED", engine.to_string())
                }
                other => {
                    tracing::error!(error = %other, "engine error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },
            AppError::Store(err) => {
                tracing::error!(error = %err, "store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
