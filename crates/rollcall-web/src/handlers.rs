//! Route handlers. Camera, training and storage work runs on the blocking
//! pool and the request waits for it to finish.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::pages;
use crate::state::AppState;
use rollcall_engine::{validate_subject_id, EngineError, RecognitionOutcome};

/// `{status, message}` payload shared by the training and recognition routes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct SubjectForm {
    pub student_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FrameForm {
    pub student_id: Option<String>,
    pub name: Option<String>,
    pub image_data: Option<String>,
}

#[derive(Serialize)]
pub struct CollectResponse {
    pub message: String,
    pub saved: usize,
}

#[derive(Serialize)]
pub struct TrainResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub encoded: usize,
    pub skipped_no_face: usize,
    pub skipped_unreadable: usize,
}

async fn blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::InternalError(format!("blocking task failed: {e}")))?
}

fn required(field: Option<String>, what: &str) -> AppResult<String> {
    match field.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(format!("{what} is required"))),
    }
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET / -- every recorded attendance event.
pub async fn home(State(state): State<AppState>) -> AppResult<Html<String>> {
    let recorder = state.stores.recorder.clone();
    let entries = blocking(move || Ok(recorder.list()?)).await?;
    Ok(Html(pages::home(&entries)))
}

/// GET /collect_data/
pub async fn collect_form() -> Html<String> {
    Html(pages::collect_form())
}

/// POST /collect_data/ -- enrol (or rename) the subject, then capture samples.
pub async fn collect_data(State(state): State<AppState>, Form(form): Form<SubjectForm>) -> AppResult<Json<CollectResponse>> {
    let subject_id = required(form.student_id, "student_id")?;
    let name = required(form.name, "name")?;
    validate_subject_id(&subject_id).map_err(AppError::from)?;

    let report = blocking(move || {
        let (subject, created) = state.stores.subjects.upsert_subject(&subject_id, &name)?;
        tracing::info!(subject_id = %subject.subject_id, created, "subject saved");
        let report = state.pipelines.collect(&state.config, &subject_id, &name)?;
        Ok((subject, report))
    })
    .await;
    let (subject, report) = report?;

    Ok(Json(CollectResponse {
        message: format!(
            "Data collection completed for {} (ID: {})",
            subject.name, subject.subject_id
        ),
        saved: report.saved.len(),
    }))
}

/// POST /receive_frame/ -- store one browser-captured frame.
///
/// Failures use this route's own `{status: "failure", error}` shape.
pub async fn receive_frame(State(state): State<AppState>, Form(form): Form<FrameForm>) -> Response {
    let (Some(subject_id), Some(image_data)) = (form.student_id, form.image_data) else {
        return frame_failure("Invalid request".to_string());
    };
    tracing::debug!(subject_id = %subject_id, name = ?form.name, "frame received");

    let data_dir = state.config.data_dir.clone();
    let saved = blocking(move || {
        Ok(rollcall_engine::save_upload(&data_dir, &subject_id, &image_data, chrono::Utc::now())?)
    })
    .await;

    match saved {
        Ok(path) => {
            let filename = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            Json(serde_json::json!({ "status": "success", "filename": filename })).into_response()
        }
        Err(AppError::Engine(e @ (EngineError::InvalidSubject(_) | EngineError::MalformedUpload(_)))) => {
            frame_failure(e.to_string())
        }
        Err(other) => other.into_response(),
    }
}

/// GET /receive_frame/
pub async fn receive_frame_get() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "status": "failure", "error": "Invalid request" })),
    )
        .into_response()
}

fn frame_failure(error: String) -> Response {
    tracing::warn!(error = %error, "rejected uploaded frame");
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "status": "failure", "error": error })),
    )
        .into_response()
}

/// GET /train_model/
pub async fn train_page() -> Html<String> {
    Html(pages::train_page())
}

/// POST /train_model/
pub async fn train_model(State(state): State<AppState>) -> AppResult<Json<TrainResponse>> {
    let report = blocking(move || Ok(state.pipelines.train(&state.config)?)).await?;
    Ok(Json(TrainResponse {
        status: "success",
        message: "Model training completed.",
        encoded: report.encoded,
        skipped_no_face: report.skipped_no_face,
        skipped_unreadable: report.skipped_unreadable,
    }))
}

/// GET /recognize_faces/
pub async fn recognize_page() -> Html<String> {
    Html(pages::recognize_page())
}

/// POST /recognize_faces/ and POST /start_recognition/ -- run recognition
/// until the first match and report what happened.
pub async fn recognize(State(state): State<AppState>) -> Response {
    let outcome = blocking(move || {
        Ok(state
            .pipelines
            .recognize_once(&state.config, state.stores.recorder.as_ref())?)
    })
    .await;
    recognition_response(outcome)
}

/// GET /start_recognition/
pub async fn start_recognition_get() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "error": "Invalid request method." })),
    )
        .into_response()
}

fn recognition_response(outcome: AppResult<RecognitionOutcome>) -> Response {
    match outcome {
        Ok(outcome) => Json(StatusResponse {
            status: outcome.status(),
            message: outcome.message(),
        })
        .into_response(),
        Err(e) if e.is_camera() => {
            tracing::error!(error = %e, "recognition could not open a camera");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(StatusResponse {
                    status: "error",
                    message: "Camera access failed".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}
