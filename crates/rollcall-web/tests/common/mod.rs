#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use rollcall_engine::{
    CollectReport, Config, EngineError, LoopEnd, RecognitionOutcome, StoreKind, TrainReport,
};
use rollcall_hw::CameraError;
use rollcall_store::AttendanceRecorder;
use rollcall_web::{build_app_router, AppState, Pipelines};

/// What the fake camera "sees".
#[derive(Debug, Clone)]
pub enum Scene {
    /// A face matching this label is in view.
    Face(&'static str),
    /// Only unknown faces.
    Nobody,
    /// No camera can be opened.
    NoCamera,
}

pub struct FakePipelines {
    pub scene: Scene,
}

fn no_camera() -> EngineError {
    EngineError::Camera(CameraError::Unavailable {
        tried: vec!["/dev/video0".into(), "/dev/video1".into()],
    })
}

impl Pipelines for FakePipelines {
    fn collect(&self, _config: &Config, _subject_id: &str, _name: &str) -> Result<CollectReport, EngineError> {
        match self.scene {
            Scene::NoCamera => Err(no_camera()),
            _ => Ok(CollectReport { saved: Vec::new(), ended: LoopEnd::Completed }),
        }
    }

    fn train(&self, _config: &Config) -> Result<TrainReport, EngineError> {
        Ok(TrainReport { encoded: 3, skipped_no_face: 1, skipped_unreadable: 0 })
    }

    fn recognize_once(
        &self,
        _config: &Config,
        recorder: &dyn AttendanceRecorder,
    ) -> Result<RecognitionOutcome, EngineError> {
        match self.scene {
            Scene::Face(label) => Ok(RecognitionOutcome::Marked {
                label: label.to_string(),
                outcome: recorder.mark(label)?,
            }),
            Scene::Nobody => Ok(RecognitionOutcome::NoMatch { ended: LoopEnd::EndOfStream }),
            Scene::NoCamera => Err(no_camera()),
        }
    }
}

/// A test application rooted in `dir`, using SQLite for everything.
pub fn build_test_app(dir: &std::path::Path, scene: Scene) -> Router {
    let config = Config {
        data_dir: dir.join("face_data"),
        encodings_path: dir.join("face_encodings.json"),
        store: StoreKind::Sqlite,
        db_path: dir.join("attendance.db"),
        attendance_csv: dir.join("attendance.csv"),
        ..Config::default()
    };
    let stores = config.open_stores().unwrap();

    build_app_router(AppState {
        config: Arc::new(config),
        stores,
        pipelines: Arc::new(FakePipelines { scene }),
    })
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: Router, uri: &str, form: &[(&str, &str)]) -> Response<Body> {
    let body = serde_urlencoded::to_string(form).unwrap();
    app.oneshot(
        Request::post(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
