use std::sync::Arc;

use rollcall_engine::{CollectReport, Config, EngineError, RecognitionOutcome, StopFlag, Stores, TrainReport};
use rollcall_store::AttendanceRecorder;

/// The camera-bound operations behind the web routes.
///
/// Every method blocks for the whole capture or training run; handlers call
/// them from `spawn_blocking`.
pub trait Pipelines: Send + Sync {
    fn collect(&self, config: &Config, subject_id: &str, name: &str) -> Result<CollectReport, EngineError>;
    fn train(&self, config: &Config) -> Result<TrainReport, EngineError>;
    fn recognize_once(
        &self,
        config: &Config,
        recorder: &dyn AttendanceRecorder,
    ) -> Result<RecognitionOutcome, EngineError>;
}

/// Runs the pipelines against the configured camera and ONNX models.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraPipelines;

impl Pipelines for CameraPipelines {
    fn collect(&self, config: &Config, subject_id: &str, name: &str) -> Result<CollectReport, EngineError> {
        // Nobody can press "q" over HTTP; the run ends at the sample quota.
        rollcall_engine::collect_subject(config, subject_id, name, &StopFlag::new())
    }

    fn train(&self, config: &Config) -> Result<TrainReport, EngineError> {
        rollcall_engine::train(config)
    }

    fn recognize_once(
        &self,
        config: &Config,
        recorder: &dyn AttendanceRecorder,
    ) -> Result<RecognitionOutcome, EngineError> {
        rollcall_engine::recognize_once(config, recorder, &StopFlag::new())
    }
}

/// Shared application state available to all handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Stores,
    pub pipelines: Arc<dyn Pipelines>,
}
