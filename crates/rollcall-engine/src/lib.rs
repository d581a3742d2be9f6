//! rollcall-engine: Configuration and the capture pipelines.
//!
//! [`Collector`] gathers face samples, [`Trainer`] turns them into the
//! known-face encodings, and [`RecognitionSession`] matches live faces and
//! records attendance. Each takes its camera as a [`rollcall_hw::FrameSource`]
//! and its models as a [`rollcall_core::FaceAnalyzer`], so the same code serves
//! the CLI and the web surface.

pub mod capture;
pub mod collector;
pub mod config;
pub mod error;
pub mod preview;
pub mod recognizer;
pub mod subject;
pub mod trainer;
pub mod upload;

#[cfg(test)]
mod testing;

pub use capture::{LoopEnd, StopFlag};
pub use collector::{CollectReport, Collector};
pub use config::{Config, ConfigError, StoreKind, Stores};
pub use error::EngineError;
pub use preview::PreviewSink;
pub use recognizer::{FaceAnnotation, FrameSink, InteractiveSummary, RecognitionOutcome, RecognitionSession};
pub use subject::validate_subject_id;
pub use trainer::{TrainReport, Trainer};
pub use upload::save_upload;

/// Open the camera, load the models and collect samples for one subject.
pub fn collect_subject(
    config: &Config,
    subject_id: &str,
    name: &str,
    stop: &StopFlag,
) -> Result<CollectReport, EngineError> {
    validate_subject_id(subject_id)?;
    let mut camera = config.open_camera()?;
    let mut analyzer = config.load_analyzer()?;
    Collector::from_config(config).run(subject_id, name, &mut camera, &mut analyzer, stop)
}

/// Load the models and retrain from the data directory.
pub fn train(config: &Config) -> Result<TrainReport, EngineError> {
    let mut analyzer = config.load_analyzer()?;
    let (_, report) = Trainer::from_config(config).run(&mut analyzer)?;
    Ok(report)
}

/// Recognise faces until the first match and record it.
///
/// The encodings are loaded before the camera is opened, so a missing file
/// is reported without touching the device.
pub fn recognize_once(
    config: &Config,
    recorder: &dyn rollcall_store::AttendanceRecorder,
    stop: &StopFlag,
) -> Result<RecognitionOutcome, EngineError> {
    let session = RecognitionSession::load(&config.encodings_path, recorder)?;
    let mut camera = config.open_camera()?;
    let mut analyzer = config.load_analyzer()?;
    session.run_once(&mut camera, &mut analyzer, stop)
}
