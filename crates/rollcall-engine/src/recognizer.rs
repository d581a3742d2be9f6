//! Live recognition: match faces in camera frames against the known set and
//! record attendance for whoever is recognised.

use crate::capture::{next_frame, LoopEnd, StopFlag};
use crate::error::EngineError;
use rollcall_core::{BoundingBox, EncodingSet, FaceAnalyzer, FirstMatchMatcher, Matcher};
use rollcall_hw::{Frame, FrameSource};
use rollcall_store::{AttendanceRecorder, MarkOutcome};
use std::collections::HashSet;
use std::path::Path;

/// A located face and who it was identified as.
#[derive(Debug, Clone)]
pub struct FaceAnnotation {
    pub bbox: BoundingBox,
    /// Subject label, or `"Unknown"`.
    pub label: String,
    pub matched: bool,
}

/// Receives every processed frame in interactive mode.
pub trait FrameSink {
    fn show(&mut self, frame: &Frame, faces: &[FaceAnnotation]) -> Result<(), EngineError>;
}

/// Result of [`RecognitionSession::run_once`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    /// A face matched `label` and attendance was recorded (or refused).
    Marked { label: String, outcome: MarkOutcome },
    /// The loop ended without any match.
    NoMatch { ended: LoopEnd },
}

impl RecognitionOutcome {
    /// Machine-readable status reported to web clients.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Marked { outcome: MarkOutcome::Marked { .. }, .. } => "success",
            Self::Marked { outcome: MarkOutcome::AlreadyMarked, .. } => "already_marked",
            Self::Marked { outcome: MarkOutcome::SubjectNotFound, .. } | Self::NoMatch { .. } => "not_found",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Marked { label, outcome: MarkOutcome::Marked { .. } } => {
                format!("Attendance marked for {label}.")
            }
            Self::Marked { outcome: MarkOutcome::AlreadyMarked, .. } => {
                "Attendance already marked today.".to_string()
            }
            Self::Marked { outcome: MarkOutcome::SubjectNotFound, .. } => {
                "No record found for this user.".to_string()
            }
            Self::NoMatch { .. } => "No record found.".to_string(),
        }
    }
}

/// Totals from [`RecognitionSession::run_interactive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveSummary {
    pub frames: usize,
    /// Each recognised subject once, with what the recorder said.
    pub marked: Vec<(String, MarkOutcome)>,
    pub ended: LoopEnd,
}

/// Known faces plus the recorder their attendance goes to.
pub struct RecognitionSession<'a> {
    known: EncodingSet,
    matcher: FirstMatchMatcher,
    recorder: &'a dyn AttendanceRecorder,
}

impl<'a> RecognitionSession<'a> {
    pub fn new(known: EncodingSet, recorder: &'a dyn AttendanceRecorder) -> Self {
        Self { known, matcher: FirstMatchMatcher, recorder }
    }

    /// Load the encodings written by training.
    pub fn load(encodings_path: &Path, recorder: &'a dyn AttendanceRecorder) -> Result<Self, EngineError> {
        let known = EncodingSet::load(encodings_path)?;
        if known.is_empty() {
            tracing::warn!(path = %encodings_path.display(), "encodings file holds no faces");
        }
        Ok(Self::new(known, recorder))
    }

    /// Locate, embed and identify every face in `frame`.
    pub fn identify(&self, analyzer: &mut dyn FaceAnalyzer, frame: &Frame) -> Result<Vec<FaceAnnotation>, EngineError> {
        let faces = analyzer.analyze(&frame.data, frame.width, frame.height)?;
        Ok(faces
            .into_iter()
            .map(|(bbox, embedding)| {
                let result = self.matcher.compare(&embedding, &self.known);
                FaceAnnotation {
                    bbox,
                    label: result.display_label().to_string(),
                    matched: result.is_match(),
                }
            })
            .collect())
    }

    /// Stop at the first recognised face and record its attendance.
    pub fn run_once(
        &self,
        source: &mut dyn FrameSource,
        analyzer: &mut dyn FaceAnalyzer,
        stop: &StopFlag,
    ) -> Result<RecognitionOutcome, EngineError> {
        let ended = loop {
            let frame = match next_frame(source, stop) {
                Ok(frame) => frame,
                Err(end) => break end,
            };

            let faces = self.identify(analyzer, &frame)?;
            if let Some(face) = faces.into_iter().find(|f| f.matched) {
                let outcome = self.recorder.mark(&face.label)?;
                tracing::info!(label = %face.label, ?outcome, "face recognised");
                return Ok(RecognitionOutcome::Marked { label: face.label, outcome });
            }
        };

        tracing::info!(?ended, "recognition ended without a match");
        Ok(RecognitionOutcome::NoMatch { ended })
    }

    /// Annotate frames until the operator quits or the source ends.
    ///
    /// Each recognised subject is recorded once per session; the recorder
    /// still refuses a second event on the same day.
    pub fn run_interactive(
        &self,
        source: &mut dyn FrameSource,
        analyzer: &mut dyn FaceAnalyzer,
        sink: &mut dyn FrameSink,
        stop: &StopFlag,
    ) -> Result<InteractiveSummary, EngineError> {
        let mut seen = HashSet::new();
        let mut marked = Vec::new();
        let mut frames = 0;

        let ended = loop {
            let frame = match next_frame(source, stop) {
                Ok(frame) => frame,
                Err(end) => break end,
            };
            frames += 1;

            let faces = self.identify(analyzer, &frame)?;
            for face in faces.iter().filter(|f| f.matched) {
                if seen.insert(face.label.clone()) {
                    let outcome = self.recorder.mark(&face.label)?;
                    tracing::info!(label = %face.label, ?outcome, "face recognised");
                    marked.push((face.label.clone(), outcome));
                }
            }
            sink.show(&frame, &faces)?;
        };

        tracing::info!(frames, marked = marked.len(), ?ended, "recognition loop finished");
        Ok(InteractiveSummary { frames, marked, ended })
    }
}
