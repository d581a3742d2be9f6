//! Face sample collection for one subject.

use crate::capture::{next_frame, LoopEnd, StopFlag};
use crate::error::EngineError;
use crate::subject::{file_safe_name, validate_subject_id};
use crate::Config;
use rollcall_core::FaceAnalyzer;
use rollcall_hw::{CropRect, FrameSource};
use std::path::PathBuf;

/// Outcome of a collection run.
#[derive(Debug)]
pub struct CollectReport {
    /// Files written, in order.
    pub saved: Vec<PathBuf>,
    pub ended: LoopEnd,
}

/// Crops detected faces out of camera frames into `data_dir`.
pub struct Collector {
    data_dir: PathBuf,
    max_samples: usize,
}

impl Collector {
    pub fn new(data_dir: impl Into<PathBuf>, max_samples: usize) -> Self {
        Self { data_dir: data_dir.into(), max_samples }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.data_dir.clone(), config.samples_per_subject)
    }

    /// Save up to `max_samples` face crops as `{subject}_{name}_{n}.jpg`.
    ///
    /// Every face found in a frame is saved, so several faces in view all
    /// count toward the quota. A failed frame read ends the run early; the
    /// files already written stay on disk.
    pub fn run(
        &self,
        subject_id: &str,
        name: &str,
        source: &mut dyn FrameSource,
        analyzer: &mut dyn FaceAnalyzer,
        stop: &StopFlag,
    ) -> Result<CollectReport, EngineError> {
        let subject_id = validate_subject_id(subject_id)?;
        let name = file_safe_name(name);
        std::fs::create_dir_all(&self.data_dir).map_err(|e| EngineError::io(&self.data_dir, e))?;

        tracing::info!(subject_id, name = %name, max = self.max_samples, "collecting face samples");

        let mut saved = Vec::with_capacity(self.max_samples);
        let ended = 'frames: loop {
            if saved.len() >= self.max_samples {
                break LoopEnd::Completed;
            }
            let frame = match next_frame(source, stop) {
                Ok(frame) => frame,
                Err(end) => break end,
            };

            let faces = analyzer.locate(&frame.data, frame.width, frame.height)?;
            for face in &faces {
                let Some(rect) =
                    CropRect::clamped(face.x, face.y, face.width, face.height, frame.width, frame.height)
                else {
                    tracing::debug!(?face, "face box lies outside the frame");
                    continue;
                };

                let path = self.data_dir.join(format!("{subject_id}_{name}_{}.jpg", saved.len()));
                frame.save_crop_jpeg(rect, &path)?;
                tracing::info!(subject_id, count = saved.len() + 1, path = %path.display(), "saved face sample");
                saved.push(path);

                if saved.len() >= self.max_samples {
                    break 'frames LoopEnd::Completed;
                }
            }
        };

        tracing::info!(subject_id, saved = saved.len(), ended = ?ended, "collection finished");
        Ok(CollectReport { saved, ended })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{gray_frame, FakeAnalyzer, ScriptedSource};
    use rollcall_hw::CameraError;

    #[test]
    fn test_stops_at_quota_mid_frame() {
        let dir = tempfile::tempdir().unwrap();
        let collector = Collector::new(dir.path(), 5);
        let mut source = ScriptedSource::levels(&[100; 10]);
        let mut analyzer = FakeAnalyzer { faces_per_frame: 2 };

        let report = collector
            .run("s1", "Ada", &mut source, &mut analyzer, &StopFlag::new())
            .unwrap();

        assert_eq!(report.ended, LoopEnd::Completed);
        assert_eq!(report.saved.len(), 5);
        assert_eq!(source.reads, 3);
        assert_eq!(report.saved[0], dir.path().join("s1_Ada_0.jpg"));
        assert_eq!(report.saved[4], dir.path().join("s1_Ada_4.jpg"));
        assert!(report.saved.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_frames_without_faces_save_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let collector = Collector::new(dir.path().join("faces"), 20);
        let mut source = ScriptedSource::levels(&[10, 100, 10]);

        let report = collector
            .run("s2", "Bo/b", &mut source, &mut FakeAnalyzer::default(), &StopFlag::new())
            .unwrap();

        assert_eq!(report.ended, LoopEnd::EndOfStream);
        assert_eq!(report.saved, vec![dir.path().join("faces").join("s2_Bo-b_0.jpg")]);
    }

    #[test]
    fn test_frame_failure_keeps_saved_files() {
        let dir = tempfile::tempdir().unwrap();
        let collector = Collector::new(dir.path(), 20);
        let mut source = ScriptedSource::new(vec![
            Ok(gray_frame(100)),
            Err(CameraError::CaptureFailed("dequeue failed".into())),
            Ok(gray_frame(100)),
        ]);

        let report = collector
            .run("s3", "Cy", &mut source, &mut FakeAnalyzer::default(), &StopFlag::new())
            .unwrap();

        assert!(matches!(report.ended, LoopEnd::FrameError(_)));
        assert_eq!(report.saved.len(), 1);
        assert!(report.saved[0].exists());
    }

    #[test]
    fn test_stop_flag_ends_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let stop = StopFlag::new();
        stop.stop();
        let mut source = ScriptedSource::levels(&[100]);

        let report = Collector::new(dir.path(), 20)
            .run("s4", "Di", &mut source, &mut FakeAnalyzer::default(), &stop)
            .unwrap();

        assert_eq!(report.ended, LoopEnd::Stopped);
        assert!(report.saved.is_empty());
        assert_eq!(source.reads, 0);
    }

    #[test]
    fn test_rejects_bad_subject_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ScriptedSource::levels(&[100]);
        let err = Collector::new(dir.path(), 20)
            .run("s_5", "Ed", &mut source, &mut FakeAnalyzer::default(), &StopFlag::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSubject(_)));
        assert_eq!(source.reads, 0);
    }
}
