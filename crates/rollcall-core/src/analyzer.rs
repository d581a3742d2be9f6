//! The detection + embedding seam used by the capture pipelines.

use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{BoundingBox, Embedding};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// Locates faces in a grayscale frame and turns them into embeddings.
pub trait FaceAnalyzer {
    /// Face locations, most confident first.
    fn locate(&mut self, gray: &[u8], width: u32, height: u32) -> Result<Vec<BoundingBox>, AnalyzerError>;

    /// Embedding of one face returned by [`locate`](Self::locate).
    fn encode(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
        face: &BoundingBox,
    ) -> Result<Embedding, AnalyzerError>;

    /// Locate every face and embed each, pairing boxes with embeddings.
    fn analyze(&mut self, gray: &[u8], width: u32, height: u32) -> Result<Vec<(BoundingBox, Embedding)>, AnalyzerError> {
        let faces = self.locate(gray, width, height)?;
        faces
            .into_iter()
            .map(|face| {
                let embedding = self.encode(gray, width, height, &face)?;
                Ok((face, embedding))
            })
            .collect()
    }
}

/// SCRFD + ArcFace running on ONNX Runtime.
pub struct OnnxAnalyzer {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxAnalyzer {
    pub fn load(scrfd_path: &str, arcface_path: &str) -> Result<Self, AnalyzerError> {
        let detector = FaceDetector::load(scrfd_path)?;
        let recognizer = FaceRecognizer::load(arcface_path)?;
        Ok(Self { detector, recognizer })
    }
}

impl FaceAnalyzer for OnnxAnalyzer {
    fn locate(&mut self, gray: &[u8], width: u32, height: u32) -> Result<Vec<BoundingBox>, AnalyzerError> {
        Ok(self.detector.detect(gray, width, height)?)
    }

    fn encode(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
        face: &BoundingBox,
    ) -> Result<Embedding, AnalyzerError> {
        Ok(self.recognizer.extract(gray, width, height, face)?)
    }
}
