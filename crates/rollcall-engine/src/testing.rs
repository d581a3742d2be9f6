//! Camera-free stand-ins for the capture pipelines.

use image::{GrayImage, Luma};
use rollcall_core::{AnalyzerError, BoundingBox, Embedding, FaceAnalyzer};
use rollcall_hw::{CameraError, Frame, FrameSource};
use std::collections::VecDeque;

pub const WIDTH: u32 = 64;
pub const HEIGHT: u32 = 48;

/// A uniform frame of the given gray level.
pub fn gray_frame(level: u8) -> Frame {
    Frame::from_gray(GrayImage::from_pixel(WIDTH, HEIGHT, Luma([level])))
}

/// Replays a fixed list of frame results, then reports end-of-stream.
pub struct ScriptedSource {
    frames: VecDeque<Result<Frame, CameraError>>,
    pub reads: usize,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Result<Frame, CameraError>>) -> Self {
        Self { frames: frames.into(), reads: 0 }
    }

    pub fn levels(levels: &[u8]) -> Self {
        Self::new(levels.iter().map(|&l| Ok(gray_frame(l))).collect())
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        self.reads += 1;
        self.frames.pop_front().transpose()
    }
}

/// Sees `faces_per_frame` faces in any frame whose mean level is at least 50,
/// and embeds each as `[mean / 10]`. Distinct levels 100 and 200 are thus
/// far apart, while JPEG noise of a few levels stays within tolerance.
pub struct FakeAnalyzer {
    pub faces_per_frame: usize,
}

impl Default for FakeAnalyzer {
    fn default() -> Self {
        Self { faces_per_frame: 1 }
    }
}

fn mean(gray: &[u8]) -> f32 {
    if gray.is_empty() {
        return 0.0;
    }
    gray.iter().map(|&p| p as f32).sum::<f32>() / gray.len() as f32
}

impl FaceAnalyzer for FakeAnalyzer {
    fn locate(&mut self, gray: &[u8], width: u32, height: u32) -> Result<Vec<BoundingBox>, AnalyzerError> {
        if mean(gray) < 50.0 {
            return Ok(Vec::new());
        }
        Ok((0..self.faces_per_frame)
            .map(|i| BoundingBox {
                x: (i as f32 * 8.0) % width as f32,
                y: 4.0,
                width: width as f32 / 2.0,
                height: height as f32 / 2.0,
                confidence: 0.9 - i as f32 * 0.1,
                landmarks: None,
            })
            .collect())
    }

    fn encode(
        &mut self,
        gray: &[u8],
        _width: u32,
        _height: u32,
        _face: &BoundingBox,
    ) -> Result<Embedding, AnalyzerError> {
        Ok(Embedding::new(vec![mean(gray) / 10.0]))
    }
}
