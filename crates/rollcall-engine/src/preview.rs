//! Annotated preview image for the interactive recognizer.

use crate::config::Config;
use crate::error::EngineError;
use crate::recognizer::{FaceAnnotation, FrameSink};
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use rollcall_hw::Frame;
use std::path::{Path, PathBuf};

const KNOWN: Rgb<u8> = Rgb([0, 255, 0]);
const UNKNOWN: Rgb<u8> = Rgb([255, 0, 0]);
const LABEL_SCALE: f32 = 16.0;

/// Overwrites one JPEG with the latest frame, its face boxes and labels.
pub struct PreviewSink {
    path: PathBuf,
    font: Option<FontVec>,
    last_labels: Vec<String>,
}

impl PreviewSink {
    /// A sink that draws boxes only; see [`set_font`](Self::set_font).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), font: None, last_labels: Vec::new() }
    }

    /// Sink at `preview_path`, labelled with `preview_font` when it loads.
    ///
    /// An unusable font only costs the labels; the boxes are still drawn.
    pub fn from_config(config: &Config) -> Self {
        let mut sink = Self::new(config.preview_path.clone());
        if let Some(font) = &config.preview_font {
            if let Err(e) = sink.set_font(font) {
                tracing::warn!(error = %e, "preview labels disabled");
            }
        }
        sink
    }

    /// Render face labels with the TrueType/OpenType font at `path`.
    pub fn set_font(&mut self, path: &Path) -> Result<(), EngineError> {
        self.font = Some(load_font(path)?);
        Ok(())
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }
}

impl FrameSink for PreviewSink {
    fn show(&mut self, frame: &Frame, faces: &[FaceAnnotation]) -> Result<(), EngineError> {
        let image = annotate(frame, faces, self.font.as_ref())?;
        image
            .save_with_format(&self.path, ImageFormat::Jpeg)
            .map_err(rollcall_hw::FrameError::from)?;

        let labels: Vec<String> = faces.iter().map(|f| f.label.clone()).collect();
        if labels != self.last_labels {
            tracing::info!(faces = ?labels, sequence = frame.sequence, "in view");
            self.last_labels = labels;
        }
        Ok(())
    }
}

pub fn load_font(path: &Path) -> Result<FontVec, EngineError> {
    let bytes = std::fs::read(path).map_err(|e| EngineError::io(path, e))?;
    FontVec::try_from_vec(bytes).map_err(|e| EngineError::InvalidFont {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Colour copy of `frame` with a box per face: green when recognised,
/// red otherwise. With a `font`, each label is written above its box.
pub fn annotate(frame: &Frame, faces: &[FaceAnnotation], font: Option<&FontVec>) -> Result<RgbImage, EngineError> {
    let mut image = DynamicImage::ImageLuma8(frame.to_gray_image()?).to_rgb8();

    for face in faces {
        let colour = if face.matched { KNOWN } else { UNKNOWN };
        let b = &face.bbox;
        let rect = Rect::at(b.x as i32, b.y as i32).of_size((b.width as u32).max(1), (b.height as u32).max(1));
        draw_hollow_rect_mut(&mut image, rect, colour);

        if let Some(landmarks) = &b.landmarks {
            for &(x, y) in landmarks {
                draw_cross_mut(&mut image, colour, x as i32, y as i32);
            }
        }

        if let Some(font) = font {
            let y = (b.y - LABEL_SCALE).max(0.0) as i32;
            draw_text_mut(&mut image, colour, b.x as i32, y, PxScale::from(LABEL_SCALE), font, &face.label);
        }
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::gray_frame;
    use rollcall_core::BoundingBox;

    const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

    fn face(matched: bool) -> FaceAnnotation {
        FaceAnnotation {
            bbox: BoundingBox { x: 4.0, y: 4.0, width: 10.0, height: 10.0, confidence: 0.9, landmarks: None },
            label: if matched { "A".into() } else { "Unknown".into() },
            matched,
        }
    }

    #[test]
    fn test_box_colour_follows_match() {
        let frame = gray_frame(0);
        assert_eq!(*annotate(&frame, &[face(true)], None).unwrap().get_pixel(4, 4), KNOWN);
        assert_eq!(*annotate(&frame, &[face(false)], None).unwrap().get_pixel(4, 4), UNKNOWN);
        assert_eq!(*annotate(&frame, &[], None).unwrap().get_pixel(4, 4), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_label_drawn_above_box() {
        // Needs a system font; skip where none is installed.
        let Ok(font) = load_font(Path::new(SYSTEM_FONT)) else {
            return;
        };
        let frame = gray_frame(0);
        let mut labelled = face(true);
        labelled.bbox.y = 24.0;
        labelled.label = "WWW".into();

        let plain = annotate(&frame, &[labelled.clone()], None).unwrap();
        let with_text = annotate(&frame, &[labelled], Some(&font)).unwrap();

        let above_box = |img: &RgbImage| {
            img.enumerate_pixels()
                .filter(|(_, y, p)| *y < 24 && **p != Rgb([0, 0, 0]))
                .count()
        };
        assert_eq!(above_box(&plain), 0);
        assert!(above_box(&with_text) > 0);
    }

    #[test]
    fn test_invalid_font_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-font.ttf");
        std::fs::write(&path, b"plain text").unwrap();

        let mut sink = PreviewSink::new(dir.path().join("preview.jpg"));
        assert!(matches!(sink.set_font(&path), Err(EngineError::InvalidFont { .. })));
        assert!(!sink.has_font());
    }

    #[test]
    fn test_from_config_without_usable_font_still_draws() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            preview_path: dir.path().join("preview.jpg"),
            preview_font: Some(dir.path().join("missing.ttf")),
            ..Config::default()
        };
        let mut sink = PreviewSink::from_config(&config);
        assert!(!sink.has_font());

        sink.show(&gray_frame(80), &[face(true)]).unwrap();
        assert!(config.preview_path.exists());
    }

    #[test]
    fn test_sink_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.jpg");
        let mut sink = PreviewSink::new(&path);

        sink.show(&gray_frame(80), &[face(true)]).unwrap();

        let written = image::open(&path).unwrap();
        assert_eq!(written.width(), crate::testing::WIDTH);
    }
}
