//! Frame type and image helpers: YUYV conversion, cropping, JPEG output.

use image::{GrayImage, ImageFormat};
use std::path::Path;

/// A captured grayscale camera frame.
#[derive(Clone)]
pub struct Frame {
    /// Grayscale pixel data (width * height bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub sequence: u32,
}

/// Integer crop rectangle, always inside the frame it was clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Clamp a floating-point box to a `frame_width` × `frame_height` frame.
    ///
    /// Returns `None` when nothing of the box lies inside the frame.
    pub fn clamped(x: f32, y: f32, width: f32, height: f32, frame_width: u32, frame_height: u32) -> Option<Self> {
        let x0 = x.floor().max(0.0);
        let y0 = y.floor().max(0.0);
        let x1 = (x + width).ceil().min(frame_width as f32);
        let y1 = (y + height).ceil().min(frame_height as f32);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

impl Frame {
    /// Wrap an already-decoded grayscale image (still images, tests).
    pub fn from_gray(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            sequence: 0,
        }
    }

    /// Copy the frame into an `image` buffer.
    pub fn to_gray_image(&self) -> Result<GrayImage, FrameError> {
        GrayImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            FrameError::InvalidLength {
                expected: (self.width * self.height) as usize,
                actual: self.data.len(),
            },
        )
    }

    /// Crop `rect` out of the frame.
    pub fn crop(&self, rect: CropRect) -> Result<GrayImage, FrameError> {
        if rect.width == 0
            || rect.height == 0
            || rect.x + rect.width > self.width
            || rect.y + rect.height > self.height
        {
            return Err(FrameError::CropOutOfBounds(rect));
        }

        let stride = self.width as usize;
        let mut out = Vec::with_capacity((rect.width * rect.height) as usize);
        for row in rect.y..rect.y + rect.height {
            let start = row as usize * stride + rect.x as usize;
            let end = start + rect.width as usize;
            let line = self.data.get(start..end).ok_or(FrameError::InvalidLength {
                expected: (self.width * self.height) as usize,
                actual: self.data.len(),
            })?;
            out.extend_from_slice(line);
        }

        GrayImage::from_raw(rect.width, rect.height, out).ok_or(FrameError::CropOutOfBounds(rect))
    }

    /// Crop `rect` and write it to `path` as a JPEG.
    pub fn save_crop_jpeg(&self, rect: CropRect, path: &Path) -> Result<(), FrameError> {
        let face = self.crop(rect)?;
        face.save_with_format(path, ImageFormat::Jpeg)?;
        Ok(())
    }
}

/// Convert packed YUYV (4:2:2) to grayscale by extracting the Y channel.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V].
/// Grayscale = every even-indexed byte.
pub fn yuyv_to_grayscale(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }
    Ok(yuyv[..expected].iter().step_by(2).copied().collect())
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("crop {0:?} lies outside the frame")]
    CropOutOfBounds(CropRect),
    #[error("image encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let data = (0..width * height).map(|i| (i % 256) as u8).collect();
        Frame {
            data,
            width,
            height,
            sequence: 0,
        }
    }

    #[test]
    fn test_yuyv_to_grayscale() {
        // 2x1 image: [Y0=100, U=128, Y1=200, V=128]
        let yuyv = vec![100, 128, 200, 128];
        let gray = yuyv_to_grayscale(&yuyv, 2, 1).unwrap();
        assert_eq!(gray, vec![100, 200]);
    }

    #[test]
    fn test_yuyv_to_grayscale_4x2() {
        let yuyv: Vec<u8> = (0..16).collect();
        let gray = yuyv_to_grayscale(&yuyv, 4, 2).unwrap();
        assert_eq!(gray, vec![0, 2, 4, 6, 8, 10, 12, 14]);
    }

    #[test]
    fn test_yuyv_invalid_length() {
        let yuyv = vec![100, 128]; // too short for 2x1
        assert!(yuyv_to_grayscale(&yuyv, 2, 1).is_err());
    }

    #[test]
    fn test_clamp_inside() {
        let rect = CropRect::clamped(10.2, 20.7, 30.0, 40.0, 640, 360).unwrap();
        assert_eq!(rect, CropRect { x: 10, y: 20, width: 31, height: 41 });
    }

    #[test]
    fn test_clamp_partially_outside() {
        let rect = CropRect::clamped(-15.0, 300.0, 50.0, 100.0, 640, 360).unwrap();
        assert_eq!(rect.x, 0);
        assert_eq!(rect.width, 35);
        assert_eq!(rect.y + rect.height, 360);
    }

    #[test]
    fn test_clamp_fully_outside() {
        assert!(CropRect::clamped(700.0, 10.0, 20.0, 20.0, 640, 360).is_none());
        assert!(CropRect::clamped(10.0, 10.0, 0.0, 20.0, 640, 360).is_none());
    }

    #[test]
    fn test_crop_copies_rows() {
        let frame = gradient_frame(4, 3);
        let crop = frame.crop(CropRect { x: 1, y: 1, width: 2, height: 2 }).unwrap();
        assert_eq!(crop.into_raw(), vec![5, 6, 9, 10]);
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let frame = gradient_frame(4, 3);
        let result = frame.crop(CropRect { x: 3, y: 0, width: 2, height: 1 });
        assert!(matches!(result, Err(FrameError::CropOutOfBounds(_))));
    }

    #[test]
    fn test_save_crop_jpeg_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s1_alice_0.jpg");
        let frame = gradient_frame(64, 48);
        frame
            .save_crop_jpeg(CropRect { x: 8, y: 8, width: 32, height: 24 }, &path)
            .unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 24);
    }

    #[test]
    fn test_from_gray_roundtrip_dimensions() {
        let frame = Frame::from_gray(GrayImage::from_pixel(5, 3, image::Luma([9])));
        assert_eq!((frame.width, frame.height), (5, 3));
        assert_eq!(frame.data.len(), 15);
        assert!(frame.data.iter().all(|&p| p == 9));
        assert_eq!(frame.to_gray_image().unwrap().dimensions(), (5, 3));
    }
}
