//! rollcall-hw: Hardware abstraction for camera capture.
//!
//! Provides V4L2-based camera access with ordered device fallback, a
//! [`FrameSource`] seam for the capture loops, and grayscale frame helpers.

pub mod camera;
pub mod frame;

pub use camera::{open_with_fallback, Camera, CameraError, DeviceInfo, FrameSource, PixelFormat};
pub use frame::{CropRect, Frame, FrameError};
