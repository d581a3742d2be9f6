//! Shared plumbing for the camera loops: the operator stop flag and the
//! reason a loop ended.

use rollcall_hw::{Frame, FrameSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Operator quit signal, shared between the loop and whoever watches input.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a capture loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEnd {
    /// The loop reached its goal (sample quota, or a match in run-once mode).
    Completed,
    /// The operator asked to quit.
    Stopped,
    /// The frame source ran dry.
    EndOfStream,
    /// Reading a frame failed; the loop was aborted.
    FrameError(String),
}

/// Pull the next frame, or the reason the loop must end.
pub(crate) fn next_frame(source: &mut dyn FrameSource, stop: &StopFlag) -> Result<Frame, LoopEnd> {
    if stop.is_stopped() {
        return Err(LoopEnd::Stopped);
    }
    match source.next_frame() {
        Ok(Some(frame)) => Ok(frame),
        Ok(None) => Err(LoopEnd::EndOfStream),
        Err(e) => {
            tracing::error!(error = %e, "failed to read frame from camera");
            Err(LoopEnd::FrameError(e.to_string()))
        }
    }
}
