use crate::models::error::RecordError;

/// What the capture loop should do after delivering a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFlow {
    Continue,
    Stop,
}

/// Lifecycle hooks a [`CaptureSession`](crate::session::capture::CaptureSession)
/// reports to its owner.
///
/// `on_ready` and `on_start` run on the thread calling `start`, as does
/// `on_failure` when the device cannot be opened. Everything else runs on the
/// capture thread.
pub trait CaptureCallback: Send + Sync {
    /// Precondition check before the device is opened.
    fn on_ready(&self) -> bool;

    /// Device opened; returning false aborts the start.
    fn on_start(&self) -> bool;

    /// One full frame. Never called with a short frame.
    fn on_frame(&self, frame: &[i16]) -> FrameFlow;

    /// Terminal fault. No `on_stop` follows.
    fn on_failure(&self, error: RecordError);

    /// Normal end of capture, after the device was released.
    fn on_stop(&self);
}
