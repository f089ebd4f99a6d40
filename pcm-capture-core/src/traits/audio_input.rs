use crate::models::config::RecordConfig;
use crate::models::error::DeviceError;

/// A source of live PCM audio.
///
/// Implemented by platform backends (for example the cpal backend). The core
/// relies on nothing beyond this capability set.
pub trait AudioInput: Send + Sync + 'static {
    type Stream: InputStream;

    /// Whether the process may record from this input right now.
    fn has_record_permission(&self) -> bool;

    /// Smallest device buffer, in bytes, the input accepts for `config`.
    fn minimum_buffer_size(&self, config: &RecordConfig) -> Result<usize, DeviceError>;

    /// Open a capture stream. The stream is created stopped.
    fn open(&self, config: &RecordConfig, buffer_size_bytes: usize) -> Result<Self::Stream, DeviceError>;
}

/// An opened capture handle, owned by a single worker thread.
pub trait InputStream: Send + 'static {
    fn start_capture(&mut self) -> Result<(), DeviceError>;

    fn stop_capture(&mut self) -> Result<(), DeviceError>;

    /// Whether the stream is actively delivering samples.
    fn is_recording(&self) -> bool;

    /// Block until `buffer` is filled or the stream ends.
    ///
    /// Returns the number of interleaved samples written; anything short of
    /// `buffer.len()` ends the session with a read error.
    fn read(&mut self, buffer: &mut [i16]) -> Result<usize, DeviceError>;

    /// Release the underlying device. Called exactly once, after which the
    /// stream is dropped.
    fn release(&mut self);
}
