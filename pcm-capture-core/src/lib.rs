//! # pcm-capture-core
//!
//! Platform-agnostic PCM capture core.
//!
//! Provides the byte-order codec, streaming WAV output with a backpatched
//! header, the capture session state machine and the [`Recorder`] that fans
//! frames and lifecycle events out to listeners. Audio backends implement
//! [`AudioInput`] and plug into the generic [`Recorder`]; the host supplies an
//! [`Executor`] for UI-context notifications.
//!
//! ## Architecture
//!
//! ```text
//! pcm-capture-core (this crate)
//! ├── traits/       ← AudioInput, InputStream, RecordListener, Executor, CaptureCallback
//! ├── models/       ← RecordConfig, RecorderOptions, RecordError, CaptureState, SessionSummary
//! ├── processing/   ← byte-order codec, WAV header generation, volume
//! ├── storage/      ← WavFileWriter
//! ├── session/      ← CaptureSession (worker loop), Recorder (orchestrator)
//! └── dispatch/     ← SerialExecutor, QueueExecutor
//! ```

pub mod dispatch;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use dispatch::{QueueExecutor, SerialExecutor};
pub use models::config::{
    ChannelLayout, InputSource, RecordConfig, RecorderOptions, SampleFormat, TIMER_INTERVAL_MS,
};
pub use models::error::{CodecError, ConfigError, DeviceError, RecordError, StorageError};
pub use models::recording_result::{SessionOutcome, SessionSummary};
pub use models::state::{CaptureState, WriterState};
pub use processing::byte_order::ByteOrder;
pub use processing::volume::calculate_volume;
pub use session::capture::CaptureSession;
pub use session::recorder::Recorder;
pub use storage::wav_writer::{WavFileWriter, WavSpec};
pub use traits::audio_input::{AudioInput, InputStream};
pub use traits::capture_callback::{CaptureCallback, FrameFlow};
pub use traits::executor::{Executor, Task};
pub use traits::record_listener::RecordListener;
