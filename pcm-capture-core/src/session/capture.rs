use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::config::RecordConfig;
use crate::models::error::RecordError;
use crate::models::state::CaptureState;
use crate::session::cancel::CancelToken;
use crate::traits::audio_input::{AudioInput, InputStream};
use crate::traits::capture_callback::{CaptureCallback, FrameFlow};

/// Lifecycle state shared with the worker. One lock guards all of it.
struct SessionControl {
    state: CaptureState,
    token: Option<CancelToken>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SessionControl {
    fn request_stop(&mut self) {
        if self.state.is_running() {
            self.state = CaptureState::Stopping;
        }
        if let Some(token) = &self.token {
            token.cancel();
        }
    }
}

/// One hardware capture: opens the device, runs the blocking read loop on a
/// dedicated thread and reports frames and lifecycle events to its callback.
///
/// A session is single-use; the recorder builds a fresh one per recording.
///
/// ```text
/// start() ─→ [device.open] ─→ spawn "pcm-capture"
///                                  │
///              ensure recording ───┤
///                                  ↓
///              read frame ─→ callback.on_frame ─→ (loop until cancelled)
///                                  ↓
///              stop + release ─→ on_stop / on_failure
/// ```
pub struct CaptureSession<D: AudioInput> {
    device: Arc<D>,
    config: RecordConfig,
    callback: Arc<dyn CaptureCallback>,
    control: Arc<Mutex<SessionControl>>,
}

impl<D: AudioInput> CaptureSession<D> {
    pub fn new(device: Arc<D>, config: RecordConfig, callback: Arc<dyn CaptureCallback>) -> Self {
        Self {
            device,
            config,
            callback,
            control: Arc::new(Mutex::new(SessionControl {
                state: CaptureState::Idle,
                token: None,
                worker: None,
            })),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.control.lock().state
    }

    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    /// Interleaved samples per delivered frame.
    pub fn frame_len(&self) -> usize {
        self.config.frame_len()
    }

    /// Device buffer in bytes: the double-buffered frame size, raised to the
    /// device minimum.
    pub fn buffer_size(&self) -> usize {
        let derived = self.config.derived_buffer_size();
        match self.device.minimum_buffer_size(&self.config) {
            Ok(min) if min > derived => {
                log::debug!("increasing buffer size from {} to {} bytes", derived, min);
                min
            }
            Ok(_) => derived,
            Err(e) => {
                log::warn!("could not query minimum buffer size ({}), using {} bytes", e, derived);
                derived
            }
        }
    }

    /// Open the device and launch the capture thread.
    ///
    /// Returns false when the ready check vetoes the start (state stays
    /// `Idle`), when the device cannot be opened (`Failed`, error reported),
    /// or when the session was already used.
    pub fn start(&self) -> bool {
        let mut control = self.control.lock();
        if !control.state.is_idle() {
            log::warn!("capture session already used (state {:?})", control.state);
            return false;
        }
        control.state = CaptureState::Opening;

        if !self.callback.on_ready() {
            log::error!("capture not ready, start aborted");
            control.state = CaptureState::Idle;
            return false;
        }

        let buffer_size = self.buffer_size();
        log::debug!("opening input with a {} byte buffer", buffer_size);
        let mut stream = match self.device.open(&self.config, buffer_size) {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("input initialization failed: {}", e);
                let err = RecordError::from(e);
                control.state = CaptureState::Failed(err);
                self.callback.on_failure(err);
                return false;
            }
        };

        if !self.callback.on_start() {
            log::warn!("start vetoed by owner, releasing input");
            stream.release();
            control.state = CaptureState::Idle;
            return false;
        }

        let token = CancelToken::new();
        let worker = CaptureWorker {
            stream,
            token: token.clone(),
            frame_len: self.frame_len(),
            callback: Arc::clone(&self.callback),
            control: Arc::clone(&self.control),
        };

        control.state = CaptureState::Running;
        control.token = Some(token);
        match thread::Builder::new()
            .name("pcm-capture".into())
            .spawn(move || worker.run())
        {
            Ok(handle) => {
                control.worker = Some(handle);
                log::info!(
                    "capture started: {} Hz, {} ch, {}-bit, {} samples/frame",
                    self.config.sample_rate_hz,
                    self.config.channels(),
                    self.config.bits_per_sample(),
                    self.frame_len()
                );
                true
            }
            Err(e) => {
                log::error!("failed to spawn capture thread: {}", e);
                control.token = None;
                control.state = CaptureState::Failed(RecordError::ExceptionOccurred);
                self.callback.on_failure(RecordError::ExceptionOccurred);
                false
            }
        }
    }

    /// Ask the capture thread to finish after its current read. Does not
    /// block.
    pub fn stop(&self) {
        self.control.lock().request_stop();
    }

    /// Stop and wait for the capture thread to exit. Once this returns no
    /// further callback fires.
    ///
    /// Called from the capture thread itself (e.g. by a worker-side
    /// listener) it only requests the stop, since a thread cannot join
    /// itself.
    pub fn immediate_stop(&self) {
        let handle = {
            let mut control = self.control.lock();
            control.request_stop();
            let on_worker = control
                .worker
                .as_ref()
                .is_some_and(|handle| handle.thread().id() == thread::current().id());
            if on_worker {
                // The handle stays for the next caller to join.
                log::warn!("immediate stop requested from the capture thread, not waiting");
                return;
            }
            control.worker.take()
        };
        let Some(handle) = handle else {
            return;
        };
        if handle.join().is_err() {
            log::error!("capture thread panicked");
        }
    }
}

impl<D: AudioInput> Drop for CaptureSession<D> {
    fn drop(&mut self) {
        self.control.lock().request_stop();
    }
}

struct CaptureWorker<S: InputStream> {
    stream: S,
    token: CancelToken,
    frame_len: usize,
    callback: Arc<dyn CaptureCallback>,
    control: Arc<Mutex<SessionControl>>,
}

impl<S: InputStream> CaptureWorker<S> {
    fn run(mut self) {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.capture())) {
            Ok(outcome) => outcome,
            Err(_) => {
                log::error!("panic inside the capture loop");
                Err(RecordError::ExceptionOccurred)
            }
        };
        self.token.cancel();
        log::info!("out of the read loop, releasing input");
        self.release();

        match outcome {
            Ok(()) => {
                self.callback.on_stop();
                self.control.lock().state = CaptureState::Closed;
            }
            Err(err) => {
                self.callback.on_failure(err);
                self.control.lock().state = CaptureState::Failed(err);
            }
        }
    }

    fn capture(&mut self) -> Result<(), RecordError> {
        self.ensure_recording()?;

        let mut frame = vec![0i16; self.frame_len];
        while !self.token.is_cancelled() {
            let read = self.stream.read(&mut frame).map_err(|e| {
                log::error!("read from input failed: {}", e);
                RecordError::ExceptionOccurred
            })?;
            if read != frame.len() {
                log::error!("short read: {} of {} samples", read, frame.len());
                return Err(RecordError::ReadError);
            }
            if self.callback.on_frame(&frame) == FrameFlow::Stop {
                self.control.lock().request_stop();
            }
        }
        Ok(())
    }

    /// Start the stream if it is not running yet, then confirm it is. A
    /// device that silently refuses to record (no permission, or held by
    /// another client) is caught here before any read.
    fn ensure_recording(&mut self) -> Result<(), RecordError> {
        if !self.stream.is_recording() {
            self.stream.start_capture().map_err(|e| {
                log::error!("failed to start recording: {}", e);
                RecordError::from(e)
            })?;
        }
        if !self.stream.is_recording() {
            log::error!("no record permission or input is not available right now");
            return Err(RecordError::PermissionError);
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.stream.is_recording() {
            if let Err(e) = self.stream.stop_capture() {
                log::error!("failed to stop input: {}", e);
            }
        }
        self.stream.release();
    }
}
