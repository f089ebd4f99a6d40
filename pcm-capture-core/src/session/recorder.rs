use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::models::config::{RecordConfig, RecorderOptions, SampleFormat, TIMER_INTERVAL_MS};
use crate::models::error::{ConfigError, RecordError};
use crate::models::recording_result::SessionSummary;
use crate::models::state::CaptureState;
use crate::processing::volume::calculate_volume;
use crate::processing::wav_format::encode_samples;
use crate::session::capture::CaptureSession;
use crate::storage::wav_writer::{WavFileWriter, WavSpec};
use crate::traits::audio_input::AudioInput;
use crate::traits::capture_callback::{CaptureCallback, FrameFlow};
use crate::traits::executor::Executor;
use crate::traits::record_listener::RecordListener;

/// Settings frozen when a session starts. Later `configure`/setter calls
/// apply to the next session.
#[derive(Debug, Clone)]
struct SessionPolicy {
    sample_format: SampleFormat,
    spec: WavSpec,
    max_record_time_ms: Option<u64>,
    volume_interval_ms: u64,
    record_file_path: Option<PathBuf>,
    wav_format: bool,
}

impl SessionPolicy {
    fn new(config: &RecordConfig, options: &RecorderOptions) -> Self {
        Self {
            sample_format: config.sample_format,
            spec: WavSpec::from(config),
            max_record_time_ms: options.max_record_time_ms,
            volume_interval_ms: options.volume_interval_ms,
            record_file_path: options.record_file_path.clone(),
            wav_format: options.wav_format,
        }
    }
}

/// Public-facing recording coordinator.
///
/// Owns the configuration, runs one [`CaptureSession`] at a time and fans
/// every frame and lifecycle event out to the registered
/// [`RecordListener`]: worker-side frames synchronously on the capture
/// thread, everything else through the injected [`Executor`].
///
/// ## Frame pipeline
///
/// ```text
/// capture thread                                 executor
/// ──────────────                                 ────────
/// frame ─→ encode ─→ WAV file
///               └──→ accumulated bytes
///       ─→ on_record_data_on_worker_thread
///       ─→ post ───────────────────────────────→ on_record_data
///       ─→ every volume interval: post ────────→ on_voice_volume
///       ─→ max record time reached: stop
/// ```
///
/// Elapsed time is `frames * 20 ms`, never wall-clock.
pub struct Recorder<D: AudioInput> {
    core: Arc<RecorderCore<D>>,
    session: Mutex<Option<Arc<CaptureSession<D>>>>,
}

impl<D: AudioInput> Recorder<D> {
    pub fn new(device: Arc<D>, executor: Arc<dyn Executor>) -> Self {
        Self {
            core: Arc::new(RecorderCore {
                device,
                executor,
                config: RwLock::new(RecordConfig::default()),
                options: RwLock::new(RecorderOptions::default()),
                listener: RwLock::new(None),
                policy: Mutex::new(SessionPolicy::new(
                    &RecordConfig::default(),
                    &RecorderOptions::default(),
                )),
                started: AtomicBool::new(false),
                frames: AtomicU64::new(0),
                recorded: Mutex::new(Vec::new()),
                writer: Mutex::new(None),
                summary: Mutex::new(None),
            }),
            session: Mutex::new(None),
        }
    }

    /// Replace the record configuration used by the next session.
    pub fn configure(&self, config: RecordConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.is_started() {
            log::warn!("configuration changed while recording, applies to the next session");
        }
        *self.core.config.write() = config;
        Ok(())
    }

    pub fn config(&self) -> RecordConfig {
        self.core.config.read().clone()
    }

    /// Replace all recorder options at once.
    pub fn set_options(&self, options: RecorderOptions) -> Result<(), ConfigError> {
        options.validate()?;
        *self.core.options.write() = options;
        Ok(())
    }

    pub fn options(&self) -> RecorderOptions {
        self.core.options.read().clone()
    }

    /// Maximum recorded duration; `None` records until stopped.
    pub fn set_max_record_time(&self, max_ms: Option<u64>) -> &Self {
        self.core.options.write().max_record_time_ms = max_ms;
        self
    }

    /// Volume callback period. Values below 100 ms are ignored, others are
    /// rounded down to a multiple of 20 ms.
    pub fn set_volume_interval(&self, interval_ms: u64) -> &Self {
        match RecorderOptions::normalize_volume_interval(interval_ms) {
            Some(interval) => self.core.options.write().volume_interval_ms = interval,
            None => log::error!("volume interval {} ms is too short, keeping current value", interval_ms),
        }
        self
    }

    /// Target file; `None` records without persistence.
    pub fn set_record_file_path(&self, path: Option<PathBuf>) -> &Self {
        self.core.options.write().record_file_path = path;
        self
    }

    /// Write a WAV header (true) or raw PCM (false).
    pub fn set_wav_format(&self, wav_format: bool) -> &Self {
        self.core.options.write().wav_format = wav_format;
        self
    }

    pub fn set_listener(&self, listener: Option<Arc<dyn RecordListener>>) -> &Self {
        *self.core.listener.write() = listener;
        self
    }

    pub fn is_record_permission_granted(&self) -> bool {
        self.core.device.has_record_permission()
    }

    pub fn is_started(&self) -> bool {
        self.core.started.load(Ordering::SeqCst)
    }

    /// State of the current (or most recent) capture session.
    pub fn state(&self) -> CaptureState {
        self.session
            .lock()
            .as_ref()
            .map_or(CaptureState::Idle, |session| session.state())
    }

    /// Summary of the current or most recent session.
    pub fn last_session(&self) -> Option<SessionSummary> {
        self.core.summary.lock().clone()
    }

    /// Start a new session. Returns false when one is already active or the
    /// capture could not be started; failures are also reported to the
    /// listener.
    pub fn start(&self) -> bool {
        if self
            .core
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::warn!("recorder already started");
            return false;
        }

        // The previous worker may still be unwinding after a max-duration stop.
        let previous = self.session.lock().take();
        if let Some(previous) = previous {
            previous.immediate_stop();
        }

        let config = self.core.config.read().clone();
        *self.core.policy.lock() = SessionPolicy::new(&config, &self.core.options.read());

        let callback: Arc<dyn CaptureCallback> = self.core.clone();
        let session = Arc::new(CaptureSession::new(Arc::clone(&self.core.device), config, callback));
        *self.session.lock() = Some(Arc::clone(&session));

        if !session.start() {
            self.core.started.store(false, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Stop the active session and wait for its capture thread to exit.
    pub fn stop(&self) {
        let was_started = self.core.started.swap(false, Ordering::SeqCst);
        // Clone out so a listener calling back into the recorder cannot
        // deadlock against the join.
        let session = self.session.lock().clone();
        match session {
            Some(session) => {
                if !was_started {
                    log::debug!("recorder not started, stopping leftover session");
                }
                session.immediate_stop();
            }
            None => log::debug!("stop requested with no session"),
        }
    }
}

impl<D: AudioInput> Drop for Recorder<D> {
    fn drop(&mut self) {
        let session = self.session.lock().take();
        if let Some(session) = session {
            session.immediate_stop();
        }
    }
}

/// Shared state the capture thread reports into.
struct RecorderCore<D: AudioInput> {
    device: Arc<D>,
    executor: Arc<dyn Executor>,
    config: RwLock<RecordConfig>,
    options: RwLock<RecorderOptions>,
    listener: RwLock<Option<Arc<dyn RecordListener>>>,
    policy: Mutex<SessionPolicy>,
    started: AtomicBool,
    frames: AtomicU64,
    recorded: Mutex<Vec<u8>>,
    writer: Mutex<Option<WavFileWriter>>,
    summary: Mutex<Option<SessionSummary>>,
}

impl<D: AudioInput> RecorderCore<D> {
    fn listener(&self) -> Option<Arc<dyn RecordListener>> {
        self.listener.read().clone()
    }

    /// Post a listener call to the executor. Never waits for it to run.
    fn dispatch<F>(&self, notify: F)
    where
        F: FnOnce(&dyn RecordListener) + Send + 'static,
    {
        if let Some(listener) = self.listener() {
            self.executor.post(Box::new(move || notify(listener.as_ref())));
        }
    }

    fn report_save_failed(&self, reason: String) {
        self.dispatch(move |listener| listener.on_file_save_failed(&reason));
    }

    fn append_to_file(&self, bytes: &[u8]) {
        let mut writer = self.writer.lock();
        let failed = match writer.as_mut() {
            Some(file) => match file.append(bytes) {
                Ok(()) => None,
                Err(e) => {
                    file.cancel();
                    Some(e)
                }
            },
            None => None,
        };
        if let Some(e) = failed {
            // Capture keeps going; only persistence is dropped.
            log::error!("{}, recording continues without file", e);
            *writer = None;
            self.report_save_failed(e.to_string());
        }
    }

    /// Close out the running summary. Failures raised before `on_start`
    /// (permission denied, device open) leave the previous session's record
    /// untouched.
    fn finish_summary<F>(&self, bytes: usize, saved_path: Option<PathBuf>, conclude: F)
    where
        F: FnOnce(&mut SessionSummary),
    {
        let mut summary = self.summary.lock();
        let Some(summary) = summary.as_mut().filter(|s| s.is_running()) else {
            return;
        };
        summary.frames = self.frames.load(Ordering::SeqCst);
        summary.bytes = bytes as u64;
        summary.saved_path = saved_path;
        conclude(summary);
    }
}

impl<D: AudioInput> CaptureCallback for RecorderCore<D> {
    fn on_ready(&self) -> bool {
        if self.device.has_record_permission() {
            return true;
        }
        log::error!("record permission not granted");
        self.on_failure(RecordError::PermissionError);
        false
    }

    fn on_start(&self) -> bool {
        let policy = self.policy.lock().clone();
        self.frames.store(0, Ordering::SeqCst);
        self.recorded.lock().clear();

        let writer = policy.record_file_path.map(|path| {
            WavFileWriter::new(Some(path), Some(policy.spec), policy.wav_format)
        });
        *self.writer.lock() = match writer {
            Some(mut writer) => match writer.open() {
                Ok(()) => Some(writer),
                Err(e) => {
                    log::error!("{}, recording without file", e);
                    self.report_save_failed(e.to_string());
                    None
                }
            },
            None => {
                log::debug!("no record file path, recording without persistence");
                None
            }
        };

        *self.summary.lock() = Some(SessionSummary::begin());
        self.dispatch(|listener| listener.on_start_recording());
        true
    }

    fn on_frame(&self, frame: &[i16]) -> FrameFlow {
        let frames = self.frames.fetch_add(1, Ordering::SeqCst) + 1;
        let (format, volume_interval, max_record_time) = {
            let policy = self.policy.lock();
            (policy.sample_format, policy.volume_interval_ms, policy.max_record_time_ms)
        };

        let bytes = encode_samples(frame, format);
        self.append_to_file(&bytes);
        self.recorded.lock().extend_from_slice(&bytes);

        if let Some(listener) = self.listener() {
            listener.on_record_data_on_worker_thread(frame);
        }
        let data: Arc<[i16]> = Arc::from(frame);
        self.dispatch(move |listener| listener.on_record_data(&data));

        let elapsed = frames * TIMER_INTERVAL_MS;
        if volume_interval > 0 && elapsed >= volume_interval && elapsed % volume_interval == 0 {
            let volume = calculate_volume(frame);
            self.dispatch(move |listener| listener.on_voice_volume(volume));
        }

        match max_record_time {
            Some(max) if elapsed >= max => {
                if self
                    .started
                    .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    log::info!("max record time {} ms reached, stopping", max);
                }
                FrameFlow::Stop
            }
            _ => FrameFlow::Continue,
        }
    }

    fn on_failure(&self, error: RecordError) {
        log::error!("recording failed: {} (code {})", error, error.code());
        if let Some(mut writer) = self.writer.lock().take() {
            writer.cancel();
        }
        self.started.store(false, Ordering::SeqCst);

        let bytes = self.recorded.lock().len();
        self.finish_summary(bytes, None, |summary| summary.fail(error));

        let code = error.code();
        let message = RecordError::message_for_code(code);
        self.dispatch(move |listener| listener.on_record_error(code, &message));
    }

    fn on_stop(&self) {
        let closed = self.writer.lock().take().map(|mut writer| writer.close());
        let saved_path = match closed {
            Some(Ok(path)) => {
                log::info!("recording saved to {}", path.display());
                let saved = path.clone();
                self.dispatch(move |listener| listener.on_file_save_success(&saved));
                Some(path)
            }
            Some(Err(e)) => {
                log::error!("{}", e);
                self.report_save_failed(e.to_string());
                None
            }
            None => None,
        };

        let data = std::mem::take(&mut *self.recorded.lock());
        self.finish_summary(data.len(), saved_path, SessionSummary::complete);
        log::info!(
            "recording stopped after {} frames ({} bytes)",
            self.frames.load(Ordering::SeqCst),
            data.len()
        );

        self.dispatch(move |listener| listener.on_recorded_all_data(&data));
        self.dispatch(|listener| listener.on_stop_recording());
    }
}
