//! cpal-backed [`AudioInput`].
//!
//! A `cpal::Stream` cannot leave the thread that built it, so each opened
//! input gets an owner thread that builds the stream, obeys start/stop
//! commands and forwards every hardware callback buffer over a channel. The
//! capture worker's blocking `read` drains that channel into fixed-length
//! frames.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat as HostFormat, StreamConfig, SupportedBufferSize};
use parking_lot::Mutex;

use pcm_capture_core::models::config::{InputSource, RecordConfig};
use pcm_capture_core::models::error::DeviceError;
use pcm_capture_core::traits::audio_input::{AudioInput, InputStream};

use crate::sample_convert;

const READY_TIMEOUT: Duration = Duration::from_secs(3);

/// How often a blocked read wakes up to check for stream faults.
const FAULT_POLL: Duration = Duration::from_millis(100);

/// Names of the host's input devices, usable as [`InputSource::Named`].
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    match host.input_devices() {
        Ok(devices) => devices
            .enumerate()
            .map(|(index, device)| device.name().unwrap_or_else(|_| format!("Input {}", index + 1)))
            .collect(),
        Err(e) => {
            log::warn!("failed to enumerate input devices: {}", e);
            Vec::new()
        }
    }
}

fn resolve_device(source: &InputSource) -> Option<cpal::Device> {
    let host = cpal::default_host();
    match source {
        InputSource::Mic => host.default_input_device(),
        InputSource::Named(name) => host
            .input_devices()
            .ok()?
            .find(|device| device.name().map(|n| &n == name).unwrap_or(false)),
    }
}

fn unavailable(source: &InputSource) -> DeviceError {
    DeviceError::Unavailable(format!("no input device for {:?}", source))
}

fn map_build_error(err: cpal::BuildStreamError) -> DeviceError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => DeviceError::Busy,
        cpal::BuildStreamError::StreamConfigNotSupported => {
            DeviceError::Unavailable("stream config not supported".into())
        }
        other => DeviceError::Fault(other.to_string()),
    }
}

/// Device buffer size in frames for a byte budget sized for `config`.
fn buffer_frames(config: &RecordConfig, buffer_size_bytes: usize) -> u32 {
    let frame_bytes = config.channels() as usize * config.bytes_per_sample();
    (buffer_size_bytes / frame_bytes.max(1)) as u32
}

/// Microphone input through the host's default cpal backend.
pub struct CpalInput {
    ready_timeout: Duration,
}

impl CpalInput {
    pub fn new() -> Self {
        Self {
            ready_timeout: READY_TIMEOUT,
        }
    }

    /// How long `open` waits for the owner thread to build the stream.
    pub fn with_ready_timeout(ready_timeout: Duration) -> Self {
        Self { ready_timeout }
    }
}

impl Default for CpalInput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioInput for CpalInput {
    type Stream = CpalStream;

    fn has_record_permission(&self) -> bool {
        // Desktop hosts expose no separate consent query; a denied or
        // missing microphone shows up as no default input device.
        resolve_device(&InputSource::Mic).is_some()
    }

    fn minimum_buffer_size(&self, config: &RecordConfig) -> Result<usize, DeviceError> {
        let device = resolve_device(&config.source).ok_or_else(|| unavailable(&config.source))?;
        let supported = device
            .default_input_config()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
        match supported.buffer_size() {
            SupportedBufferSize::Range { min, .. } => {
                Ok(*min as usize * config.channels() as usize * config.bytes_per_sample())
            }
            SupportedBufferSize::Unknown => Ok(0),
        }
    }

    fn open(&self, config: &RecordConfig, buffer_size_bytes: usize) -> Result<CpalStream, DeviceError> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (command_tx, command_rx) = mpsc::channel();
        let (sample_tx, sample_rx) = mpsc::channel();
        let fault = Arc::new(Mutex::new(None));
        let recording = Arc::new(AtomicBool::new(false));

        let owner = StreamOwner {
            source: config.source.clone(),
            stream_config: StreamConfig {
                channels: config.channels(),
                sample_rate: cpal::SampleRate(config.sample_rate_hz),
                buffer_size: BufferSize::Default,
            },
            requested_frames: buffer_frames(config, buffer_size_bytes),
            samples: sample_tx,
            fault: Arc::clone(&fault),
            recording: Arc::clone(&recording),
        };
        let handle = thread::Builder::new()
            .name("cpal-input".into())
            .spawn(move || owner.run(command_rx, ready_tx))
            .map_err(|e| DeviceError::Fault(format!("failed to spawn input thread: {}", e)))?;

        match ready_rx.recv_timeout(self.ready_timeout) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = command_tx.send(Command::Release);
                return Err(DeviceError::Unavailable("input stream did not open in time".into()));
            }
        }

        log::debug!(
            "cpal input open: {} Hz, {} ch, {} byte buffer",
            config.sample_rate_hz,
            config.channels(),
            buffer_size_bytes
        );
        Ok(CpalStream {
            commands: command_tx,
            samples: sample_rx,
            pending: VecDeque::new(),
            fault,
            recording,
            owner: Some(handle),
        })
    }
}

enum Command {
    Start(Sender<Result<(), DeviceError>>),
    Stop(Sender<Result<(), DeviceError>>),
    Release,
}

struct StreamOwner {
    source: InputSource,
    stream_config: StreamConfig,
    requested_frames: u32,
    samples: Sender<Vec<i16>>,
    fault: Arc<Mutex<Option<String>>>,
    recording: Arc<AtomicBool>,
}

impl StreamOwner {
    fn run(self, commands: Receiver<Command>, ready: Sender<Result<(), DeviceError>>) {
        let recording = Arc::clone(&self.recording);
        let stream = match self.build() {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("failed to build input stream: {}", e);
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));

        for command in commands {
            match command {
                Command::Start(reply) => {
                    let result = stream.play().map_err(|e| match e {
                        cpal::PlayStreamError::DeviceNotAvailable => DeviceError::Busy,
                        other => DeviceError::Fault(other.to_string()),
                    });
                    recording.store(result.is_ok(), Ordering::SeqCst);
                    let _ = reply.send(result);
                }
                Command::Stop(reply) => {
                    recording.store(false, Ordering::SeqCst);
                    let _ = reply.send(stream.pause().map_err(|e| DeviceError::Fault(e.to_string())));
                }
                Command::Release => break,
            }
        }

        recording.store(false, Ordering::SeqCst);
        drop(stream);
        log::debug!("cpal input released");
    }

    fn build(self) -> Result<cpal::Stream, DeviceError> {
        let device = resolve_device(&self.source).ok_or_else(|| unavailable(&self.source))?;
        let supported = device
            .default_input_config()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

        let mut config = self.stream_config;
        if let SupportedBufferSize::Range { min, max } = supported.buffer_size() {
            if (*min..=*max).contains(&self.requested_frames) {
                config.buffer_size = BufferSize::Fixed(self.requested_frames);
            }
        }

        let fault = self.fault;
        let on_error = move |err: cpal::StreamError| {
            log::error!("input stream error: {}", err);
            *fault.lock() = Some(err.to_string());
        };
        let samples = self.samples;

        let stream = match supported.sample_format() {
            HostFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let _ = samples.send(data.to_vec());
                },
                on_error,
                None,
            ),
            HostFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let _ = samples.send(sample_convert::f32_to_i16(data));
                },
                on_error,
                None,
            ),
            HostFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let _ = samples.send(sample_convert::u16_to_i16(data));
                },
                on_error,
                None,
            ),
            other => {
                return Err(DeviceError::Unavailable(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        };
        stream.map_err(map_build_error)
    }
}

/// An opened cpal input. Dropping it releases the device.
pub struct CpalStream {
    commands: Sender<Command>,
    samples: Receiver<Vec<i16>>,
    pending: VecDeque<i16>,
    fault: Arc<Mutex<Option<String>>>,
    recording: Arc<AtomicBool>,
    owner: Option<thread::JoinHandle<()>>,
}

impl CpalStream {
    fn request(
        &self,
        command: fn(Sender<Result<(), DeviceError>>) -> Command,
    ) -> Result<(), DeviceError> {
        let gone = || DeviceError::Fault("input thread is gone".into());
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands.send(command(reply_tx)).map_err(|_| gone())?;
        reply_rx.recv().map_err(|_| gone())?
    }
}

impl InputStream for CpalStream {
    fn start_capture(&mut self) -> Result<(), DeviceError> {
        self.request(Command::Start)
    }

    fn stop_capture(&mut self) -> Result<(), DeviceError> {
        self.request(Command::Stop)
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    fn read(&mut self, buffer: &mut [i16]) -> Result<usize, DeviceError> {
        while self.pending.len() < buffer.len() {
            if let Some(fault) = self.fault.lock().take() {
                return Err(DeviceError::Fault(fault));
            }
            match self.samples.recv_timeout(FAULT_POLL) {
                Ok(chunk) => self.pending.extend(chunk),
                Err(RecvTimeoutError::Timeout) if self.is_recording() => {}
                // Paused or gone: hand back what is buffered.
                Err(_) => break,
            }
        }

        let count = self.pending.len().min(buffer.len());
        for (slot, sample) in buffer.iter_mut().zip(self.pending.drain(..count)) {
            *slot = sample;
        }
        Ok(count)
    }

    fn release(&mut self) {
        let Some(owner) = self.owner.take() else {
            return;
        };
        let _ = self.commands.send(Command::Release);
        if owner.join().is_err() {
            log::error!("cpal input thread panicked");
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcm_capture_core::models::config::{ChannelLayout, SampleFormat};

    #[test]
    fn buffer_frames_follow_sample_width() {
        let pcm16 = RecordConfig::default();
        assert_eq!(buffer_frames(&pcm16, pcm16.derived_buffer_size()), 640);

        let pcm8 = RecordConfig {
            channel_layout: ChannelLayout::Stereo,
            sample_format: SampleFormat::Pcm8,
            ..RecordConfig::default()
        };
        assert_eq!(buffer_frames(&pcm8, pcm8.derived_buffer_size()), 640);
    }
}
