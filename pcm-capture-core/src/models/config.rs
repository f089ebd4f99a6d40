use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Fixed read period of the capture loop in milliseconds.
///
/// Frame length and recorded time are both derived from this.
pub const TIMER_INTERVAL_MS: u64 = 20;

pub const SAMPLE_RATE_8K_HZ: u32 = 8000;
pub const SAMPLE_RATE_11K_HZ: u32 = 11025;
pub const SAMPLE_RATE_16K_HZ: u32 = 16000;
pub const SAMPLE_RATE_22K_HZ: u32 = 22050;
pub const SAMPLE_RATE_44K_HZ: u32 = 44100;

/// Logical input selector handed to the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// The platform's default microphone.
    #[default]
    Mic,
    /// A specific device, matched by name.
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLayout {
    #[default]
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub const fn channels(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleFormat {
    #[serde(rename = "pcm8")]
    Pcm8,
    #[default]
    #[serde(rename = "pcm16")]
    Pcm16,
}

impl SampleFormat {
    pub const fn bits_per_sample(self) -> u16 {
        match self {
            Self::Pcm8 => 8,
            Self::Pcm16 => 16,
        }
    }

    pub const fn bytes_per_sample(self) -> usize {
        self.bits_per_sample() as usize / 8
    }
}

/// Per-session capture format. Defaults to 16 kHz mono 16-bit from the mic.
///
/// Channel count and sample width are derived from `channel_layout` and
/// `sample_format`; they are never stored separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    pub source: InputSource,
    pub sample_rate_hz: u32,
    pub channel_layout: ChannelLayout,
    pub sample_format: SampleFormat,
}

impl RecordConfig {
    pub fn new(
        source: InputSource,
        sample_rate_hz: u32,
        channel_layout: ChannelLayout,
        sample_format: SampleFormat,
    ) -> Self {
        Self {
            source,
            sample_rate_hz,
            channel_layout,
            sample_format,
        }
    }

    pub fn channels(&self) -> u16 {
        self.channel_layout.channels()
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.sample_format.bits_per_sample()
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.sample_format.bytes_per_sample()
    }

    /// Samples per channel delivered by one read.
    pub fn frame_period(&self) -> usize {
        (self.sample_rate_hz as u64 * TIMER_INTERVAL_MS / 1000) as usize
    }

    /// Interleaved sample count of one frame.
    pub fn frame_len(&self) -> usize {
        self.frame_period() * self.channels() as usize
    }

    /// Double-buffered device buffer size in bytes, before the device
    /// minimum is applied.
    pub fn derived_buffer_size(&self) -> usize {
        self.frame_period() * 2 * self.bytes_per_sample() * self.channels() as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::Invalid("sample rate must be positive".into()));
        }
        if self.frame_period() == 0 {
            return Err(ConfigError::Invalid(format!(
                "sample rate {} Hz yields an empty {} ms frame",
                self.sample_rate_hz, TIMER_INTERVAL_MS
            )));
        }
        Ok(())
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            source: InputSource::Mic,
            sample_rate_hz: SAMPLE_RATE_16K_HZ,
            channel_layout: ChannelLayout::Mono,
            sample_format: SampleFormat::Pcm16,
        }
    }
}

/// Recorder-level policy that outlives individual sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderOptions {
    /// Recording stops once this much audio has been captured
    /// (None = unlimited).
    pub max_record_time_ms: Option<u64>,

    /// Volume callback period. At least 100 ms, a multiple of
    /// [`TIMER_INTERVAL_MS`].
    pub volume_interval_ms: u64,

    /// Target file; None records without persistence.
    pub record_file_path: Option<PathBuf>,

    /// Write a WAV header (true) or raw PCM (false).
    pub wav_format: bool,
}

pub const DEFAULT_MAX_RECORD_TIME_MS: u64 = 6000;
pub const DEFAULT_VOLUME_INTERVAL_MS: u64 = 200;
pub const MIN_VOLUME_INTERVAL_MS: u64 = 100;

impl RecorderOptions {
    /// Normalizes a requested volume interval. Returns None when the
    /// request is below [`MIN_VOLUME_INTERVAL_MS`].
    pub fn normalize_volume_interval(interval_ms: u64) -> Option<u64> {
        if interval_ms < MIN_VOLUME_INTERVAL_MS {
            return None;
        }
        Some(interval_ms / TIMER_INTERVAL_MS * TIMER_INTERVAL_MS)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Self::normalize_volume_interval(self.volume_interval_ms) != Some(self.volume_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "volume interval {} ms must be >= {} ms and a multiple of {} ms",
                self.volume_interval_ms, MIN_VOLUME_INTERVAL_MS, TIMER_INTERVAL_MS
            )));
        }
        Ok(())
    }
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            max_record_time_ms: Some(DEFAULT_MAX_RECORD_TIME_MS),
            volume_interval_ms: DEFAULT_VOLUME_INTERVAL_MS,
            record_file_path: None,
            wav_format: true,
        }
    }
}
