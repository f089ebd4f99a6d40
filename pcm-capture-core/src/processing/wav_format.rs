//! WAV (RIFF) container framing for raw PCM.
//!
//! The 44-byte header is written with placeholder sizes while streaming and
//! the two size fields are patched once the final length is known.

use crate::models::config::{RecordConfig, SampleFormat};
use crate::processing::byte_order::{self, ByteOrder};

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Offset of the RIFF chunk size (file size - 8).
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Offset of the data chunk size (file size - 44).
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Generate a 44-byte WAV RIFF header.
///
/// Layout (all integers little-endian):
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16
/// [20-21]  1 (PCM)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  sample_rate * channels * bits / 8
/// [32-33]  channels * bits / 8
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    data_size: u32,
) -> [u8; WAV_HEADER_SIZE] {
    let bytes_per_sample = (bits_per_sample / 8) as u32;
    let byte_rate = sample_rate * bytes_per_sample * channels as u32;
    let block_align = channels * (bits_per_sample / 8);
    let riff_size = 36u32.saturating_add(data_size);

    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&riff_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bits_per_sample.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Provisional header for streaming: both size fields are zero.
pub fn provisional_header(sample_rate: u32, channels: u16, bits_per_sample: u16) -> [u8; WAV_HEADER_SIZE] {
    let mut header = generate_wav_header(sample_rate, channels, bits_per_sample, 0);
    header[4..8].copy_from_slice(&0u32.to_le_bytes());
    header
}

/// The two size fields for a finished file of `total_file_size` bytes,
/// clamped to what a 32-bit RIFF field can hold.
pub fn size_fields(total_file_size: u64) -> (u32, u32) {
    let riff = total_file_size.saturating_sub(8).min(u32::MAX as u64) as u32;
    let data = total_file_size
        .saturating_sub(WAV_HEADER_SIZE as u64)
        .min(u32::MAX as u64) as u32;
    (riff, data)
}

/// Patch both size fields of an in-memory header.
pub fn patch_sizes(header: &mut [u8], total_file_size: u64) {
    let (riff, data) = size_fields(total_file_size);
    header[4..8].copy_from_slice(&riff.to_le_bytes());
    header[40..44].copy_from_slice(&data.to_le_bytes());
}

/// Wrap a complete PCM buffer in a WAV container.
pub fn wrap_pcm(sample_rate: u32, channels: u16, bits_per_sample: u16, pcm: &[u8]) -> Vec<u8> {
    let data_size = pcm.len().min(u32::MAX as usize - 36) as u32;
    let header = generate_wav_header(sample_rate, channels, bits_per_sample, data_size);
    let mut wav = Vec::with_capacity(WAV_HEADER_SIZE + pcm.len());
    wav.extend_from_slice(&header);
    wav.extend_from_slice(pcm);
    wav
}

/// [`wrap_pcm`] using the format of a session config.
pub fn wrap_pcm_for(config: &RecordConfig, pcm: &[u8]) -> Vec<u8> {
    wrap_pcm(config.sample_rate_hz, config.channels(), config.bits_per_sample(), pcm)
}

/// Encode one frame of samples for the container.
///
/// 16-bit samples are written in the host's byte order; 8-bit samples keep
/// the high byte and are shifted to WAV's unsigned range.
pub fn encode_samples(samples: &[i16], format: SampleFormat) -> Vec<u8> {
    match format {
        SampleFormat::Pcm16 => byte_order::samples_to_bytes(samples, ByteOrder::native()),
        SampleFormat::Pcm8 => samples
            .iter()
            .map(|&s| ((s >> 8) as i8 as u8) ^ 0x80)
            .collect(),
    }
}
