//! Conversions from host sample formats to the signed 16-bit frames the
//! capture core consumes.

/// Float samples in [-1.0, 1.0] to i16, clamping out-of-range input.
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// Offset-binary u16 samples (silence at 32768) to i16.
pub fn u16_to_i16(samples: &[u16]) -> Vec<i16> {
    samples.iter().map(|&s| (s as i32 - 32768) as i16).collect()
}
