/// Loudness of one frame in decibels: `10 * log10(mean(s²))`, truncated.
///
/// Silence yields `-inf`, which saturates to `i32::MIN`; an empty frame is
/// NaN and becomes 0. Consumers must tolerate both.
pub fn calculate_volume(samples: &[i16]) -> i32 {
    let sum: i64 = samples.iter().map(|&s| s as i64 * s as i64).sum();
    let mean = sum as f64 / samples.len() as f64;
    (10.0 * mean.log10()) as i32
}
