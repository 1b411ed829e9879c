use std::f64::consts::TAU;

use crate::SynthesisResult;

/// Output sample rate of the tone generator, matching espeak-ng's native rate.
pub const SAMPLE_RATE: u32 = 22050;

/// Assumed speaking rate used to turn character count into clip length.
pub const CHARS_PER_SECOND: f64 = 15.0;

/// Shortest clip ever produced, including for empty text.
pub const MIN_DURATION_SECS: f64 = 1.0;

/// Base frequency of the tone.
pub const FUNDAMENTAL_HZ: f64 = 220.0;

/// Length of each linear fade (100ms @ 22.05kHz).
pub const FADE_SAMPLES: usize = SAMPLE_RATE as usize / 10;

/// Longest clip produced, well inside a WAV data chunk's u32 byte limit.
pub const MAX_CLIP_SECS: f64 = 3600.0;

/// [`MAX_CLIP_SECS`] in samples.
pub const MAX_SAMPLES: usize = (MAX_CLIP_SECS as usize) * SAMPLE_RATE as usize;

/// (harmonic number, amplitude) pairs summed into the tone.
const PARTIALS: [(f64, f64); 3] = [(1.0, 0.3), (2.0, 0.1), (3.0, 0.05)];

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ToneError {
    #[error("Invalid speed factor {0}: must be a finite number greater than zero")]
    InvalidSpeedFactor(f32),
    #[error("Clip of {samples:.0} samples exceeds the one hour maximum")]
    ClipTooLong { samples: f64 },
}

/// Generate the placeholder clip for `text` at the given speed factor.
///
/// Only the character count of `text` matters. The clip lasts
/// `max(1, chars / 15)` seconds at speed 1.0 and is resampled by linear
/// interpolation for any other speed, which shifts pitch along with
/// duration.
pub fn synthesize(text: &str, speed: f32) -> Result<SynthesisResult, ToneError> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(ToneError::InvalidSpeedFactor(speed));
    }

    let char_count = text.chars().count();
    let duration = clip_duration_secs(char_count);
    let mut samples = harmonic_tone(checked_len(SAMPLE_RATE as f64 * duration)?);
    let fade = fade_len(samples.len());
    apply_fades(&mut samples, fade);

    if speed != 1.0 {
        let target = resampled_len(samples.len(), speed)?;
        log::debug!(
            "Resampling tone from {} to {} samples (speed {speed})",
            samples.len(),
            target
        );
        samples = resample_linear(&samples, target);
    }

    log::debug!(
        "Generated fallback tone: {char_count} chars, {:.2}s base, {} samples",
        duration,
        samples.len()
    );

    Ok(SynthesisResult {
        samples,
        sample_rate: SAMPLE_RATE,
    })
}

/// Clip length in seconds before any speed adjustment.
pub fn clip_duration_secs(char_count: usize) -> f64 {
    (char_count as f64 / CHARS_PER_SECOND).max(MIN_DURATION_SECS)
}

/// Round a sample count, rejecting anything past [`MAX_SAMPLES`] before it
/// is cast or allocated.
fn checked_len(samples: f64) -> Result<usize, ToneError> {
    let samples = samples.round();
    if samples > MAX_SAMPLES as f64 {
        return Err(ToneError::ClipTooLong { samples });
    }
    Ok(samples as usize)
}

fn harmonic_tone(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            PARTIALS
                .iter()
                .map(|&(harmonic, amp)| amp * (TAU * FUNDAMENTAL_HZ * harmonic * t).sin())
                .sum::<f64>() as f32
        })
        .collect()
}

/// Fade window for a buffer of `len` samples; never more than half the buffer.
fn fade_len(len: usize) -> usize {
    FADE_SAMPLES.min(len / 2)
}

/// Gain of step `i` in a 0→1 ramp of `len` steps, endpoints included.
fn ramp(i: usize, len: usize) -> f32 {
    if len <= 1 {
        return 0.0;
    }
    i as f32 / (len - 1) as f32
}

/// Linear fade-in over the first `fade` samples and fade-out over the last `fade`.
///
/// `fade` must not exceed `samples.len() / 2`.
fn apply_fades(samples: &mut [f32], fade: usize) {
    let n = samples.len();
    debug_assert!(fade <= n / 2);
    for i in 0..fade {
        let gain = ramp(i, fade);
        samples[i] *= gain;
        samples[n - 1 - i] *= gain;
    }
}

fn resampled_len(len: usize, speed: f32) -> Result<usize, ToneError> {
    Ok(checked_len(len as f64 / speed as f64)?.max(1))
}

/// Resample `src` to `target` samples by linear interpolation.
///
/// Output sample `j` reads the source at position `j * len / (target - 1)`;
/// positions past the last index clamp to the last sample, so both endpoints
/// of the source are preserved.
fn resample_linear(src: &[f32], target: usize) -> Vec<f32> {
    let Some(&last) = src.last() else {
        return vec![0.0; target];
    };
    if target <= 1 {
        return vec![src[0]; target];
    }

    let step = src.len() as f64 / (target - 1) as f64;
    let last_idx = (src.len() - 1) as f64;

    (0..target)
        .map(|j| {
            let x = j as f64 * step;
            if x >= last_idx {
                return last;
            }
            let i = x.floor() as usize;
            let frac = (x - i as f64) as f32;
            src[i] + (src[i + 1] - src[i]) * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(len: usize) -> String {
        "a".repeat(len)
    }

    #[test]
    fn empty_text_gets_one_second_floor() {
        let result = synthesize("", 1.0).unwrap();
        assert_eq!(result.samples.len(), SAMPLE_RATE as usize);
        assert_eq!(result.sample_rate, SAMPLE_RATE);
    }

    #[test]
    fn fifteen_chars_is_one_second() {
        let result = synthesize(&text_of(15), 1.0).unwrap();
        assert_eq!(result.samples.len(), 22050);
        assert!((result.duration_secs() - 1.0).abs() < 1.0 / 22050.0);
    }

    #[test]
    fn duration_scales_with_text_length() {
        let result = synthesize(&text_of(16), 1.0).unwrap();
        assert_eq!(result.samples.len(), 23520);

        let result = synthesize(&text_of(45), 1.0).unwrap();
        assert_eq!(result.samples.len(), 66150);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let ascii = synthesize(&text_of(30), 1.0).unwrap();
        let wide = synthesize(&"語".repeat(30), 1.0).unwrap();
        assert_eq!(ascii.samples.len(), wide.samples.len());
    }

    #[test]
    fn double_speed_halves_long_clip() {
        let result = synthesize(&text_of(150), 2.0).unwrap();
        assert_eq!(result.samples.len(), 110250);
    }

    #[test]
    fn half_speed_doubles_clip() {
        let result = synthesize("", 0.5).unwrap();
        assert_eq!(result.samples.len(), 44100);
    }

    #[test]
    fn endpoints_are_silent() {
        for speed in [0.5, 0.7, 1.0, 1.3, 2.0] {
            let result = synthesize("Hello there, general listener.", speed).unwrap();
            let first = result.samples[0];
            let last = *result.samples.last().unwrap();
            assert!(first.abs() < 1e-6, "speed {speed}: first sample {first}");
            assert!(last.abs() < 1e-6, "speed {speed}: last sample {last}");
        }
    }

    #[test]
    fn peak_stays_within_harmonic_sum() {
        let result = synthesize(&text_of(40), 1.0).unwrap();
        let peak = result.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak <= 0.45 + 1e-6);
        assert!(peak > 0.3);
    }

    #[test]
    fn rejects_non_positive_speed() {
        assert_eq!(
            synthesize("text", 0.0),
            Err(ToneError::InvalidSpeedFactor(0.0))
        );
        assert_eq!(
            synthesize("text", -1.0),
            Err(ToneError::InvalidSpeedFactor(-1.0))
        );
        assert!(synthesize("text", f32::NAN).is_err());
        assert!(synthesize("text", f32::INFINITY).is_err());
    }

    #[test]
    fn extreme_speed_still_yields_a_sample() {
        let result = synthesize("x", 1.0e9).unwrap();
        assert_eq!(result.samples.len(), 1);
    }

    #[test]
    fn tiny_speed_is_rejected_before_allocating() {
        assert!(matches!(
            synthesize("hello", 1.0e-20),
            Err(ToneError::ClipTooLong { .. })
        ));
        assert!(matches!(
            synthesize("hello", 1.0e-5),
            Err(ToneError::ClipTooLong { .. })
        ));
    }

    #[test]
    fn huge_text_is_rejected() {
        let chars = (MAX_CLIP_SECS * CHARS_PER_SECOND) as usize + 15;
        assert!(matches!(
            synthesize(&text_of(chars), 2.0),
            Err(ToneError::ClipTooLong { .. })
        ));
    }

    #[test]
    fn clip_length_limit_is_inclusive() {
        assert_eq!(checked_len(MAX_SAMPLES as f64), Ok(MAX_SAMPLES));
        assert!(checked_len(MAX_SAMPLES as f64 + 1.0).is_err());
        assert!(checked_len(f64::INFINITY).is_err());
        // Largest clip must still fit a float32 WAV data chunk.
        assert!(MAX_SAMPLES * 4 <= u32::MAX as usize);
    }

    #[test]
    fn fade_is_clamped_to_half_of_short_buffers() {
        assert_eq!(fade_len(100), 50);
        assert_eq!(fade_len(3), 1);
        assert_eq!(fade_len(1_000_000), FADE_SAMPLES);

        let mut samples = vec![1.0f32; 10];
        let fade = fade_len(samples.len());
        apply_fades(&mut samples, fade);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[4], 1.0);
        assert_eq!(samples[5], 1.0);
        assert_eq!(samples[9], 0.0);
        assert!((samples[2] - 0.5).abs() < 1e-6);
        assert!((samples[7] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn full_fade_ramps_are_linear() {
        let mut samples = vec![1.0f32; 3 * FADE_SAMPLES];
        apply_fades(&mut samples, FADE_SAMPLES);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[FADE_SAMPLES - 1], 1.0);
        assert_eq!(samples[FADE_SAMPLES], 1.0);
        assert_eq!(samples[2 * FADE_SAMPLES], 1.0);
        assert_eq!(*samples.last().unwrap(), 0.0);
    }

    #[test]
    fn resample_interpolates_between_neighbours() {
        let src = [0.0, 1.0, 0.0];
        // positions 0, 0.75, 1.5, 2.25 (clamped)
        let out = resample_linear(&src, 5);
        assert_eq!(out.len(), 5);
        assert!((out[1] - 0.75).abs() < 1e-6);
        assert!((out[2] - 0.5).abs() < 1e-6);
        assert_eq!(out[4], 0.0);
    }

    #[test]
    fn resample_edge_lengths() {
        assert_eq!(resample_linear(&[0.25, 0.5], 1), vec![0.25]);
        assert!(resample_linear(&[0.25, 0.5], 0).is_empty());
        assert_eq!(resample_linear(&[], 2), vec![0.0, 0.0]);
    }
}
