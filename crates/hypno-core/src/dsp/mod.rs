//! Signal utilities shared by the generators and the mixdown
//!
//! All operations work in place on flat sample slices. Multi-channel
//! signals are normalized over their flattened (interleaved) samples.

pub mod envelope;

pub use envelope::{duck_mask, envelope_follower};

use crate::types::{Sample, StereoBuffer};

/// Added under the square root so silence never reaches log(0)
const RMS_EPSILON: f64 = 1e-9;

/// Convert decibels to a linear amplitude factor
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Hard-clip every sample to [-1, 1]
pub fn clip(samples: &mut [Sample]) {
    for s in samples {
        *s = s.clamp(-1.0, 1.0);
    }
}

/// Root mean square over all samples, including the epsilon floor
pub fn rms(samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64 + RMS_EPSILON).sqrt()
}

/// Scale samples so their RMS reaches `target_db` dBFS
///
/// Empty input and exact silence are left untouched.
pub fn normalize(samples: &mut [Sample], target_db: f64) {
    if samples.is_empty() {
        return;
    }
    let current = rms(samples);
    if current == 0.0 {
        return;
    }
    let gain = (db_to_linear(target_db) / current) as Sample;
    for s in samples.iter_mut() {
        *s *= gain;
    }
}

/// Number of samples covered by a ramp, or `None` if the ramp must be skipped
///
/// Skipped when the ramp would be empty or the head and tail ramps would overlap.
fn ramp_len(len: usize, fade_seconds: f64, sample_rate: u32) -> Option<usize> {
    let n = (fade_seconds * sample_rate as f64).max(0.0) as usize;
    if n == 0 || n * 2 > len {
        None
    } else {
        Some(n)
    }
}

/// Ramp weight for position `i` of an `n`-point 0..=1 ramp (inclusive endpoints)
#[inline]
fn ramp(i: usize, n: usize) -> Sample {
    if n < 2 {
        0.0
    } else {
        (i as f64 / (n - 1) as f64) as Sample
    }
}

/// Linear fade-in over the first and fade-out over the last `fade_seconds`
pub fn fade(samples: &mut [Sample], fade_seconds: f64, sample_rate: u32) {
    let len = samples.len();
    let Some(n) = ramp_len(len, fade_seconds, sample_rate) else {
        return;
    };
    for i in 0..n {
        let w = ramp(i, n);
        samples[i] *= w;
        samples[len - 1 - i] *= w;
    }
}

/// [`fade`] applied to both channels of a stereo buffer
pub fn fade_stereo(buffer: &mut StereoBuffer, fade_seconds: f64, sample_rate: u32) {
    let len = buffer.len();
    let Some(n) = ramp_len(len, fade_seconds, sample_rate) else {
        return;
    };
    let frames = buffer.as_mut_slice();
    for i in 0..n {
        let w = ramp(i, n);
        frames[i] *= w;
        frames[len - 1 - i] *= w;
    }
}

/// Sum mono tracks of any lengths and hard-clip the result
///
/// Shorter tracks only contribute to the region they cover.
pub fn combine_tracks(tracks: &[&[Sample]]) -> Vec<Sample> {
    let length = tracks.iter().map(|t| t.len()).max().unwrap_or(0);
    let mut mix = vec![0.0; length];
    for track in tracks {
        for (dst, &src) in mix.iter_mut().zip(track.iter()) {
            *dst += src;
        }
    }
    clip(&mut mix);
    mix
}
