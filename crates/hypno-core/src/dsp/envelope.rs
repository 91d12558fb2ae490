//! Sidechain envelope follower and duck mask
//!
//! The envelope is a one-pole low-pass over |x|. The mask turns it into a
//! soft-knee gate: 0 below the threshold, rising linearly to 1 at twice the
//! threshold.

use crate::types::{Sample, StereoBuffer};

/// Shortest release accepted, in seconds
const MIN_RELEASE_S: f64 = 0.001;

/// Follow the amplitude of `signal` with a one-pole smoother
///
/// `y[n] = a*y[n-1] + (1-a)*|x[n]|` with `a = exp(-1 / (sample_rate * release_s))`.
pub fn envelope_follower(signal: &[Sample], sample_rate: u32, release_s: f64) -> Vec<Sample> {
    if signal.is_empty() {
        return Vec::new();
    }
    let tau = release_s.max(MIN_RELEASE_S);
    let alpha = (-1.0 / (sample_rate.max(1) as f64 * tau)).exp();
    let mut y = 0.0_f64;
    signal
        .iter()
        .map(|&x| {
            y = alpha * y + (1.0 - alpha) * (x.abs() as f64);
            y as Sample
        })
        .collect()
}

/// Map an envelope to a 0..1 duck amount
pub fn duck_mask(envelope: &[Sample], threshold: f64) -> Vec<Sample> {
    let knee = threshold.max(1e-6);
    envelope
        .iter()
        .map(|&e| ((e as f64 - threshold) / knee).clamp(0.0, 1.0) as Sample)
        .collect()
}

/// Attenuate a bed by `1 - strength * mask` over the region both cover
pub fn apply_duck(bed: &mut StereoBuffer, mask: &[Sample], strength: f64) {
    let strength = strength as Sample;
    for (frame, &m) in bed.iter_mut().zip(mask.iter()) {
        *frame *= 1.0 - strength * m;
    }
}
