//! Linear-interpolation resampling
//!
//! Input and output are both treated as evenly spaced over the same unit
//! interval with inclusive endpoints, so the first and last samples are
//! preserved and the duration is kept. No anti-aliasing filter is applied:
//! downsampling folds content above the new Nyquist frequency back into the
//! band. For the 8 kHz speech-over-pad mixes produced here that is an
//! accepted limitation, not a bug.

use crate::types::{Sample, Signal, StereoBuffer};

/// Output length for `len` input samples
fn output_len(len: usize, sr_in: u32, sr_out: u32) -> usize {
    (len as f64 * sr_out as f64 / sr_in as f64).round() as usize
}

/// Resample one channel
pub fn resample_mono(input: &[Sample], sr_in: u32, sr_out: u32) -> Vec<Sample> {
    if sr_in == sr_out || input.len() < 2 || sr_in == 0 {
        return input.to_vec();
    }

    let n_out = output_len(input.len(), sr_in, sr_out);
    let last_in = (input.len() - 1) as f64;
    let step = if n_out > 1 {
        last_in / (n_out - 1) as f64
    } else {
        0.0
    };

    (0..n_out)
        .map(|j| {
            let pos = j as f64 * step;
            let idx = (pos.floor() as usize).min(input.len() - 2);
            let frac = (pos - idx as f64) as Sample;
            let a = input[idx];
            let b = input[idx + 1];
            a + (b - a) * frac
        })
        .collect()
}

/// Resample every channel of a signal independently
pub fn resample_linear(signal: &Signal, sr_in: u32, sr_out: u32) -> Signal {
    if sr_in == sr_out || signal.frames() < 2 {
        return signal.clone();
    }
    if signal.is_mono() {
        return Signal::mono(resample_mono(signal.as_slice(), sr_in, sr_out));
    }
    let channels: Vec<Vec<Sample>> = (0..signal.channels())
        .map(|ch| resample_mono(&signal.channel(ch), sr_in, sr_out))
        .collect();
    Signal::from_channels(&channels)
}

/// Resample both channels of a stereo buffer
pub fn resample_stereo(buffer: &StereoBuffer, sr_in: u32, sr_out: u32) -> StereoBuffer {
    if sr_in == sr_out || buffer.len() < 2 {
        return buffer.clone();
    }
    let left = resample_mono(&buffer.left(), sr_in, sr_out);
    let right = resample_mono(&buffer.right(), sr_in, sr_out);
    StereoBuffer::from_channels(&left, &right)
}
