//! Binaural beat generator
//!
//! Left ear plays the carrier, right ear plays carrier + beat. Both share a
//! slow breathing envelope so the tone never sits perfectly still.

use std::f64::consts::TAU;
use std::path::Path;

use super::{frame_count, GenerateError};
use crate::audio_file::save_stereo;
use crate::dsp::{fade, normalize};
use crate::types::{Sample, StereoBuffer};

/// Default carrier frequency, in Hz
pub const DEFAULT_CARRIER_HZ: f64 = 180.0;

const GAIN: f64 = 0.12;
const ENVELOPE_HZ: f64 = 0.1;
const FADE_SECS: f64 = 4.0;
const TARGET_DBFS: f64 = -22.0;

/// `0.6 + 0.4 * sin(2π * 0.1 * t)`, always in [0.2, 1.0]
#[inline]
fn breathing(t: f64) -> f64 {
    0.6 + 0.4 * (TAU * ENVELOPE_HZ * t).sin()
}

fn render_tone(frames: usize, sample_rate: u32, freq_hz: f64) -> Vec<Sample> {
    let sr = sample_rate as f64;
    let mut out: Vec<Sample> = (0..frames)
        .map(|i| {
            let t = i as f64 / sr;
            ((TAU * freq_hz * t).sin() * breathing(t) * GAIN) as Sample
        })
        .collect();
    fade(&mut out, FADE_SECS, sample_rate);
    out
}

/// Render a stereo binaural track to `output_path`
///
/// Lasts `duration_minutes` (at least one minute), faded over 4 s and
/// normalized to -22 dBFS RMS.
pub fn generate_binaural_track<P: AsRef<Path>>(
    duration_minutes: u32,
    output_path: P,
    sample_rate: u32,
    carrier_hz: f64,
    beat_hz: f64,
) -> Result<(), GenerateError> {
    if sample_rate == 0 {
        return Err(GenerateError::InvalidParameter("sample rate must be positive".into()));
    }
    if !(carrier_hz.is_finite() && carrier_hz > 0.0) {
        return Err(GenerateError::InvalidParameter(format!(
            "carrier must be positive, got {}",
            carrier_hz
        )));
    }
    if !(beat_hz.is_finite() && beat_hz > 0.0) {
        return Err(GenerateError::InvalidParameter(format!(
            "beat must be positive, got {}",
            beat_hz
        )));
    }

    let frames = frame_count(duration_minutes, sample_rate);
    log::info!(
        "generate_binaural_track: carrier {} Hz, beat {} Hz, {} frames at {} Hz",
        carrier_hz,
        beat_hz,
        frames,
        sample_rate
    );

    let (left, right) = rayon::join(
        || render_tone(frames, sample_rate, carrier_hz),
        || render_tone(frames, sample_rate, carrier_hz + beat_hz),
    );

    let mut stereo = StereoBuffer::from_channels(&left, &right);
    drop((left, right));
    normalize(stereo.as_interleaved_mut(), TARGET_DBFS);

    save_stereo(&stereo, sample_rate, output_path.as_ref())?;
    log::info!("generate_binaural_track: wrote {:?}", output_path.as_ref());
    Ok(())
}
