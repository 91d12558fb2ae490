//! Ambient pad generator
//!
//! Two low sines (55 Hz and 110 Hz) per channel, each with its own slow
//! pitch drift, plus a faint shimmer layer. Left and right drift at slightly
//! different rates and phases, which is what gives the pad its width.

use std::f64::consts::TAU;
use std::path::Path;

use super::{frame_count, GenerateError};
use crate::audio_file::save_stereo;
use crate::dsp::{fade, normalize};
use crate::types::{Sample, StereoBuffer};

/// (base frequency Hz, amplitude) per layer
const LAYERS: [(f64, f64); 2] = [(55.0, 0.08), (110.0, 0.05)];

/// Peak pitch deviation of the drift, in Hz
const DRIFT_DEPTH_HZ: f64 = 0.4;

const SHIMMER_AMP: f64 = 0.02;

const FADE_SECS: f64 = 5.0;
const TARGET_DBFS: f64 = -20.0;

/// Per-channel modulation parameters
struct PadChannel {
    drift_rate_hz: f64,
    drift_phase: f64,
    shimmer_hz: f64,
    shimmer_phase: f64,
}

const LEFT: PadChannel = PadChannel {
    drift_rate_hz: 0.01,
    drift_phase: 0.0,
    shimmer_hz: 1.5,
    shimmer_phase: 0.0,
};

const RIGHT: PadChannel = PadChannel {
    drift_rate_hz: 0.011,
    drift_phase: 0.7,
    shimmer_hz: 1.53,
    shimmer_phase: 0.25,
};

/// Render one pad channel
///
/// Oscillator phases are integrated from the drifting frequency, so the
/// drift stays a gentle ±0.4 Hz wobble however long the bed runs. The
/// samples therefore differ from the closed form `sin(2π(f + drift)·t)`.
fn render_channel(frames: usize, sample_rate: u32, channel: &PadChannel) -> Vec<Sample> {
    let sr = sample_rate as f64;
    let mut phases = [0.0_f64; LAYERS.len()];

    let mut out = Vec::with_capacity(frames);
    for i in 0..frames {
        let t = i as f64 / sr;
        let mut value = 0.0;
        for (layer, (&(base_hz, amp), phase)) in LAYERS.iter().zip(phases.iter_mut()).enumerate() {
            value += phase.sin() * amp;
            let drift = DRIFT_DEPTH_HZ
                * (TAU * channel.drift_rate_hz * t + layer as f64 + channel.drift_phase).sin();
            *phase = (*phase + TAU * (base_hz + drift) / sr) % TAU;
        }
        value += SHIMMER_AMP * (TAU * channel.shimmer_hz * t + channel.shimmer_phase).sin();
        out.push(value as Sample);
    }

    fade(&mut out, FADE_SECS, sample_rate);
    out
}

/// Render a stereo music bed to `output_path`
///
/// The bed lasts `duration_minutes` (at least one minute), is faded in and
/// out over 5 s and normalized to -20 dBFS RMS.
pub fn generate_music_bed<P: AsRef<Path>>(
    duration_minutes: u32,
    output_path: P,
    sample_rate: u32,
) -> Result<(), GenerateError> {
    if sample_rate == 0 {
        return Err(GenerateError::InvalidParameter("sample rate must be positive".into()));
    }

    let frames = frame_count(duration_minutes, sample_rate);
    log::info!(
        "generate_music_bed: {} min -> {} frames at {} Hz",
        duration_minutes,
        frames,
        sample_rate
    );

    let (left, right) = rayon::join(
        || render_channel(frames, sample_rate, &LEFT),
        || render_channel(frames, sample_rate, &RIGHT),
    );

    let mut stereo = StereoBuffer::from_channels(&left, &right);
    drop((left, right));
    normalize(stereo.as_interleaved_mut(), TARGET_DBFS);

    save_stereo(&stereo, sample_rate, output_path.as_ref())?;
    log::info!("generate_music_bed: wrote {:?}", output_path.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_file::read_wave;
    use crate::dsp::{db_to_linear, rms};

    #[test]
    fn test_music_bed_is_one_minute_stereo_at_minus_20() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("music.wav");
        generate_music_bed(0, &path, 2000).unwrap();

        let (sr, signal) = read_wave(&path).unwrap();
        assert_eq!(sr, 2000);
        assert_eq!(signal.channels(), 2);
        assert_eq!(signal.frames(), 60 * 2000);

        let level = rms(signal.as_slice());
        let target = db_to_linear(TARGET_DBFS);
        assert!((level - target).abs() / target < 0.01, "rms {} target {}", level, target);
    }

    #[test]
    fn test_pad_channels_differ_and_start_silent() {
        let left = render_channel(20_000, 2000, &LEFT);
        let right = render_channel(20_000, 2000, &RIGHT);
        assert_eq!(left[0], 0.0);
        assert_eq!(right[19_999], 0.0);
        assert!(left.iter().zip(&right).any(|(l, r)| (l - r).abs() > 1e-3));
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate_music_bed(1, dir.path().join("x.wav"), 0).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidParameter(_)));
    }
}
