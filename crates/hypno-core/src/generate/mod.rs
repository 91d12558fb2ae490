//! Procedural ambient beds
//!
//! Two generators render straight to WAV files through the codec:
//!
//! - [`generate_music_bed`]: a stereo pad of slowly drifting low sines
//! - [`generate_binaural_track`]: a carrier in the left ear, carrier + beat
//!   in the right ear
//!
//! Both clamp the requested duration to at least [`MIN_DURATION_SECS`] and
//! never hand the rendered buffer back to the caller.
//!
//! The beat frequency is chosen by [`pick_binaural_beat`] from a named band,
//! an explicit override, or the session objective.

mod binaural;
mod music;

pub use binaural::{generate_binaural_track, DEFAULT_CARRIER_HZ};
pub use music::generate_music_bed;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio_file::WavError;

/// Shortest bed ever rendered, in seconds
pub const MIN_DURATION_SECS: u64 = 60;

/// Generator errors
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Invalid generator parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Wav(#[from] WavError),
}

/// Frame count for a requested duration, floored at [`MIN_DURATION_SECS`]
pub(crate) fn frame_count(duration_minutes: u32, sample_rate: u32) -> usize {
    let seconds = (duration_minutes as u64 * 60).max(MIN_DURATION_SECS);
    (seconds * sample_rate as u64) as usize
}

/// Named brainwave bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinauralBand {
    /// Let the session objective decide
    #[default]
    Auto,
    /// 0.5-4 Hz, deep sleep
    Delta,
    /// 4-8 Hz, relaxation and trance
    Theta,
    /// 8-13 Hz, calm alertness
    Alpha,
    /// 13-30 Hz, focus
    Beta,
    /// Above 30 Hz
    Gamma,
}

impl BinauralBand {
    /// Typical beat in the middle of the band (`None` for `Auto`)
    pub fn typical_beat_hz(&self) -> Option<f64> {
        match self {
            BinauralBand::Auto => None,
            BinauralBand::Delta => Some(2.0),
            BinauralBand::Theta => Some(6.0),
            BinauralBand::Alpha => Some(10.0),
            BinauralBand::Beta => Some(18.0),
            BinauralBand::Gamma => Some(40.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BinauralBand::Auto => "auto",
            BinauralBand::Delta => "delta",
            BinauralBand::Theta => "theta",
            BinauralBand::Alpha => "alpha",
            BinauralBand::Beta => "beta",
            BinauralBand::Gamma => "gamma",
        }
    }
}

impl FromStr for BinauralBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BinauralBand::Auto),
            "delta" => Ok(BinauralBand::Delta),
            "theta" => Ok(BinauralBand::Theta),
            "alpha" => Ok(BinauralBand::Alpha),
            "beta" => Ok(BinauralBand::Beta),
            "gamma" => Ok(BinauralBand::Gamma),
            other => Err(format!("unknown binaural band: {}", other)),
        }
    }
}

/// What the session is meant to help with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    Sleep,
    Stress,
    Confidence,
    Performance,
    Pain,
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sleep" => Ok(Objective::Sleep),
            "stress" => Ok(Objective::Stress),
            "confidence" => Ok(Objective::Confidence),
            "performance" => Ok(Objective::Performance),
            "pain" => Ok(Objective::Pain),
            other => Err(format!("unknown objective: {}", other)),
        }
    }
}

/// The band label and beat actually used for a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinauralChoice {
    #[serde(rename = "binaural_band_used")]
    pub band_label: String,
    #[serde(rename = "binaural_beat_hz_used")]
    pub beat_hz: f64,
}

/// Resolve the binaural beat for a session
///
/// An explicit positive override always wins. Otherwise a named band maps
/// to its typical beat, and `Auto` follows the objective, falling back to
/// theta.
pub fn pick_binaural_beat(
    band: BinauralBand,
    beat_override: Option<f64>,
    objective: Option<Objective>,
) -> BinauralChoice {
    if let Some(beat) = beat_override.filter(|b| b.is_finite() && *b > 0.0) {
        let label = match band {
            BinauralBand::Auto => "custom",
            named => named.name(),
        };
        return BinauralChoice {
            band_label: label.to_string(),
            beat_hz: beat,
        };
    }

    let resolved = match (band, objective) {
        (BinauralBand::Auto, Some(Objective::Sleep | Objective::Pain)) => BinauralBand::Delta,
        (BinauralBand::Auto, Some(Objective::Stress | Objective::Confidence)) => BinauralBand::Alpha,
        (BinauralBand::Auto, Some(Objective::Performance)) => BinauralBand::Gamma,
        (BinauralBand::Auto, None) => BinauralBand::Theta,
        (named, _) => named,
    };

    BinauralChoice {
        band_label: resolved.name().to_string(),
        beat_hz: resolved.typical_beat_hz().unwrap_or(6.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let choice = pick_binaural_beat(BinauralBand::Alpha, Some(7.83), Some(Objective::Sleep));
        assert_eq!(choice.band_label, "alpha");
        assert_eq!(choice.beat_hz, 7.83);

        let choice = pick_binaural_beat(BinauralBand::Auto, Some(4.5), None);
        assert_eq!(choice.band_label, "custom");
        assert_eq!(choice.beat_hz, 4.5);
    }

    #[test]
    fn test_non_positive_override_ignored() {
        let choice = pick_binaural_beat(BinauralBand::Beta, Some(0.0), None);
        assert_eq!(choice.beat_hz, 18.0);
        let choice = pick_binaural_beat(BinauralBand::Beta, Some(f64::NAN), None);
        assert_eq!(choice.beat_hz, 18.0);
    }

    #[test]
    fn test_named_bands() {
        for (band, beat) in [
            (BinauralBand::Delta, 2.0),
            (BinauralBand::Theta, 6.0),
            (BinauralBand::Alpha, 10.0),
            (BinauralBand::Beta, 18.0),
            (BinauralBand::Gamma, 40.0),
        ] {
            let choice = pick_binaural_beat(band, None, Some(Objective::Performance));
            assert_eq!(choice.beat_hz, beat);
            assert_eq!(choice.band_label, band.name());
        }
    }

    #[test]
    fn test_auto_follows_objective() {
        let cases = [
            (Some(Objective::Sleep), "delta"),
            (Some(Objective::Pain), "delta"),
            (Some(Objective::Stress), "alpha"),
            (Some(Objective::Confidence), "alpha"),
            (Some(Objective::Performance), "gamma"),
            (None, "theta"),
        ];
        for (objective, label) in cases {
            assert_eq!(pick_binaural_beat(BinauralBand::Auto, None, objective).band_label, label);
        }
    }

    #[test]
    fn test_band_parsing() {
        assert_eq!("Theta".parse::<BinauralBand>(), Ok(BinauralBand::Theta));
        assert!("omega".parse::<BinauralBand>().is_err());
        assert_eq!(" sleep ".parse::<Objective>(), Ok(Objective::Sleep));
    }

    #[test]
    fn test_duration_floor() {
        assert_eq!(frame_count(0, 8000), 60 * 8000);
        assert_eq!(frame_count(1, 8000), 60 * 8000);
        assert_eq!(frame_count(5, 8000), 300 * 8000);
    }
}
