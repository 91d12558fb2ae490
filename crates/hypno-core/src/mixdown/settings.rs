//! Mixdown settings
//!
//! Stored as a section of the render config YAML; every field has a
//! default so partial files load.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Stem, DEFAULT_SAMPLE_RATE};

/// A mix setting outside its valid range
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MixSettingsError {
    #[error("{stem} volume must be >= 0, got {value}")]
    NegativeVolume { stem: Stem, value: f64 },

    #[error("{stem} offset must be >= 0 seconds, got {value}")]
    NegativeOffset { stem: Stem, value: f64 },

    #[error("{stem} ducking strength must be within [0, 1], got {value}")]
    StrengthOutOfRange { stem: Stem, value: f64 },

    #[error("Ducking threshold must be >= 0, got {0}")]
    NegativeThreshold(f64),

    #[error("Ducking release must be >= 0 seconds, got {0}")]
    NegativeRelease(f64),

    #[error("Sample rate must be positive")]
    ZeroSampleRate,

    #[error("{0} is not a finite number")]
    NonFinite(&'static str),
}

/// Volumes, offsets and ducking for one mixdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixSettings {
    pub voice_volume: f64,
    pub music_volume: f64,
    pub binaural_volume: f64,

    /// Seconds of silence placed before each stem
    pub voice_offset_s: f64,
    pub music_offset_s: f64,
    pub binaural_offset_s: f64,

    /// Common rate every stem is resampled to
    pub sample_rate: u32,

    pub ducking_enabled: bool,
    /// How far the music bed drops under full voice (0 = untouched, 1 = muted)
    pub duck_music: f64,
    pub duck_binaural: f64,
    /// Envelope level where ducking starts; full duck at twice this
    pub duck_threshold: f64,
    /// Envelope release time constant in seconds
    pub duck_release_s: f64,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            voice_volume: 1.0,
            music_volume: 0.35,
            binaural_volume: 0.25,
            voice_offset_s: 0.0,
            music_offset_s: 0.0,
            binaural_offset_s: 0.0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            ducking_enabled: true,
            duck_music: 0.65,
            duck_binaural: 0.35,
            duck_threshold: 0.015,
            duck_release_s: 0.08,
        }
    }
}

impl MixSettings {
    pub fn volume(&self, stem: Stem) -> f64 {
        match stem {
            Stem::Voice => self.voice_volume,
            Stem::Music => self.music_volume,
            Stem::Binaural => self.binaural_volume,
        }
    }

    pub fn offset_s(&self, stem: Stem) -> f64 {
        match stem {
            Stem::Voice => self.voice_offset_s,
            Stem::Music => self.music_offset_s,
            Stem::Binaural => self.binaural_offset_s,
        }
    }

    /// Ducking strength for a bed (the voice is never ducked)
    pub fn duck_strength(&self, stem: Stem) -> f64 {
        match stem {
            Stem::Voice => 0.0,
            Stem::Music => self.duck_music,
            Stem::Binaural => self.duck_binaural,
        }
    }

    /// Offset of a stem in whole frames at the mix rate
    pub fn offset_frames(&self, stem: Stem) -> usize {
        (self.offset_s(stem) * self.sample_rate as f64).round().max(0.0) as usize
    }

    /// Check every field against its range
    pub fn validate(&self) -> Result<(), MixSettingsError> {
        if self.sample_rate == 0 {
            return Err(MixSettingsError::ZeroSampleRate);
        }

        for stem in Stem::ALL {
            let volume = self.volume(stem);
            if !volume.is_finite() {
                return Err(MixSettingsError::NonFinite(volume_field(stem)));
            }
            if volume < 0.0 {
                return Err(MixSettingsError::NegativeVolume { stem, value: volume });
            }

            let offset = self.offset_s(stem);
            if !offset.is_finite() {
                return Err(MixSettingsError::NonFinite(offset_field(stem)));
            }
            if offset < 0.0 {
                return Err(MixSettingsError::NegativeOffset { stem, value: offset });
            }
        }

        for stem in [Stem::Music, Stem::Binaural] {
            let strength = self.duck_strength(stem);
            if !(0.0..=1.0).contains(&strength) {
                return Err(MixSettingsError::StrengthOutOfRange { stem, value: strength });
            }
        }

        if !self.duck_threshold.is_finite() {
            return Err(MixSettingsError::NonFinite("duck_threshold"));
        }
        if self.duck_threshold < 0.0 {
            return Err(MixSettingsError::NegativeThreshold(self.duck_threshold));
        }
        if !self.duck_release_s.is_finite() {
            return Err(MixSettingsError::NonFinite("duck_release_s"));
        }
        if self.duck_release_s < 0.0 {
            return Err(MixSettingsError::NegativeRelease(self.duck_release_s));
        }

        Ok(())
    }
}

fn volume_field(stem: Stem) -> &'static str {
    match stem {
        Stem::Voice => "voice_volume",
        Stem::Music => "music_volume",
        Stem::Binaural => "binaural_volume",
    }
}

fn offset_field(stem: Stem) -> &'static str {
    match stem {
        Stem::Voice => "voice_offset_s",
        Stem::Music => "music_offset_s",
        Stem::Binaural => "binaural_offset_s",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = MixSettings::default();
        assert_eq!(settings.volume(Stem::Voice), 1.0);
        assert_eq!(settings.volume(Stem::Music), 0.35);
        assert_eq!(settings.volume(Stem::Binaural), 0.25);
        assert_eq!(settings.sample_rate, 8000);
        assert!(settings.ducking_enabled);
        assert_eq!(settings.duck_strength(Stem::Music), 0.65);
        assert_eq!(settings.duck_strength(Stem::Binaural), 0.35);
        assert_eq!(settings.duck_threshold, 0.015);
        assert_eq!(settings.duck_release_s, 0.08);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let settings = MixSettings { music_volume: -0.1, ..Default::default() };
        assert_eq!(
            settings.validate(),
            Err(MixSettingsError::NegativeVolume { stem: Stem::Music, value: -0.1 })
        );

        let settings = MixSettings { voice_offset_s: -1.0, ..Default::default() };
        assert!(matches!(settings.validate(), Err(MixSettingsError::NegativeOffset { .. })));

        let settings = MixSettings { duck_binaural: 1.5, ..Default::default() };
        assert!(matches!(settings.validate(), Err(MixSettingsError::StrengthOutOfRange { .. })));

        let settings = MixSettings { sample_rate: 0, ..Default::default() };
        assert_eq!(settings.validate(), Err(MixSettingsError::ZeroSampleRate));

        let settings = MixSettings { binaural_volume: f64::NAN, ..Default::default() };
        assert_eq!(settings.validate(), Err(MixSettingsError::NonFinite("binaural_volume")));
    }

    #[test]
    fn test_offset_frames_rounds() {
        let settings = MixSettings { voice_offset_s: 2.0, music_offset_s: 0.00007, ..Default::default() };
        assert_eq!(settings.offset_frames(Stem::Voice), 16_000);
        assert_eq!(settings.offset_frames(Stem::Music), 1);
        assert_eq!(settings.offset_frames(Stem::Binaural), 0);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let settings: MixSettings = serde_yaml::from_str("music_volume: 0.5\nducking_enabled: false\n").unwrap();
        assert_eq!(settings.music_volume, 0.5);
        assert!(!settings.ducking_enabled);
        assert_eq!(settings.voice_volume, 1.0);
        assert_eq!(settings.duck_threshold, 0.015);
    }
}
