//! Session rendering
//!
//! Renders the beds for one session directory around an externally produced
//! voice track, then mixes them. The beds are required; the mix is
//! best-effort, so a failed mixdown leaves `mix_error.txt` behind instead of
//! failing the session.
//!
//! Files written to the run directory:
//!
//! | file | content |
//! |---|---|
//! | `music.wav` | ambient pad |
//! | `binaural.wav` | binaural beat track |
//! | `mix.wav` | mastered mix (if mixdown ran and succeeded) |
//! | `mix_error.txt` | error chain (if mixdown failed) |
//! | `binaural.json` | band label and beat actually used |
//! | `request.json` | the request the session was rendered with |

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::generate::{
    generate_binaural_track, generate_music_bed, pick_binaural_beat, BinauralBand, BinauralChoice,
    Objective, DEFAULT_CARRIER_HZ,
};
use crate::mixdown::{mixdown_to_wav, MixSettings};
use crate::types::DEFAULT_SAMPLE_RATE;

pub const MUSIC_FILE: &str = "music.wav";
pub const BINAURAL_FILE: &str = "binaural.wav";
pub const MIX_FILE: &str = "mix.wav";
pub const MIX_ERROR_FILE: &str = "mix_error.txt";
pub const BINAURAL_META_FILE: &str = "binaural.json";
pub const REQUEST_FILE: &str = "request.json";

/// Everything needed to render one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRequest {
    pub duration_minutes: u32,
    pub band: BinauralBand,
    /// Exact beat in Hz, used when positive
    pub beat_override: Option<f64>,
    pub objective: Option<Objective>,
    pub mixdown: bool,
    pub mix: MixSettings,
    /// Generation rate of the beds
    pub sample_rate: u32,
    pub carrier_hz: f64,
}

impl Default for SessionRequest {
    fn default() -> Self {
        Self {
            duration_minutes: 20,
            band: BinauralBand::Auto,
            beat_override: None,
            objective: None,
            mixdown: true,
            mix: MixSettings::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            carrier_hz: DEFAULT_CARRIER_HZ,
        }
    }
}

/// What a rendered session produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    pub run_dir: PathBuf,
    pub voice_path: PathBuf,
    pub music_path: PathBuf,
    pub binaural_path: PathBuf,
    /// `None` when mixdown was disabled or failed
    pub mix_path: Option<PathBuf>,
    pub mix_error: Option<String>,
    #[serde(flatten)]
    pub binaural: BinauralChoice,
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize session metadata")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))
}

/// Render music, binaural and mix for one session into `run_dir`
pub fn render_session(request: &SessionRequest, voice_wav: &Path, run_dir: &Path) -> Result<SessionOutcome> {
    if request.duration_minutes == 0 {
        bail!("Session duration must be at least one minute");
    }
    std::fs::create_dir_all(run_dir)
        .with_context(|| format!("Failed to create run directory: {:?}", run_dir))?;

    let choice = pick_binaural_beat(request.band, request.beat_override, request.objective);
    log::info!(
        "render_session: {} min into {:?}, binaural {} at {} Hz",
        request.duration_minutes,
        run_dir,
        choice.band_label,
        choice.beat_hz
    );

    let music_path = run_dir.join(MUSIC_FILE);
    generate_music_bed(request.duration_minutes, &music_path, request.sample_rate)
        .context("Failed to generate music bed")?;

    let binaural_path = run_dir.join(BINAURAL_FILE);
    generate_binaural_track(
        request.duration_minutes,
        &binaural_path,
        request.sample_rate,
        request.carrier_hz,
        choice.beat_hz,
    )
    .context("Failed to generate binaural track")?;

    let mut mix_path = None;
    let mut mix_error = None;
    if request.mixdown {
        let out = run_dir.join(MIX_FILE);
        match mixdown_to_wav(voice_wav, &music_path, &binaural_path, &out, &request.mix) {
            Ok(path) => mix_path = Some(path),
            Err(e) => {
                let text = format!("{:#}", anyhow::Error::from(e));
                log::warn!("render_session: mixdown failed: {}", text);
                let error_path = run_dir.join(MIX_ERROR_FILE);
                if let Err(write_err) = std::fs::write(&error_path, &text) {
                    log::warn!("render_session: cannot write {:?}: {}", error_path, write_err);
                }
                mix_error = Some(text);
            }
        }
    } else {
        log::info!("render_session: mixdown disabled");
    }

    write_json(request, &run_dir.join(REQUEST_FILE))?;
    write_json(&choice, &run_dir.join(BINAURAL_META_FILE))?;

    Ok(SessionOutcome {
        run_dir: run_dir.to_path_buf(),
        voice_path: voice_wav.to_path_buf(),
        music_path,
        binaural_path,
        mix_path,
        mix_error,
        binaural: choice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_file::save_wave;
    use crate::types::Signal;

    fn quick_request() -> SessionRequest {
        SessionRequest {
            duration_minutes: 1,
            sample_rate: 1000,
            mix: MixSettings { sample_rate: 1000, ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_minutes_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let request = SessionRequest { duration_minutes: 0, ..Default::default() };
        assert!(render_session(&request, &dir.path().join("voice.wav"), dir.path()).is_err());
    }

    #[test]
    fn test_mix_failure_is_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("run");
        let voice = dir.path().join("voice.wav");
        std::fs::write(&voice, b"definitely not a wav file").unwrap();

        let outcome = render_session(&quick_request(), &voice, &run_dir).unwrap();
        assert!(outcome.mix_path.is_none());
        assert!(run_dir.join(MUSIC_FILE).exists());
        assert!(run_dir.join(BINAURAL_FILE).exists());
        assert!(!run_dir.join(MIX_FILE).exists());

        let error = std::fs::read_to_string(run_dir.join(MIX_ERROR_FILE)).unwrap();
        assert!(error.contains("voice"), "{}", error);
        assert_eq!(outcome.mix_error.as_deref(), Some(error.as_str()));
    }

    #[test]
    fn test_metadata_and_disabled_mix() {
        let dir = tempfile::tempdir().unwrap();
        let voice = dir.path().join("voice.wav");
        save_wave(&Signal::mono(vec![0.1; 1000]), 1000, &voice).unwrap();

        let request = SessionRequest {
            mixdown: false,
            band: BinauralBand::Auto,
            objective: Some(Objective::Stress),
            ..quick_request()
        };
        let outcome = render_session(&request, &voice, dir.path()).unwrap();
        assert!(outcome.mix_path.is_none());
        assert!(outcome.mix_error.is_none());
        assert!(!dir.path().join(MIX_ERROR_FILE).exists());

        let meta: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(BINAURAL_META_FILE)).unwrap()).unwrap();
        assert_eq!(meta["binaural_band_used"], "alpha");
        assert_eq!(meta["binaural_beat_hz_used"], 10.0);

        let saved: SessionRequest =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(REQUEST_FILE)).unwrap()).unwrap();
        assert_eq!(saved, request);
    }
}
