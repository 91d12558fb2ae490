//! Voice-priority mixdown
//!
//! Combines the voice, music and binaural stems into one mastered stereo
//! WAV. The stages, in order:
//!
//! 1. Wait (bounded) until all three stem files hold decodable frames
//! 2. Decode and resample every stem to the mix rate, in parallel
//! 3. Pre-normalize each stem to its fixed level (voice above the beds)
//! 4. Place each stem after its offset and apply its volume
//! 5. Duck the beds under the voice envelope
//! 6. Sum, fade, clip and master-normalize, then write 16-bit PCM

mod settings;

pub use settings::{MixSettings, MixSettingsError};

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::audio_file::{read_wave, read_wave_mono, save_stereo, WavError, WavReader};
use crate::dsp::envelope::apply_duck;
use crate::dsp::{clip, duck_mask, envelope_follower, fade_stereo, normalize};
use crate::resample::{resample_mono, resample_stereo};
use crate::types::{Sample, StereoBuffer, Stem};

/// Stem availability polling
const WAIT_ATTEMPTS: u32 = 40;
const WAIT_INTERVAL: Duration = Duration::from_millis(100);

const MASTER_FADE_SECS: f64 = 2.0;
const MASTER_TARGET_DBFS: f64 = -14.0;

/// Pre-normalization level for a stem, in dBFS RMS
pub fn stem_target_dbfs(stem: Stem) -> f64 {
    match stem {
        Stem::Voice => -16.0,
        Stem::Music => -24.0,
        Stem::Binaural => -28.0,
    }
}

/// Mixdown errors
#[derive(Debug, Error)]
pub enum MixError {
    #[error("Invalid mix settings: {0}")]
    InvalidSettings(#[from] MixSettingsError),

    #[error("Failed to load {stem} stem")]
    Stem {
        stem: Stem,
        #[source]
        source: WavError,
    },

    #[error("Failed to write mix")]
    Write(#[source] WavError),
}

/// The three stems resampled to a common rate, all stereo
#[derive(Debug, Clone, Default)]
pub struct StemSet {
    pub voice: StereoBuffer,
    pub music: StereoBuffer,
    pub binaural: StereoBuffer,
}

impl StemSet {
    fn get_mut(&mut self, stem: Stem) -> &mut StereoBuffer {
        match stem {
            Stem::Voice => &mut self.voice,
            Stem::Music => &mut self.music,
            Stem::Binaural => &mut self.binaural,
        }
    }

    /// Length of the longest stem
    pub fn max_len(&self) -> usize {
        self.voice.len().max(self.music.len()).max(self.binaural.len())
    }
}

/// Whether `path` is a WAV with a decodable width and at least one frame
///
/// A writer that has only emitted its header reports zero frames.
fn stem_ready(path: &Path) -> bool {
    match WavReader::open(path) {
        Ok(reader) => reader.format().has_supported_width() && reader.frame_count() > 0,
        Err(_) => false,
    }
}

/// Poll until every stem is ready to decode
///
/// Returns the attempt on which all stems were ready, or `None` if some
/// file is still not ready after `attempts` tries; the caller goes on and
/// lets decoding report the real error.
fn wait_for_stems(paths: &[&Path], attempts: u32, interval: Duration) -> Option<u32> {
    for attempt in 1..=attempts {
        let pending: Vec<&Path> = paths.iter().copied().filter(|path| !stem_ready(path)).collect();
        if pending.is_empty() {
            if attempt > 1 {
                log::info!("mixdown_to_wav: stems ready after {} attempts", attempt);
            }
            return Some(attempt);
        }
        log::debug!(
            "mixdown_to_wav: attempt {}/{}: waiting for {:?}",
            attempt,
            attempts,
            pending
        );
        if attempt < attempts {
            std::thread::sleep(interval);
        }
    }
    log::warn!(
        "mixdown_to_wav: stems still not ready after {:?}, decoding anyway",
        interval * attempts
    );
    None
}

/// Decode the voice as mono, resample, duplicate to stereo
fn load_voice(path: &Path, sample_rate: u32) -> Result<StereoBuffer, MixError> {
    let (sr, signal) = read_wave_mono(path).map_err(|source| MixError::Stem {
        stem: Stem::Voice,
        source,
    })?;
    log::info!("mixdown_to_wav: voice {} Hz, {} frames", sr, signal.frames());
    let mono = resample_mono(signal.as_slice(), sr, sample_rate);
    Ok(StereoBuffer::from_mono(&mono))
}

/// Decode a bed, force it to stereo, resample
fn load_bed(stem: Stem, path: &Path, sample_rate: u32) -> Result<StereoBuffer, MixError> {
    let (sr, signal) = read_wave(path).map_err(|source| MixError::Stem { stem, source })?;
    log::info!(
        "mixdown_to_wav: {} {} Hz, {} ch, {} frames",
        stem,
        sr,
        signal.channels(),
        signal.frames()
    );
    Ok(resample_stereo(&signal.to_stereo(), sr, sample_rate))
}

/// Load all three stems in parallel
pub fn load_stems(
    voice_path: &Path,
    music_path: &Path,
    binaural_path: &Path,
    sample_rate: u32,
) -> Result<StemSet, MixError> {
    let (voice, (music, binaural)) = rayon::join(
        || load_voice(voice_path, sample_rate),
        || {
            rayon::join(
                || load_bed(Stem::Music, music_path, sample_rate),
                || load_bed(Stem::Binaural, binaural_path, sample_rate),
            )
        },
    );
    Ok(StemSet {
        voice: voice?,
        music: music?,
        binaural: binaural?,
    })
}

/// Pre-normalize, place and scale every stem
fn place_stems(stems: &mut StemSet, settings: &MixSettings) {
    for stem in Stem::ALL {
        let buffer = stems.get_mut(stem);
        normalize(buffer.as_interleaved_mut(), stem_target_dbfs(stem));
        buffer.prepend_silence(settings.offset_frames(stem));
        buffer.scale(settings.volume(stem) as Sample);
    }
}

/// Duck the beds under the placed voice
///
/// Skipped when ducking is disabled, the voice is empty or both beds are.
fn duck_beds(stems: &mut StemSet, settings: &MixSettings) {
    if !settings.ducking_enabled {
        log::debug!("mixdown_to_wav: ducking disabled");
        return;
    }
    if stems.voice.is_empty() || (stems.music.is_empty() && stems.binaural.is_empty()) {
        log::debug!("mixdown_to_wav: nothing to duck");
        return;
    }

    let envelope = envelope_follower(&stems.voice.left(), settings.sample_rate, settings.duck_release_s);
    let mask = duck_mask(&envelope, settings.duck_threshold);
    for stem in [Stem::Music, Stem::Binaural] {
        apply_duck(stems.get_mut(stem), &mask, settings.duck_strength(stem));
    }
    log::info!(
        "mixdown_to_wav: ducked beds (music {}, binaural {}, threshold {})",
        settings.duck_music,
        settings.duck_binaural,
        settings.duck_threshold
    );
}

/// Sum the stems and run the master chain
fn master(stems: &StemSet, sample_rate: u32) -> StereoBuffer {
    let mut mix = StereoBuffer::silence(stems.max_len());
    mix.add_prefix(&stems.voice);
    mix.add_prefix(&stems.music);
    mix.add_prefix(&stems.binaural);

    fade_stereo(&mut mix, MASTER_FADE_SECS, sample_rate);
    clip(mix.as_interleaved_mut());
    normalize(mix.as_interleaved_mut(), MASTER_TARGET_DBFS);
    mix
}

/// Mix already-loaded stems into a mastered stereo buffer
///
/// Stems must already be at `settings.sample_rate`.
pub fn mix_stems(mut stems: StemSet, settings: &MixSettings) -> Result<StereoBuffer, MixError> {
    settings.validate()?;
    place_stems(&mut stems, settings);
    duck_beds(&mut stems, settings);
    Ok(master(&stems, settings.sample_rate))
}

/// Mix three stem WAVs into `out_path`
///
/// Returns the written path. A stem that cannot be decoded fails the whole
/// mix with [`MixError::Stem`]; callers treat the mix as best-effort.
pub fn mixdown_to_wav(
    voice_path: &Path,
    music_path: &Path,
    binaural_path: &Path,
    out_path: &Path,
    settings: &MixSettings,
) -> Result<PathBuf, MixError> {
    settings.validate()?;
    log::info!(
        "mixdown_to_wav: {:?} + {:?} + {:?} -> {:?} at {} Hz",
        voice_path,
        music_path,
        binaural_path,
        out_path,
        settings.sample_rate
    );

    wait_for_stems(&[voice_path, music_path, binaural_path], WAIT_ATTEMPTS, WAIT_INTERVAL);

    let stems = load_stems(voice_path, music_path, binaural_path, settings.sample_rate)?;
    let mix = mix_stems(stems, settings)?;

    save_stereo(&mix, settings.sample_rate, out_path).map_err(MixError::Write)?;
    log::info!(
        "mixdown_to_wav: wrote {} frames ({:.1}s) to {:?}",
        mix.len(),
        mix.len() as f64 / settings.sample_rate as f64,
        out_path
    );
    Ok(out_path.to_path_buf())
}
