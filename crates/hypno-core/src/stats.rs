//! WAV loudness probe
//!
//! Peak and RMS in dBFS over a file, streamed in chunks so long sessions
//! never sit in memory. Multi-channel chunks are averaged to mono before
//! measuring. The probe never fails: problems are reported in
//! [`WavStats::error`].

use std::path::Path;

use serde::Serialize;

use crate::audio_file::{decode_pcm, WavError, WavReader, CHUNK_FRAMES, WAV_HEADER_SIZE};

/// Floor for the dB conversions, and the epsilon added under the RMS root
const DB_FLOOR: f64 = 1e-12;

/// Result of probing one WAV file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WavStats {
    pub exists: bool,
    pub bytes: u64,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub frames: Option<u64>,
    pub duration_s: Option<f64>,
    pub peak_dbfs: Option<f64>,
    pub rms_dbfs: Option<f64>,
    pub error: Option<String>,
}

impl WavStats {
    fn failed(bytes: u64, error: impl Into<String>) -> Self {
        Self {
            exists: true,
            bytes,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.exists && self.error.is_none()
    }
}

fn to_dbfs(value: f64) -> f64 {
    20.0 * value.max(DB_FLOOR).log10()
}

/// Running peak and sum of squares over mono samples
#[derive(Default)]
struct Accumulator {
    peak: f64,
    sum_sq: f64,
    count: u64,
}

impl Accumulator {
    fn push_chunk(&mut self, samples: &[f32], channels: usize) {
        if channels <= 1 {
            for &s in samples {
                self.push(s as f64);
            }
        } else {
            for frame in samples.chunks_exact(channels) {
                let mean = frame.iter().map(|&s| s as f64).sum::<f64>() / channels as f64;
                self.push(mean);
            }
        }
    }

    #[inline]
    fn push(&mut self, x: f64) {
        self.peak = self.peak.max(x.abs());
        self.sum_sq += x * x;
        self.count += 1;
    }

    fn rms(&self) -> f64 {
        (self.sum_sq / self.count as f64 + DB_FLOOR).sqrt()
    }
}

/// Probe a WAV file, optionally scanning only the first `max_seconds`
pub fn wav_stats<P: AsRef<Path>>(path: P, max_seconds: Option<f64>) -> WavStats {
    let path = path.as_ref();
    let bytes = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => return WavStats::default(),
    };
    if bytes <= WAV_HEADER_SIZE {
        return WavStats::failed(bytes, "File too small");
    }

    let stats = match probe(path, bytes, max_seconds) {
        Ok(stats) => stats,
        Err(e) => WavStats::failed(bytes, e.to_string()),
    };
    log::debug!("wav_stats: {:?} -> {:?}", path, stats);
    stats
}

fn probe(path: &Path, bytes: u64, max_seconds: Option<f64>) -> Result<WavStats, WavError> {
    let mut reader = WavReader::open(path)?;
    let format = *reader.format();
    let frames = reader.frame_count();

    let mut stats = WavStats {
        exists: true,
        bytes,
        sample_rate: Some(format.sample_rate),
        channels: Some(format.channels),
        frames: Some(frames),
        duration_s: (format.sample_rate > 0).then(|| reader.duration_seconds()),
        ..Default::default()
    };

    let width = format.sample_width();
    if !format.has_supported_width() {
        stats.error = Some(WavError::UnsupportedSampleWidth(width).to_string());
        return Ok(stats);
    }

    let mut remaining = match max_seconds {
        Some(secs) if format.sample_rate > 0 => {
            frames.min((secs.max(0.0) * format.sample_rate as f64) as u64)
        }
        _ => frames,
    };

    let channels = format.channels as usize;
    let mut acc = Accumulator::default();
    while remaining > 0 {
        let n = (CHUNK_FRAMES as u64).min(remaining) as usize;
        let raw = reader.read_raw_frames(n)?;
        if raw.is_empty() {
            break;
        }
        let samples = decode_pcm(&raw, width)?;
        acc.push_chunk(&samples, channels);
        remaining -= (raw.len() / format.frame_width()) as u64;
    }

    if acc.count == 0 {
        stats.error = Some("No frames decoded".to_string());
        return Ok(stats);
    }

    stats.peak_dbfs = Some(to_dbfs(acc.peak));
    stats.rms_dbfs = Some(to_dbfs(acc.rms()));
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_file::save_wave;
    use crate::types::Signal;
    use std::io::Write;

    fn header(channels: u16, sample_rate: u32, bits: u16, data_len: u32) -> Vec<u8> {
        let block_align = channels * bits.div_ceil(8);
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out
    }

    #[test]
    fn test_missing_file() {
        let stats = wav_stats("/nonexistent/stats.wav", None);
        assert!(!stats.exists);
        assert_eq!(stats.bytes, 0);
        assert!(stats.error.is_none());
    }

    #[test]
    fn test_file_too_small() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.wav");
        std::fs::write(&path, [0u8; 44]).unwrap();
        let stats = wav_stats(&path, None);
        assert!(stats.exists);
        assert_eq!(stats.bytes, 44);
        assert_eq!(stats.error.as_deref(), Some("File too small"));
        assert!(stats.peak_dbfs.is_none());
    }

    #[test]
    fn test_full_scale_square_is_zero_dbfs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.wav");
        let square: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        save_wave(&Signal::mono(square), 8000, &path).unwrap();

        let stats = wav_stats(&path, None);
        assert!(stats.is_ok());
        assert_eq!(stats.sample_rate, Some(8000));
        assert_eq!(stats.channels, Some(1));
        assert_eq!(stats.frames, Some(1000));
        assert_eq!(stats.duration_s, Some(0.125));
        // 32767/32768 full scale
        assert!(stats.peak_dbfs.unwrap().abs() < 0.01);
        assert!(stats.rms_dbfs.unwrap().abs() < 0.01);
    }

    #[test]
    fn test_stereo_downmix_and_max_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        // First second: opposite channels cancel; second second: both at 0.5
        let left = vec![0.5f32; 2000];
        let right: Vec<f32> = (0..2000).map(|i| if i < 1000 { -0.5 } else { 0.5 }).collect();
        save_wave(&Signal::from_channels(&[left, right]), 1000, &path).unwrap();

        let first = wav_stats(&path, Some(1.0));
        assert_eq!(first.frames, Some(2000));
        assert!(first.peak_dbfs.unwrap() < -200.0);

        let whole = wav_stats(&path, None);
        let half = 20.0 * 0.5f64.log10();
        assert!((whole.peak_dbfs.unwrap() - half).abs() < 0.01);
        // Half the frames at 0.5, half at 0
        let rms_db = 20.0 * (0.125f64).sqrt().log10();
        assert!((whole.rms_dbfs.unwrap() - rms_db).abs() < 0.01);
    }

    #[test]
    fn test_unsupported_width_reports_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.wav");
        let mut bytes = header(1, 8000, 40, 50);
        bytes.extend_from_slice(&[0u8; 50]);
        std::fs::write(&path, bytes).unwrap();

        let stats = wav_stats(&path, None);
        assert!(stats.exists);
        assert_eq!(stats.sample_rate, Some(8000));
        assert_eq!(stats.frames, Some(10));
        assert_eq!(stats.error.as_deref(), Some("Unsupported sample width: 5"));
    }

    #[test]
    fn test_empty_data_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&header(1, 8000, 16, 0)).unwrap();
        // Trailing junk chunk so the file is larger than a bare header
        file.write_all(b"LIST\x04\x00\x00\x00abcd").unwrap();
        drop(file);

        let stats = wav_stats(&path, None);
        assert_eq!(stats.frames, Some(0));
        assert_eq!(stats.error.as_deref(), Some("No frames decoded"));
    }

    #[test]
    fn test_garbage_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.wav");
        std::fs::write(&path, vec![7u8; 200]).unwrap();
        let stats = wav_stats(&path, None);
        assert!(stats.exists);
        assert_eq!(stats.bytes, 200);
        assert!(stats.error.is_some());
    }

    #[test]
    fn test_serializes_nulls() {
        let json = serde_json::to_value(WavStats::default()).unwrap();
        assert_eq!(json["exists"], false);
        assert!(json["peak_dbfs"].is_null());
    }
}
