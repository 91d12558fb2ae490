//! PCM WAV codec
//!
//! Reads 8/16/24/32-bit integer PCM into float [`Signal`]s in [-1, 1] and
//! writes 16-bit PCM. Both directions move audio in chunks of
//! [`CHUNK_FRAMES`] frames, so the codec's own working memory stays bounded
//! regardless of how long a session runs.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use thiserror::Error;

use crate::types::{Sample, Signal, StereoBuffer};

/// Frames decoded or encoded per chunk
pub const CHUNK_FRAMES: usize = 1_000_000;

/// Size of a canonical RIFF/WAVE header with no extra chunks
pub const WAV_HEADER_SIZE: u64 = 44;

const FORMAT_PCM: u16 = 1;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// WAV codec errors
#[derive(Debug, Error)]
pub enum WavError {
    /// File missing, unreadable or shorter than its header claims
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Not a RIFF/WAVE file
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Sample width outside 1..=4 bytes
    #[error("Unsupported sample width: {0}")]
    UnsupportedSampleWidth(u16),

    /// Anything other than integer PCM (float, ADPCM, ...)
    #[error("Unsupported WAV encoding (format tag {0:#06x})")]
    UnsupportedEncoding(u16),

    /// Missing required chunk
    #[error("Missing required chunk: {0}")]
    MissingChunk(&'static str),

    /// Header fields that cannot describe any real stream
    #[error("File corrupted: {0}")]
    Corrupted(String),

    /// Failure while encoding the output file
    #[error("WAV write error: {0}")]
    Write(#[from] hound::Error),
}

impl WavError {
    /// True for the errors that mean "valid WAV, but not something we decode"
    pub fn is_unsupported_format(&self) -> bool {
        matches!(
            self,
            WavError::UnsupportedSampleWidth(_) | WavError::UnsupportedEncoding(_)
        )
    }
}

/// Stream description from the fmt chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    /// Audio format tag (1 = PCM, 0xFFFE = extensible)
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Bytes per sample, rounded up from the bit depth
    pub fn sample_width(&self) -> u16 {
        self.bits_per_sample.div_ceil(8)
    }

    /// Bytes per frame across all channels
    pub fn frame_width(&self) -> usize {
        self.channels as usize * self.sample_width() as usize
    }

    /// Whether [`decode_pcm`] can handle this width
    pub fn has_supported_width(&self) -> bool {
        matches!(self.sample_width(), 1..=4)
    }
}

/// Decode raw little-endian PCM bytes into floats in [-1, 1]
///
/// 8-bit is unsigned and centred on 128; 16/24/32-bit are signed. A trailing
/// partial sample is ignored.
pub fn decode_pcm(raw: &[u8], sample_width: u16) -> Result<Vec<Sample>, WavError> {
    let samples = match sample_width {
        1 => raw
            .iter()
            .map(|&b| (b as Sample - 128.0) / 128.0)
            .collect(),
        2 => {
            const SCALE: Sample = 1.0 / 32768.0;
            raw.chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as Sample * SCALE)
                .collect()
        }
        3 => {
            const SCALE: Sample = 1.0 / 8388608.0; // 2^23
            raw.chunks_exact(3)
                .map(|b| {
                    let val = (b[0] as i32) | ((b[1] as i32) << 8) | ((b[2] as i32) << 16);
                    // Sign extend from bit 23
                    let val = if val & 0x80_0000 != 0 { val | !0xFF_FFFF } else { val };
                    val as Sample * SCALE
                })
                .collect()
        }
        4 => {
            const SCALE: f64 = 1.0 / 2147483648.0; // 2^31
            raw.chunks_exact(4)
                .map(|b| (i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64 * SCALE) as Sample)
                .collect()
        }
        other => return Err(WavError::UnsupportedSampleWidth(other)),
    };
    Ok(samples)
}

/// Streaming WAV reader
///
/// Parses the RIFF chunk list once on open, then hands out decoded frames in
/// caller-sized chunks.
pub struct WavReader {
    reader: BufReader<File>,
    format: WavFormat,
    data_size: u64,
    frames_read: u64,
}

impl WavReader {
    /// Open a WAV file and locate its fmt and data chunks
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WavError> {
        let file = File::open(path.as_ref())?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut header = [0u8; 12];
        reader.read_exact(&mut header)?;
        if &header[0..4] != b"RIFF" {
            return Err(WavError::InvalidFormat("Not a RIFF file".into()));
        }
        if &header[8..12] != b"WAVE" {
            return Err(WavError::InvalidFormat("Not a WAVE file".into()));
        }

        let mut format: Option<WavFormat> = None;
        let mut data: Option<(u64, u64)> = None;

        loop {
            let mut chunk_header = [0u8; 8];
            if reader.read_exact(&mut chunk_header).is_err() {
                break;
            }
            let chunk_size = u32::from_le_bytes([
                chunk_header[4],
                chunk_header[5],
                chunk_header[6],
                chunk_header[7],
            ]);

            match &chunk_header[0..4] {
                b"fmt " => {
                    format = Some(Self::read_fmt_chunk(&mut reader, chunk_size)?);
                }
                b"data" => {
                    let offset = reader.stream_position()?;
                    // Streaming writers leave 0xFFFFFFFF here; trust the file length instead
                    let available = file_len.saturating_sub(offset);
                    data = Some((offset, (chunk_size as u64).min(available)));
                    reader.seek(SeekFrom::Current(chunk_size as i64))?;
                }
                _ => {
                    reader.seek(SeekFrom::Current(chunk_size as i64))?;
                }
            }

            // Pad to word boundary
            if chunk_size % 2 != 0 {
                reader.seek(SeekFrom::Current(1))?;
            }
        }

        let format = format.ok_or(WavError::MissingChunk("fmt"))?;
        let (data_offset, data_size) = data.ok_or(WavError::MissingChunk("data"))?;

        if format.channels == 0 {
            return Err(WavError::Corrupted("fmt chunk declares zero channels".into()));
        }

        reader.seek(SeekFrom::Start(data_offset))?;

        Ok(Self {
            reader,
            format,
            data_size,
            frames_read: 0,
        })
    }

    /// Read the fmt chunk, rejecting anything that is not integer PCM
    fn read_fmt_chunk(reader: &mut BufReader<File>, size: u32) -> Result<WavFormat, WavError> {
        if size < 16 {
            return Err(WavError::Corrupted("fmt chunk too small".into()));
        }

        let mut fmt_data = vec![0u8; size as usize];
        reader.read_exact(&mut fmt_data)?;

        let format_tag = u16::from_le_bytes([fmt_data[0], fmt_data[1]]);
        let channels = u16::from_le_bytes([fmt_data[2], fmt_data[3]]);
        let sample_rate = u32::from_le_bytes([fmt_data[4], fmt_data[5], fmt_data[6], fmt_data[7]]);
        let bits_per_sample = u16::from_le_bytes([fmt_data[14], fmt_data[15]]);

        match format_tag {
            FORMAT_PCM => {}
            FORMAT_EXTENSIBLE => {
                // Sub-format GUID starts at byte 24; its first two bytes are the real tag
                if fmt_data.len() >= 26 {
                    let sub_format = u16::from_le_bytes([fmt_data[24], fmt_data[25]]);
                    if sub_format != FORMAT_PCM {
                        return Err(WavError::UnsupportedEncoding(sub_format));
                    }
                }
            }
            other => return Err(WavError::UnsupportedEncoding(other)),
        }

        Ok(WavFormat {
            format_tag,
            channels,
            sample_rate,
            bits_per_sample,
        })
    }

    /// Get the audio format
    pub fn format(&self) -> &WavFormat {
        &self.format
    }

    /// Number of whole frames in the data chunk
    pub fn frame_count(&self) -> u64 {
        match self.format.frame_width() {
            0 => 0,
            width => self.data_size / width as u64,
        }
    }

    /// Get the duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.format.sample_rate as f64
    }

    /// Read up to `max_frames` raw frames
    ///
    /// Returns fewer bytes (possibly none) once the data chunk is exhausted.
    pub fn read_raw_frames(&mut self, max_frames: usize) -> Result<Vec<u8>, WavError> {
        let frame_width = self.format.frame_width();
        let remaining = self.frame_count().saturating_sub(self.frames_read);
        let frames = (max_frames as u64).min(remaining) as usize;
        if frames == 0 || frame_width == 0 {
            return Ok(Vec::new());
        }

        let wanted = frames * frame_width;
        let mut raw = Vec::with_capacity(wanted);
        (&mut self.reader).take(wanted as u64).read_to_end(&mut raw)?;

        let whole = raw.len() / frame_width;
        raw.truncate(whole * frame_width);
        if whole < frames {
            // Short read: the file ends before the header says it should
            self.frames_read = self.frame_count();
        } else {
            self.frames_read += whole as u64;
        }
        Ok(raw)
    }

    /// Read and decode up to `max_frames` interleaved frames
    pub fn read_frames(&mut self, max_frames: usize) -> Result<Vec<Sample>, WavError> {
        let raw = self.read_raw_frames(max_frames)?;
        decode_pcm(&raw, self.format.sample_width())
    }

    /// Decode the remaining data, preserving channel layout
    pub fn read_signal(&mut self) -> Result<Signal, WavError> {
        let channels = self.format.channels as usize;
        let expected = self.frame_count().saturating_sub(self.frames_read) as usize;
        let mut samples = Vec::with_capacity(expected * channels);
        loop {
            let chunk = self.read_frames(CHUNK_FRAMES)?;
            if chunk.is_empty() {
                break;
            }
            samples.extend(chunk);
        }
        crate::dsp::clip(&mut samples);
        Ok(Signal::from_interleaved(samples, channels))
    }

    /// Decode the remaining data, downmixing each chunk to mono as it arrives
    pub fn read_mono_signal(&mut self) -> Result<Signal, WavError> {
        let channels = self.format.channels as usize;
        let expected = self.frame_count().saturating_sub(self.frames_read) as usize;
        let mut samples = Vec::with_capacity(expected);
        loop {
            let chunk = self.read_frames(CHUNK_FRAMES)?;
            if chunk.is_empty() {
                break;
            }
            if channels == 1 {
                samples.extend(chunk);
            } else {
                samples.extend_from_slice(Signal::from_interleaved(chunk, channels).to_mono().as_slice());
            }
        }
        crate::dsp::clip(&mut samples);
        Ok(Signal::mono(samples))
    }
}

/// Read a WAV file, preserving its channel layout
///
/// Returns `(sample_rate, signal)`.
pub fn read_wave<P: AsRef<Path>>(path: P) -> Result<(u32, Signal), WavError> {
    let mut reader = WavReader::open(path.as_ref())?;
    let sample_rate = reader.format().sample_rate;
    let signal = reader.read_signal()?;
    log::debug!(
        "read_wave: {:?} -> {} Hz, {} ch, {} frames",
        path.as_ref(),
        sample_rate,
        signal.channels(),
        signal.frames()
    );
    Ok((sample_rate, signal))
}

/// Read a WAV file as mono, averaging channels if there are several
pub fn read_wave_mono<P: AsRef<Path>>(path: P) -> Result<(u32, Signal), WavError> {
    let mut reader = WavReader::open(path.as_ref())?;
    let sample_rate = reader.format().sample_rate;
    let signal = reader.read_mono_signal()?;
    log::debug!(
        "read_wave_mono: {:?} -> {} Hz, {} frames",
        path.as_ref(),
        sample_rate,
        signal.frames()
    );
    Ok((sample_rate, signal))
}

/// Write a signal as 16-bit PCM WAV
///
/// Samples are clipped to [-1, 1] and scaled by 32767. Parent directories
/// are created if missing.
pub fn save_wave<P: AsRef<Path>>(signal: &Signal, sample_rate: u32, path: P) -> Result<(), WavError> {
    write_interleaved(signal.as_slice(), signal.channels(), sample_rate, path.as_ref())
}

/// Write a stereo buffer as 16-bit PCM WAV
pub fn save_stereo<P: AsRef<Path>>(buffer: &StereoBuffer, sample_rate: u32, path: P) -> Result<(), WavError> {
    write_interleaved(buffer.as_interleaved(), 2, sample_rate, path.as_ref())
}

#[inline]
fn to_pcm16(sample: Sample) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

fn write_interleaved(
    samples: &[Sample],
    channels: usize,
    sample_rate: u32,
    path: &Path,
) -> Result<(), WavError> {
    let channels = u16::try_from(channels)
        .map_err(|_| WavError::InvalidFormat(format!("Too many channels: {}", channels)))?;
    if channels == 0 {
        return Err(WavError::InvalidFormat("Signal has no channels".into()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for chunk in samples.chunks(CHUNK_FRAMES * channels as usize) {
        let mut chunk_writer = writer.get_i16_writer(chunk.len() as u32);
        for &sample in chunk {
            chunk_writer.write_sample(to_pcm16(sample));
        }
        chunk_writer.flush()?;
    }
    writer.finalize()?;

    log::debug!(
        "save_wave: wrote {} frames ({} ch, {} Hz) to {:?}",
        samples.len() / channels as usize,
        channels,
        sample_rate,
        path
    );
    Ok(())
}
