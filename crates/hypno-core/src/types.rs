//! Common types for Hypno
//!
//! This module contains the fundamental signal types shared by the codec,
//! the generators and the mixdown engine: a channel-agnostic [`Signal`] as
//! produced by the WAV decoder, and the [`StereoBuffer`] the mixdown works on.

use std::ops::{Index, IndexMut};

/// Internal sample rate used for generated beds and for the mixdown.
///
/// Low on purpose: 90-minute sessions at this rate stay within a few hundred MB.
pub const DEFAULT_SAMPLE_RATE: u32 = 8000;

/// Audio sample type (32-bit float for processing, stored as 16-bit in files)
pub type Sample = f32;

/// Stem identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stem {
    Voice,
    Music,
    Binaural,
}

impl Stem {
    /// Get all stems in mixing order
    pub const ALL: [Stem; 3] = [Stem::Voice, Stem::Music, Stem::Binaural];

    /// Get the name of this stem
    pub fn name(&self) -> &'static str {
        match self {
            Stem::Voice => "voice",
            Stem::Music => "music",
            Stem::Binaural => "binaural",
        }
    }
}

impl std::fmt::Display for Stem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An interleaved multi-channel signal in [-1, 1]
///
/// Frames are stored interleaved (`[c0, c1, .., c0, c1, ..]`). A mono signal
/// is simply a signal with one channel. The sample rate is carried alongside
/// by callers, never inside the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    channels: usize,
    samples: Vec<Sample>,
}

impl Signal {
    /// Create a mono signal
    pub fn mono(samples: Vec<Sample>) -> Self {
        Self { channels: 1, samples }
    }

    /// Create a signal from interleaved samples
    ///
    /// Panics if `channels` is zero or does not divide the sample count.
    pub fn from_interleaved(samples: Vec<Sample>, channels: usize) -> Self {
        assert!(channels > 0, "Signal needs at least one channel");
        assert!(
            samples.len() % channels == 0,
            "Interleaved buffer length must be a multiple of the channel count"
        );
        Self { channels, samples }
    }

    /// Create a signal from per-channel buffers of equal length
    pub fn from_channels(channels: &[Vec<Sample>]) -> Self {
        assert!(!channels.is_empty(), "Signal needs at least one channel");
        let frames = channels[0].len();
        assert!(
            channels.iter().all(|c| c.len() == frames),
            "Channel lengths must match"
        );
        let mut samples = Vec::with_capacity(frames * channels.len());
        for i in 0..frames {
            samples.extend(channels.iter().map(|c| c[i]));
        }
        Self {
            channels: channels.len(),
            samples,
        }
    }

    /// Number of channels (>= 1)
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of frames (samples per channel)
    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn is_mono(&self) -> bool {
        self.channels == 1
    }

    /// Flattened interleaved view
    #[inline]
    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Sample] {
        &mut self.samples
    }

    /// Copy out one channel
    pub fn channel(&self, ch: usize) -> Vec<Sample> {
        assert!(ch < self.channels, "Channel {} out of range", ch);
        self.samples
            .iter()
            .skip(ch)
            .step_by(self.channels)
            .copied()
            .collect()
    }

    /// Downmix to mono by arithmetic mean across channels
    pub fn to_mono(&self) -> Signal {
        if self.channels == 1 {
            return self.clone();
        }
        let scale = 1.0 / self.channels as Sample;
        let samples = self
            .samples
            .chunks_exact(self.channels)
            .map(|frame| frame.iter().sum::<Sample>() * scale)
            .collect();
        Signal::mono(samples)
    }

    /// Force to stereo: mono is duplicated, extra channels beyond two are dropped
    pub fn to_stereo(&self) -> StereoBuffer {
        match self.channels {
            1 => StereoBuffer::from_mono(&self.samples),
            n => StereoBuffer::from_vec(
                self.samples
                    .chunks_exact(n)
                    .map(|frame| StereoSample::new(frame[0], frame[1]))
                    .collect(),
            ),
        }
    }
}

/// A single stereo sample (left and right channels)
///
/// Uses `#[repr(C)]` to ensure predictable memory layout: [left, right].
/// This enables zero-copy conversion between `&[StereoSample]` and `&[f32]`
/// (interleaved format) using bytemuck.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    /// Create a new stereo sample
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    /// Create a silent stereo sample
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Create a mono sample (same value in both channels)
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl std::ops::AddAssign for StereoSample {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.left += other.left;
        self.right += other.right;
    }
}

impl std::ops::Mul<Sample> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Sample) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

impl std::ops::MulAssign<Sample> for StereoSample {
    #[inline]
    fn mul_assign(&mut self, factor: Sample) {
        self.left *= factor;
        self.right *= factor;
    }
}

/// A buffer of stereo samples
///
/// The working format of the mixdown engine. Every stem is forced into one
/// of these before placement, ducking and summing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoBuffer {
    samples: Vec<StereoSample>,
}

impl StereoBuffer {
    /// Create a buffer filled with silence
    pub fn silence(len: usize) -> Self {
        Self {
            samples: vec![StereoSample::silence(); len],
        }
    }

    /// Create a buffer by duplicating a mono signal into both channels
    pub fn from_mono(mono: &[Sample]) -> Self {
        Self {
            samples: mono.iter().map(|&s| StereoSample::mono(s)).collect(),
        }
    }

    /// Create a buffer from separate left and right channel slices
    pub fn from_channels(left: &[Sample], right: &[Sample]) -> Self {
        assert_eq!(left.len(), right.len(), "Channel lengths must match");
        let samples = left
            .iter()
            .zip(right.iter())
            .map(|(&l, &r)| StereoSample::new(l, r))
            .collect();
        Self { samples }
    }

    /// Create a buffer from an existing Vec of StereoSamples
    pub fn from_vec(samples: Vec<StereoSample>) -> Self {
        Self { samples }
    }

    /// Get the number of stereo samples in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[StereoSample] {
        &self.samples
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [StereoSample] {
        &mut self.samples
    }

    /// Get a zero-copy view of samples as interleaved f32 [L, R, L, R, ...]
    ///
    /// This is a zero-cost operation thanks to `#[repr(C)]` on StereoSample.
    #[inline]
    pub fn as_interleaved(&self) -> &[Sample] {
        bytemuck::cast_slice(&self.samples)
    }

    /// Get a zero-copy mutable view of samples as interleaved f32 [L, R, L, R, ...]
    #[inline]
    pub fn as_interleaved_mut(&mut self) -> &mut [Sample] {
        bytemuck::cast_slice_mut(&mut self.samples)
    }

    /// Copy out the left channel
    pub fn left(&self) -> Vec<Sample> {
        self.samples.iter().map(|s| s.left).collect()
    }

    /// Copy out the right channel
    pub fn right(&self) -> Vec<Sample> {
        self.samples.iter().map(|s| s.right).collect()
    }

    /// Insert `frames` of silence at the start of the buffer
    pub fn prepend_silence(&mut self, frames: usize) {
        if frames == 0 {
            return;
        }
        let mut padded = Vec::with_capacity(frames + self.samples.len());
        padded.resize(frames, StereoSample::silence());
        padded.extend_from_slice(&self.samples);
        self.samples = padded;
    }

    /// Add another buffer into the prefix of this one
    ///
    /// Only the overlapping region is summed; `other` may be shorter.
    pub fn add_prefix(&mut self, other: &StereoBuffer) {
        for (dst, src) in self.samples.iter_mut().zip(other.samples.iter()) {
            *dst += *src;
        }
    }

    /// Scale all samples by a factor
    pub fn scale(&mut self, factor: Sample) {
        for sample in &mut self.samples {
            *sample *= factor;
        }
    }

    /// Get an iterator over the samples
    pub fn iter(&self) -> impl Iterator<Item = &StereoSample> {
        self.samples.iter()
    }

    /// Get a mutable iterator over the samples
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut StereoSample> {
        self.samples.iter_mut()
    }
}

impl Index<usize> for StereoBuffer {
    type Output = StereoSample;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

impl IndexMut<usize> for StereoBuffer {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.samples[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_sample_operations() {
        let a = StereoSample::new(1.0, 2.0);
        let b = StereoSample::new(0.5, 0.5);

        let sum = a + b;
        assert_eq!(sum.left, 1.5);
        assert_eq!(sum.right, 2.5);

        let scaled = a * 0.5;
        assert_eq!(scaled.left, 0.5);
        assert_eq!(scaled.right, 1.0);
    }

    #[test]
    fn test_signal_channels_and_downmix() {
        let signal = Signal::from_interleaved(vec![1.0, 0.0, 0.5, -0.5, -1.0, 1.0], 2);
        assert_eq!(signal.frames(), 3);
        assert_eq!(signal.channel(0), vec![1.0, 0.5, -1.0]);
        assert_eq!(signal.channel(1), vec![0.0, -0.5, 1.0]);

        let mono = signal.to_mono();
        assert!(mono.is_mono());
        assert_eq!(mono.as_slice(), &[0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_signal_from_channels_interleaves() {
        let signal = Signal::from_channels(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        assert_eq!(signal.channels(), 3);
        assert_eq!(signal.as_slice(), &[1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_to_stereo_duplicates_mono_and_drops_extra_channels() {
        let mono = Signal::mono(vec![0.25, -0.25]);
        let stereo = mono.to_stereo();
        assert_eq!(stereo[1], StereoSample::new(-0.25, -0.25));

        let quad = Signal::from_interleaved(vec![0.1, 0.2, 0.3, 0.4], 4);
        let stereo = quad.to_stereo();
        assert_eq!(stereo.len(), 1);
        assert_eq!(stereo[0], StereoSample::new(0.1, 0.2));
    }

    #[test]
    fn test_prepend_silence_and_add_prefix() {
        let mut buffer = StereoBuffer::from_mono(&[1.0, 1.0]);
        buffer.prepend_silence(2);
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer[0], StereoSample::silence());
        assert_eq!(buffer[3], StereoSample::mono(1.0));

        let mut mix = StereoBuffer::silence(6);
        mix.add_prefix(&buffer);
        assert_eq!(mix[2], StereoSample::mono(1.0));
        assert_eq!(mix[5], StereoSample::silence());
    }

    #[test]
    fn test_interleaved_view_roundtrip() {
        let buffer = StereoBuffer::from_channels(&[1.0, 3.0], &[2.0, 4.0]);
        assert_eq!(buffer.as_interleaved(), &[1.0, 2.0, 3.0, 4.0]);
    }
}
