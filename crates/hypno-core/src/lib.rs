//! Hypno Core - Stem synthesis, WAV codec and voice-priority mixdown

pub mod types;
pub mod audio_file;
pub mod resample;
pub mod dsp;
pub mod generate;
pub mod mixdown;
pub mod stats;
pub mod config;
pub mod session;

pub use types::*;
