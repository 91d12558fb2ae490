//! Render configuration
//!
//! Stored as YAML. Default location: ~/Music/hypno-sessions/render.yaml

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::default_output_dir;
use crate::generate::{BinauralBand, Objective, DEFAULT_CARRIER_HZ};
use crate::mixdown::MixSettings;
use crate::session::SessionRequest;
use crate::types::DEFAULT_SAMPLE_RATE;

/// Root configuration for `render-session`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Rate the music and binaural beds are generated at
    pub sample_rate: u32,
    /// Where session directories are created
    pub output_dir: PathBuf,
    /// Carrier of the binaural track in Hz
    pub carrier_hz: f64,
    pub band: BinauralBand,
    pub objective: Option<Objective>,
    pub mixdown_enabled: bool,
    pub mix: MixSettings,
    /// Limit the stats probe to the first N seconds of each file
    pub stats_max_seconds: Option<f64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            output_dir: default_output_dir(),
            carrier_hz: DEFAULT_CARRIER_HZ,
            band: BinauralBand::Auto,
            objective: None,
            mixdown_enabled: true,
            mix: MixSettings::default(),
            stats_max_seconds: None,
        }
    }
}

impl RenderConfig {
    /// Build a session request for `duration_minutes` from these defaults
    pub fn session_request(&self, duration_minutes: u32) -> SessionRequest {
        SessionRequest {
            duration_minutes,
            band: self.band,
            beat_override: None,
            objective: self.objective,
            mixdown: self.mixdown_enabled,
            mix: self.mix.clone(),
            sample_rate: self.sample_rate,
            carrier_hz: self.carrier_hz,
        }
    }
}
