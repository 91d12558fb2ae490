//! Standard locations for rendered sessions and config files

use std::path::PathBuf;

/// Default directory for rendered sessions
///
/// Returns: `~/Music/hypno-sessions`
pub fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Music")
        .join("hypno-sessions")
}

/// Default path of a config file
///
/// Returns: `~/Music/hypno-sessions/{filename}`
pub fn default_config_path(filename: &str) -> PathBuf {
    default_output_dir().join(filename)
}
