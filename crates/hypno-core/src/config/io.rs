//! YAML config loading and saving for any serde type

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Load a config from YAML, falling back to `T::default()`
///
/// A missing file is silent (first run); an unreadable or unparsable file
/// is logged as a warning.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("load_config: {:?} not found, using defaults", path);
        return T::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("load_config: cannot read {:?}: {}, using defaults", path, e);
            return T::default();
        }
    };

    match serde_yaml::from_str::<T>(&contents) {
        Ok(config) => {
            log::info!("load_config: loaded {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("load_config: cannot parse {:?}: {}, using defaults", path, e);
            T::default()
        }
    }
}

/// Save a config as YAML, creating parent directories
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixdown::MixSettings;

    #[test]
    fn test_missing_file_gives_default() {
        let settings: MixSettings = load_config(Path::new("/nonexistent/hypno/mix.yaml"));
        assert_eq!(settings, MixSettings::default());
    }

    #[test]
    fn test_invalid_yaml_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "voice_volume: [not, a, number").unwrap();
        let settings: MixSettings = load_config(&path);
        assert_eq!(settings, MixSettings::default());
    }

    #[test]
    fn test_save_then_load_in_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mix.yaml");
        let settings = MixSettings {
            music_volume: 0.5,
            voice_offset_s: 3.0,
            ..Default::default()
        };

        save_config(&settings, &path).unwrap();
        let loaded: MixSettings = load_config(&path);
        assert_eq!(loaded, settings);
    }
}
