//! Configuration file management for earwitness.
//!
//! Loads and saves application configuration from a TOML file in the user's
//! config directory. A missing file falls back to defaults; a malformed file is
//! an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `earwitness list-devices`
    /// - device name from `earwitness list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Reference level in dBFS for 100% on the input meter (typical: -20 to -6 dBFS)
    #[serde(default = "default_reference_level_db")]
    pub reference_level_db: i8,
}

/// Playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial playback volume, 0.0 to 1.0
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_reference_level_db() -> i8 {
    -20
}

fn default_volume() -> f32 {
    1.0
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            reference_level_db: default_reference_level_db(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EarwitnessConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl EarwitnessConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// Returns defaults when the file does not exist.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file exists but cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            tracing::debug!("No config file found, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: EarwitnessConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Retrieves the path to the config file, creating the parent directory.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let config_dir = home.join(".config").join("earwitness");

    fs::create_dir_all(&config_dir)?;

    Ok(config_dir.join("earwitness.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EarwitnessConfig::default();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.reference_level_db, -20);
        assert_eq!(config.playback.volume, 1.0);
    }

    #[test]
    fn test_parse_empty_toml_uses_defaults() {
        let config: EarwitnessConfig = toml::from_str("").unwrap();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.playback.volume, 1.0);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: EarwitnessConfig = toml::from_str(
            r#"
            [audio]
            device = "USB Microphone"
            "#,
        )
        .unwrap();
        assert_eq!(config.audio.device, "USB Microphone");
        assert_eq!(config.audio.reference_level_db, -20);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = EarwitnessConfig::default();
        config.audio.device = "1".to_string();
        config.playback.volume = 0.5;

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: EarwitnessConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.audio.device, "1");
        assert_eq!(parsed.playback.volume, 0.5);
    }
}
