//! Configuration management for earwitness.
//!
//! Application configuration lives in a TOML file in the user's config
//! directory. Missing files fall back to defaults so the tool works out of the
//! box.

pub mod file;

pub use file::{get_config_path, AudioConfig, EarwitnessConfig, PlaybackConfig};
