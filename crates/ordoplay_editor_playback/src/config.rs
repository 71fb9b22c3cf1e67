// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback and export configuration.

use crate::audio::AudioFormat;
use crate::error::{PlaybackError, Result};
use crate::history::DEFAULT_HISTORY_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "playback.ron";

/// Output, audio and worker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Config format version
    pub version: u32,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Audio sample rate
    pub sample_rate: u32,
    /// Audio channel count
    pub channels: u16,
    /// Render worker threads
    pub render_threads: usize,
    /// Frames submitted to the render pool before the exporter waits
    pub max_frames_in_flight: usize,
    /// Undo history depth
    pub history_depth: usize,
    /// Log filter directive, e.g. `ordoplay=debug`
    pub log_filter: Option<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            width: 640,
            height: 360,
            sample_rate: 48_000,
            channels: 2,
            render_threads: 4,
            max_frames_in_flight: 8,
            history_depth: DEFAULT_HISTORY_DEPTH,
            log_filter: None,
        }
    }
}

impl PlaybackConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PlaybackConfig = ron::from_str(&content).map_err(|e| PlaybackError::Config(e.to_string()))?;

        if config.version > CONFIG_FORMAT_VERSION {
            return Err(PlaybackError::Config(format!(
                "Config version {} is newer than supported version {}",
                config.version, CONFIG_FORMAT_VERSION
            )));
        }

        Ok(config)
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, pretty).map_err(|e| PlaybackError::Config(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Audio format for a timeline running at `frame_rate`
    pub fn audio_format(&self, frame_rate: f64) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            frame_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ordoplay-{}-{name}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_save_load() {
        let path = temp_path(CONFIG_FILE_NAME);
        let config = PlaybackConfig {
            width: 320,
            log_filter: Some("ordoplay=debug".to_string()),
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = PlaybackConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_default() {
        let config: PlaybackConfig = ron::from_str("(width: 100)").unwrap();
        assert_eq!(config.width, 100);
        assert_eq!(config.height, 360);
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
    }

    #[test]
    fn test_newer_version_rejected() {
        let path = temp_path(CONFIG_FILE_NAME);
        std::fs::write(&path, "(version: 99)").unwrap();
        let result = PlaybackConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(PlaybackError::Config(_))));
    }
}
