//! Player configuration loaded from ~/.catrock/config.yaml.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::score::is_valid_tempo;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid config {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Settings applied to every `play` unless a command-line flag overrides
/// them. Each one in turn overrides the value from the score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Preferred MIDI output (substring match). None = first available.
    #[serde(default)]
    pub device_name: Option<String>,
    /// Tempo in BPM, replacing the score's.
    #[serde(default)]
    pub tempo: Option<f64>,
    #[serde(default)]
    pub volume: Option<u8>,
    /// `tracing` filter directive, e.g. `info` or `catrock=debug`.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl PlayerConfig {
    /// The standard location, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::home_dir()?.join(".catrock").join("config.yaml"))
    }

    /// Load from the standard path. A missing or broken file gives `None`.
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::default_path()?).ok()
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(tempo) = self.tempo.filter(|&t| !is_valid_tempo(t)) {
            return Err(format!("tempo must be a positive number, got {tempo}"));
        }
        if let Some(volume) = self.volume.filter(|&v| v > 127) {
            return Err(format!("volume must be 0-127, got {volume}"));
        }
        Ok(())
    }

    /// First of `flag`, then this config's tempo, then `score`.
    pub fn tempo_or(&self, flag: Option<f64>, score: f64) -> f64 {
        flag.or(self.tempo).unwrap_or(score)
    }

    pub fn volume_or(&self, flag: Option<u8>, score: u8) -> u8 {
        flag.or(self.volume).unwrap_or(score)
    }

    pub fn device_or(&self, flag: Option<String>) -> Option<String> {
        flag.or_else(|| self.device_name.clone())
    }
}
