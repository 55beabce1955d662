//! TOML-based client session settings.
//!
//! Stores the inputs the session planner and machine are created from:
//! total focus duration, break duration, max break count, and the
//! auto-start-breaks flag. Stored at `~/.config/focusstreak/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Session planning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Total focus seconds per session.
    #[serde(default = "default_focus_secs")]
    pub total_focus_duration: u64,
    /// Break length in seconds.
    #[serde(default = "default_break_secs")]
    pub break_duration: u64,
    #[serde(default = "default_max_breaks")]
    pub max_breaks: u32,
    /// Break segments start automatically after a transition; focus
    /// segments always wait for an explicit start.
    #[serde(default = "default_true")]
    pub auto_start_breaks: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_focus_duration: default_focus_secs(),
            break_duration: default_break_secs(),
            max_breaks: default_max_breaks(),
            auto_start_breaks: true,
        }
    }
}

/// Application configuration, serialized to/from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load from the default location; absent file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        Self::load_at(&path)
    }

    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::default_path()?;
        self.save_at(&path)
    }

    pub fn save_at(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/focusstreak"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }
}

fn default_focus_secs() -> u64 {
    25 * 60
}

fn default_break_secs() -> u64 {
    5 * 60
}

fn default_max_breaks() -> u32 {
    2
}

fn default_true() -> bool {
    true
}
