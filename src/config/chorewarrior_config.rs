//! Chorewarrior configuration file handling
//!
//! Loads and saves ~/.config/chorewarrior/config.yaml.

use super::service_config::FlatasticConfig;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Chorewarrior configuration
///
/// Represents the complete ~/.config/chorewarrior/config.yaml file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreWarriorConfig {
    /// Flatastic service settings
    pub flatastic: FlatasticConfig,
}

impl ChoreWarriorConfig {
    pub fn new(flatastic: FlatasticConfig) -> Self {
        Self { flatastic }
    }

    /// Load configuration from the default path (~/.config/chorewarrior/config.yaml)
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        Self::load(&path)
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::ChoreSyncError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading chorewarrior configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            base_url = %config.flatastic.base_url,
            only_if_assigned = ?config.flatastic.only_if_assigned,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving chorewarrior configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/chorewarrior/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("chorewarrior");
        path.push("config.yaml");
        path
    }
}
