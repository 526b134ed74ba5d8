use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{client::DEFAULT_BASE_URL, model::Coordinates};

/// Environment variable that overrides the configured service URL.
pub const API_URL_ENV: &str = "AGRO_API_URL";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_base_url = "http://127.0.0.1:5000"
///
/// [location]
/// latitude = 30.9
/// longitude = 75.85
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,

    /// Fixed position used when the device cannot report one.
    pub location: Option<Coordinates>,
}

impl Config {
    /// Service URL: `AGRO_API_URL`, then the file, then the local default.
    pub fn api_base_url(&self) -> String {
        self.api_base_url_with(std::env::var(API_URL_ENV).ok())
    }

    fn api_base_url_with(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn set_api_base_url(&mut self, url: impl Into<String>) {
        self.api_base_url = Some(url.into());
    }

    pub fn set_location(&mut self, latitude: f64, longitude: f64) {
        self.location = Some(Coordinates { latitude, longitude });
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "agro-advisor", "agro-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
