use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Server used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// server_url = "http://localhost:8000"
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Base URL of the weather service, without the `/weather` path.
    pub server_url: Option<String>,
}

impl Config {
    /// Configured server, or [`DEFAULT_SERVER_URL`].
    pub fn server_url(&self) -> &str {
        self.server_url
            .as_deref()
            .map(|s| s.trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Validate and store a server URL.
    pub fn set_server_url(&mut self, url: &str) -> Result<()> {
        let trimmed = url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .with_context(|| format!("Invalid server URL '{url}'"))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Unsupported scheme '{}' in server URL. Use http:// or https://.",
                parsed.scheme()
            ));
        }

        self.server_url = Some(trimmed.to_string());
        Ok(())
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-lookup", "weather-lookup")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
