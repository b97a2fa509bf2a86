//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Poll interval for readings, media and status
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
            no_color: false,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("firewatch")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from a specific file, or return default if missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config {}: {}", path.display(), e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    /// Save config to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

/// Effective settings after merging flags, environment and config file.
///
/// clap already folds the environment into the flag values, so each
/// resolver only has to prefer the argument over the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
    pub no_color: bool,
}

impl Settings {
    pub fn resolve(
        api_url: Option<String>,
        interval_ms: Option<u64>,
        timeout_secs: Option<u64>,
        no_color: bool,
        config: &Config,
    ) -> Self {
        Self {
            api_url: resolve_api_url(api_url, config),
            poll_interval: Duration::from_millis(interval_ms.unwrap_or(config.poll_interval_ms)),
            timeout: Duration::from_secs(timeout_secs.unwrap_or(config.timeout_secs)),
            no_color: no_color || config.no_color,
        }
    }
}

/// Resolve the backend URL from arg/env or config, ignoring blank values.
pub fn resolve_api_url(api_url: Option<String>, config: &Config) -> String {
    api_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| config.api_url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.poll_interval_ms, 3000);
        assert_eq!(config.timeout_secs, 10);
        assert!(!config.no_color);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("api_url = \"http://10.0.0.5:8000\"").unwrap();
        assert_eq!(config.api_url, "http://10.0.0.5:8000");
        assert_eq!(config.poll_interval_ms, 3000);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            api_url: "http://sensor.local:8000".to_string(),
            no_color: true,
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_invalid_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "poll_interval_ms = \"fast\"").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            Config::load_from(&dir.path().join("absent.toml")),
            Config::default()
        );
    }

    #[test]
    fn test_resolve_api_url_prefers_arg() {
        let config = Config {
            api_url: "http://config:8000".to_string(),
            ..Default::default()
        };
        let result = resolve_api_url(Some("http://arg:8000".to_string()), &config);
        assert_eq!(result, "http://arg:8000");
    }

    #[test]
    fn test_resolve_api_url_ignores_blank_arg() {
        let config = Config {
            api_url: "http://config:8000".to_string(),
            ..Default::default()
        };
        assert_eq!(
            resolve_api_url(Some("  ".to_string()), &config),
            "http://config:8000"
        );
        assert_eq!(resolve_api_url(None, &config), "http://config:8000");
    }

    #[test]
    fn test_settings_resolve() {
        let config = Config {
            poll_interval_ms: 5000,
            no_color: true,
            ..Default::default()
        };
        let settings = Settings::resolve(None, Some(1000), None, false, &config);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.poll_interval, Duration::from_millis(1000));
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert!(settings.no_color);
    }
}
