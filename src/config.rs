//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/normtree/normtree.toml`
//! 3. Environment variables: `NORMTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config error: {message}")]
    Config { message: String },
}

/// Unified configuration for normtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding robot resource files (default: ./resources)
    pub resource_dir: PathBuf,
    /// Default results database file
    pub results_file: PathBuf,
    /// Pause between narration lines, milliseconds (0 disables pauses)
    pub narration_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resource_dir: PathBuf::from("resources"),
            results_file: PathBuf::from("experiment_results.json"),
            narration_delay_ms: 2000,
        }
    }
}

/// Raw settings for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    resource_dir: Option<PathBuf>,
    results_file: Option<PathBuf>,
    narration_delay_ms: Option<u64>,
}

/// Get the XDG config directory for normtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "normtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("normtree.toml"))
}

fn load_raw_settings(path: &Path) -> Result<RawSettings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            resource_dir: overlay
                .resource_dir
                .clone()
                .unwrap_or_else(|| self.resource_dir.clone()),
            results_file: overlay
                .results_file
                .clone()
                .unwrap_or_else(|| self.results_file.clone()),
            narration_delay_ms: overlay
                .narration_delay_ms
                .unwrap_or(self.narration_delay_ms),
        }
    }

    /// Load settings with layered precedence.
    pub fn load() -> Result<Self, ConfigError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        Ok(current)
    }

    /// Apply NORMTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ConfigError> {
        let builder =
            Config::builder().add_source(Environment::with_prefix("NORMTREE").separator("__"));
        let config = builder.build().map_err(|e| ConfigError::Config {
            message: e.to_string(),
        })?;

        if let Ok(val) = config.get_string("resource_dir") {
            settings.resource_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("results_file") {
            settings.results_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_int("narration_delay_ms") {
            settings.narration_delay_ms = val.max(0) as u64;
        }
        Ok(settings)
    }

    /// Write a commented template to the global config path.
    pub fn write_template() -> Result<PathBuf, ConfigError> {
        let path = global_config_path().ok_or_else(|| ConfigError::Config {
            message: "cannot determine config directory".into(),
        })?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::Config {
                message: format!("create {}: {}", dir.display(), e),
            })?;
        }
        let defaults = Settings::default();
        let body = toml::to_string_pretty(&defaults).map_err(|e| ConfigError::Config {
            message: e.to_string(),
        })?;
        let content = format!("# normtree configuration\n{body}");
        std::fs::write(&path, content).map_err(|e| ConfigError::Config {
            message: format!("write {}: {}", path.display(), e),
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.narration_delay_ms, 2000);
        assert_eq!(settings.results_file, PathBuf::from("experiment_results.json"));
    }

    #[test]
    fn test_merge_overlay_wins_when_set() {
        let overlay = RawSettings {
            narration_delay_ms: Some(0),
            ..Default::default()
        };
        let merged = Settings::default().merge_with(&overlay);
        assert_eq!(merged.narration_delay_ms, 0);
        assert_eq!(merged.resource_dir, PathBuf::from("resources"));
    }
}
