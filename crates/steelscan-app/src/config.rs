//! Configuration management for steelscan
//!
//! Config stored at: ~/.config/steelscan/config.json

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use steelscan_types::{ConfigError, OutputFormat, Result};
use steelscan_vision::ai::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use steelscan_vision::AnalyzerConfig;

use crate::app::Delays;

/// Environment variable that overrides `api_key`
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key for the model service
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Store directory override
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Commit each result automatically and move on to the next image
    #[serde(default = "default_true")]
    pub auto_pilot: bool,

    /// Pause before an auto-pilot commit
    #[serde(default = "default_auto_save_delay_ms")]
    pub auto_save_delay_ms: u64,

    /// Pause before the next queued image starts
    #[serde(default = "default_next_image_delay_ms")]
    pub next_image_delay_ms: u64,

    /// Limit for a single analysis call
    #[serde(default = "default_analysis_timeout_secs")]
    pub analysis_timeout_secs: u64,

    /// Destination profile selected at startup
    #[serde(default)]
    pub default_profile_id: Option<String>,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_auto_save_delay_ms() -> u64 {
    1500
}

fn default_next_image_delay_ms() -> u64 {
    100
}

fn default_analysis_timeout_secs() -> u64 {
    45
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            endpoint: default_endpoint(),
            store_dir: None,
            auto_pilot: true,
            auto_save_delay_ms: default_auto_save_delay_ms(),
            next_image_delay_ms: default_next_image_delay_ms(),
            analysis_timeout_secs: default_analysis_timeout_secs(),
            default_profile_id: None,
            output_format: default_output_format(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("steelscan");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the store directory path
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.store_dir {
            return Ok(dir.clone());
        }

        let store_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join("steelscan");
        Ok(store_dir)
    }

    /// API key, preferring the environment over the file
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig::default()
            .with_endpoint(&self.endpoint)
            .with_model(&self.model)
            .with_api_key(self.api_key())
    }

    pub fn delays(&self) -> Delays {
        Delays {
            auto_save: Duration::from_millis(self.auto_save_delay_ms),
            next_image: Duration::from_millis(self.next_image_delay_ms),
        }
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Steelscan Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "Model:            {}", self.model)?;
        writeln!(f, "Endpoint:         {}", self.endpoint)?;
        writeln!(
            f,
            "API key:          {}",
            match (std::env::var(API_KEY_ENV).is_ok(), self.api_key.is_some()) {
                (true, _) => "(from environment)",
                (false, true) => "(set)",
                (false, false) => "(not set)",
            }
        )?;
        writeln!(
            f,
            "Store dir:        {}",
            self.store_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Auto-pilot:       {}", self.auto_pilot)?;
        writeln!(f, "Auto-save delay:  {} ms", self.auto_save_delay_ms)?;
        writeln!(f, "Next-image delay: {} ms", self.next_image_delay_ms)?;
        writeln!(f, "Analysis timeout: {} s", self.analysis_timeout_secs)?;
        writeln!(
            f,
            "Default profile:  {}",
            self.default_profile_id.as_deref().unwrap_or("(first)")
        )?;
        writeln!(f, "Output format:    {}", self.output_format)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:      {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{"model": "gemini-pro"}"#).unwrap();
        assert_eq!(config.model, "gemini-pro");
        assert!(config.auto_pilot);
        assert_eq!(config.auto_save_delay_ms, 1500);
        assert_eq!(config.next_image_delay_ms, 100);
        assert_eq!(config.analysis_timeout_secs, 45);
        assert_eq!(config.output_format, OutputFormat::Table);
    }

    #[test]
    fn test_delays_and_timeout() {
        let config = Config {
            auto_save_delay_ms: 10,
            next_image_delay_ms: 0,
            analysis_timeout_secs: 3,
            ..Default::default()
        };
        let delays = config.delays();
        assert_eq!(delays.auto_save, Duration::from_millis(10));
        assert_eq!(delays.next_image, Duration::ZERO);
        assert_eq!(config.analysis_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_store_dir_override() {
        let config = Config {
            store_dir: Some(PathBuf::from("/tmp/steelscan-store")),
            ..Default::default()
        };
        assert_eq!(config.store_dir().unwrap(), PathBuf::from("/tmp/steelscan-store"));
    }

    #[test]
    fn test_serialized_round_trip() {
        let config = Config {
            default_profile_id: Some("abc".to_string()),
            output_format: OutputFormat::Json,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
