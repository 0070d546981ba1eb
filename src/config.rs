//! Configuration file handling for capture-gate.
//!
//! Loads configuration from `<config dir>/capture-gate/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::camera::{GateSettings, DEFAULT_DISCARD_COUNT, DEFAULT_INTERVAL};

/// Configuration file structure for capture-gate.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: f64,
    #[serde(default)]
    pub device: u32,
    #[serde(default = "default_discard_count")]
    pub discard_count: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            device: 0,
            discard_count: default_discard_count(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Stop after this many captures; 0 runs until interrupted
    #[serde(default)]
    pub max_frames: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_frames: 0,
        }
    }
}

fn default_interval_seconds() -> f64 {
    DEFAULT_INTERVAL.as_secs_f64()
}

fn default_discard_count() -> u32 {
    DEFAULT_DISCARD_COUNT
}

fn default_poll_interval_ms() -> u64 {
    100
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from the default path.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a path the user asked for explicitly.
    /// Unlike [`Config::load`], a missing file is an error.
    pub fn load_from_explicit(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::load_from(path)
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML content.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        interval_from_secs(self.gate.interval_seconds)?;
        if self.run.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "run.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Gate settings described by this configuration.
    pub fn gate_settings(&self) -> Result<GateSettings, ConfigError> {
        Ok(GateSettings {
            interval: interval_from_secs(self.gate.interval_seconds)?,
            device_id: self.gate.device,
            discard_count: self.gate.discard_count,
        })
    }
}

/// Convert a seconds value into an interval, rejecting negative and non-finite input.
pub fn interval_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        ConfigError::Invalid(format!(
            "interval must be a non-negative number of seconds, got {}",
            secs
        ))
    })
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("capture-gate").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/capture-gate/config.toml")
        })
}

/// Contents written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# capture-gate configuration

[gate]
# Minimum seconds between captured frames
interval_seconds = 10.0
# Camera device index (see `capture-gate list-cameras`)
device = 0
# Buffered frames flushed before every poll
discard_count = 5

[run]
# How often the run loop polls the gate
poll_interval_ms = 100
# Stop after this many frames (0 = run until Ctrl+C)
max_frames = 0
"#;
