//! # Gantry Host Configuration
//!
//! All sections and fields are optional; anything missing takes its default.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [runner]
//! failure_mode = "ignore"   # or "error" to abort on the first bad line
//! line_delay_ms = 100
//!
//! [leds]
//! count = 8
//!
//! [motion]
//! lead_mm = 8.0
//! ```
//!
//! ## Example: Rust Usage
//!
//! ```rust
//! use gantry_host::config::{Config, FailureMode};
//! let config: Config = toml::from_str("[runner]\nfailure_mode = \"error\"").unwrap();
//! assert_eq!(config.runner.failure_mode, FailureMode::Error);
//! assert_eq!(config.leds.count, 8);
//! assert!(config.validate().is_ok());
//! ```

// src/config.rs - Single configuration file
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub leds: LedConfig,
    #[serde(default)]
    pub motion: MotionConfig,
}

/// How the runner treats lines that fail to parse or dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Log, count and skip the line.
    #[default]
    Ignore,
    /// Fail the run on the first bad line.
    Error,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub failure_mode: FailureMode,
    /// Fixed pause after every dispatched command, in milliseconds.
    #[serde(default = "default_line_delay_ms")]
    pub line_delay_ms: u64,
}

impl RunnerConfig {
    pub fn line_delay(&self) -> Duration {
        Duration::from_millis(self.line_delay_ms)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            failure_mode: FailureMode::default(),
            line_delay_ms: default_line_delay_ms(),
        }
    }
}

/// Addressable LED strip.
#[derive(Debug, Clone, Deserialize)]
pub struct LedConfig {
    #[serde(default = "default_led_count")]
    pub count: usize,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            count: default_led_count(),
        }
    }
}

/// Lead-screw gantry.
#[derive(Debug, Clone, Deserialize)]
pub struct MotionConfig {
    /// Travel per screw revolution, in millimetres.
    #[serde(default = "default_lead_mm")]
    pub lead_mm: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            lead_mm: default_lead_mm(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leds.count == 0 {
            return Err(ConfigError::Invalid("leds.count must be > 0".to_string()));
        }
        if !(self.motion.lead_mm > 0.0) {
            return Err(ConfigError::Invalid("motion.lead_mm must be > 0".to_string()));
        }
        Ok(())
    }
}

// Default value functions
fn default_line_delay_ms() -> u64 { 0 }
fn default_led_count() -> usize { 8 }
fn default_lead_mm() -> f64 { 8.0 }

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let config: Config = match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                return Err(ConfigError::Toml(e));
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    config.validate()?;
    Ok(config)
}
