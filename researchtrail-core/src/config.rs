//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/researchtrail/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/researchtrail/` (~/.config/researchtrail/)
//! - Data: `$XDG_DATA_HOME/researchtrail/` (~/.local/share/researchtrail/)
//! - State/Logs: `$XDG_STATE_HOME/researchtrail/` (~/.local/state/researchtrail/)
//!
//! Analyzer thresholds live in [`AnalyticsConfig`] and are passed explicitly
//! to the components that need them; there is no global singleton.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analytics thresholds
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Thresholds for the pattern analyzer, recommendation engine, and
/// milestone detectors.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Number of most recent events the pattern analyzer inspects
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,

    /// Act completion percentage that fires an act milestone
    #[serde(default = "default_act_completion_threshold")]
    pub act_completion_threshold: f64,

    /// Rolling window for velocity detection, in days
    #[serde(default = "default_velocity_window_days")]
    pub velocity_window_days: i64,

    /// Distinct active days required inside the window
    #[serde(default = "default_velocity_min_active_days")]
    pub velocity_min_active_days: usize,

    /// Tool uses required for a day to count as active
    #[serde(default = "default_velocity_min_daily_uses")]
    pub velocity_min_daily_uses: i64,

    /// Default depth for contextual recommendations
    #[serde(default = "default_recommendation_depth")]
    pub recommendation_depth: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            recent_window: default_recent_window(),
            act_completion_threshold: default_act_completion_threshold(),
            velocity_window_days: default_velocity_window_days(),
            velocity_min_active_days: default_velocity_min_active_days(),
            velocity_min_daily_uses: default_velocity_min_daily_uses(),
            recommendation_depth: default_recommendation_depth(),
        }
    }
}

fn default_recent_window() -> usize {
    5
}

fn default_act_completion_threshold() -> f64 {
    80.0
}

fn default_velocity_window_days() -> i64 {
    14
}

fn default_velocity_min_active_days() -> usize {
    5
}

fn default_velocity_min_daily_uses() -> i64 {
    3
}

fn default_recommendation_depth() -> usize {
    3
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.analytics.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/researchtrail/config.toml`
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("researchtrail").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite database)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("researchtrail")
    }

    /// Returns the state directory path (for logs)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("researchtrail")
    }

    /// Returns the database file path
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("researchtrail.log")
    }
}

impl AnalyticsConfig {
    /// Validate thresholds, returning an error message if unusable.
    pub fn validate(&self) -> Result<()> {
        if self.recent_window < 2 {
            return Err(Error::Config(
                "analytics.recent_window must be at least 2".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.act_completion_threshold) {
            return Err(Error::Config(
                "analytics.act_completion_threshold must be between 0 and 100".to_string(),
            ));
        }
        if self.velocity_window_days < 1 {
            return Err(Error::Config(
                "analytics.velocity_window_days must be at least 1".to_string(),
            ));
        }
        if self.recommendation_depth == 0 {
            return Err(Error::Config(
                "analytics.recommendation_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
