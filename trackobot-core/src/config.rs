//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/trackobot/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/trackobot/` (~/.config/trackobot/)
//! - Data: `$XDG_DATA_HOME/trackobot/` (~/.local/share/trackobot/)
//! - State/Logs: `$XDG_STATE_HOME/trackobot/` (~/.local/state/trackobot/)
//!
//! Account credentials, the service URL and the pending results queue are
//! not configuration: they live in the settings store (see [`crate::settings`]).

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

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
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Profile service client configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Result queue pacing
    #[serde(default)]
    pub queue: QueueConfig,

    /// Settings store configuration
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Profile service client configuration
///
/// The service URL itself is stored in the settings store under
/// `webserviceUrl`, so that it survives alongside the account it belongs to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// HTTP request timeout in seconds
    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_service_timeout(),
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_service_timeout() -> u64 {
    30
}

/// Where a failed upload goes back into the queue
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequeuePosition {
    /// Append behind everything queued during the outage
    #[default]
    Tail,
    /// Put back in front, preserving causal order
    Head,
}

/// Result queue pacing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    /// Seconds between retry checks while backing off
    #[serde(default = "default_check_period")]
    pub check_period_secs: u64,

    /// Seconds between uploads while draining a backlog
    #[serde(default = "default_upload_period")]
    pub upload_period_secs: u64,

    /// Re-enqueue position for failed uploads
    #[serde(default)]
    pub requeue: RequeuePosition,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            check_period_secs: default_check_period(),
            upload_period_secs: default_upload_period(),
            requeue: RequeuePosition::default(),
        }
    }
}

impl QueueConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.check_period_secs == 0 {
            return Err(Error::Config(
                "queue.check_period_secs must be greater than 0".to_string(),
            ));
        }
        if self.upload_period_secs == 0 {
            return Err(Error::Config(
                "queue.upload_period_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_check_period() -> u64 {
    30 * 60
}

fn default_upload_period() -> u64 {
    5 * 60
}

/// Settings store configuration
#[derive(Debug, Deserialize)]
pub struct SettingsConfig {
    /// Namespace for keys in the settings database
    #[serde(default = "default_settings_namespace")]
    pub namespace: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            namespace: default_settings_namespace(),
        }
    }
}

fn default_settings_namespace() -> String {
    "trackobot".to_string()
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
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.queue.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/trackobot/config.toml` (~/.config/trackobot/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("trackobot").join("config.toml")
    }

    /// Returns the data directory path (for the settings database)
    ///
    /// `$XDG_DATA_HOME/trackobot/` (~/.local/share/trackobot/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("trackobot")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/trackobot/` (~/.local/state/trackobot/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("trackobot")
    }

    /// Returns the settings database path
    ///
    /// `$XDG_DATA_HOME/trackobot/settings.db`
    pub fn settings_path() -> PathBuf {
        Self::data_dir().join("settings.db")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.queue.check_period_secs, 1800);
        assert_eq!(config.queue.upload_period_secs, 300);
        assert_eq!(config.queue.requeue, RequeuePosition::Tail);
        assert_eq!(config.settings.namespace, "trackobot");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[logging]
level = "debug"

[service]
timeout_secs = 10

[queue]
check_period_secs = 600
requeue = "head"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.service.timeout(), Duration::from_secs(10));
        assert_eq!(config.queue.check_period_secs, 600);
        assert_eq!(config.queue.upload_period_secs, 300);
        assert_eq!(config.queue.requeue, RequeuePosition::Head);
    }

    #[test]
    fn test_queue_config_validation() {
        assert!(QueueConfig::default().validate().is_ok());

        let config = QueueConfig {
            upload_period_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_rejects_zero_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[queue]\ncheck_period_secs = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
