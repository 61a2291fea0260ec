//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/logdesk/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/logdesk/` (~/.config/logdesk/)
//! - State/Logs: `$XDG_STATE_HOME/logdesk/` (~/.local/state/logdesk/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "LOGDESK_API_URL";

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

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// LogCollector API connection
    #[serde(default)]
    pub api: ApiConfig,

    /// Console behaviour (paging, live polling)
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Synthetic log generator limits
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LogCollector API connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ApiConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api.base_url must start with http:// or https://, got {:?}",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed.
    pub fn normalized_base_url(&self) -> String {
        self.base_url.trim().trim_end_matches('/').to_string()
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Console paging and refresh settings
#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleConfig {
    /// Rows per page for list views
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Seconds between list refreshes while live mode is on
    #[serde(default = "default_live_poll_secs")]
    pub live_poll_secs: u64,

    /// Entries per ranking board
    #[serde(default = "default_rank_limit")]
    pub rank_limit: u32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            live_poll_secs: default_live_poll_secs(),
            rank_limit: default_rank_limit(),
        }
    }
}

fn default_page_size() -> u32 {
    20
}

fn default_live_poll_secs() -> u64 {
    3
}

fn default_rank_limit() -> u32 {
    5
}

/// Limits for the synthetic log generator
#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorConfig {
    /// Delay between sends in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Upper bound for the repeat count
    #[serde(default = "default_max_repeat")]
    pub max_repeat: u32,

    /// Upper bound for the delay
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            max_repeat: default_max_repeat(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_delay_ms() -> u64 {
    50
}

fn default_max_repeat() -> u32 {
    200
}

fn default_max_delay_ms() -> u64 {
    2000
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Level (trace, debug, info, warn, error, off) or an `EnvFilter` directive list
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

impl Config {
    /// Load configuration from the default path, then apply env overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!(url = %url, "API base URL overridden from environment");
                config.api.base_url = url;
            }
        }

        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        if self.console.page_size == 0 {
            return Err(Error::Config(
                "console.page_size must be greater than 0".to_string(),
            ));
        }
        if self.console.live_poll_secs == 0 {
            return Err(Error::Config(
                "console.live_poll_secs must be greater than 0".to_string(),
            ));
        }
        if self.console.rank_limit == 0 {
            return Err(Error::Config(
                "console.rank_limit must be greater than 0".to_string(),
            ));
        }
        if self.generator.max_repeat == 0 {
            return Err(Error::Config(
                "generator.max_repeat must be greater than 0".to_string(),
            ));
        }
        crate::logging::level_filter(&self.logging.level)?;
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/logdesk/config.toml` (~/.config/logdesk/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("logdesk").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/logdesk/` (~/.local/state/logdesk/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("logdesk")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.console.page_size, 20);
        assert_eq!(config.console.live_poll_secs, 3);
        assert_eq!(config.console.rank_limit, 5);
        assert_eq!(config.generator.max_repeat, 200);
        assert_eq!(config.generator.max_delay_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[api]
base_url = "https://logs.internal.example.com/api/"
timeout_secs = 5

[console]
page_size = 50
live_poll_secs = 10

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(
            config.api.normalized_base_url(),
            "https://logs.internal.example.com/api"
        );
        assert_eq!(config.console.page_size, 50);
        assert_eq!(config.console.live_poll_secs, 10);
        // Unspecified keys keep their defaults
        assert_eq!(config.console.rank_limit, 5);
        assert_eq!(config.generator.delay_ms, 50);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_api_config_validation() {
        let mut api = ApiConfig::default();
        assert!(api.validate().is_ok());

        api.base_url = "".to_string();
        assert!(api.validate().is_err());

        api.base_url = "localhost:8080/api".to_string();
        assert!(api.validate().is_err());

        api.base_url = "http://localhost:8080/api".to_string();
        api.timeout_secs = 0;
        assert!(api.validate().is_err());
    }

    #[test]
    fn test_console_config_validation() {
        let mut config = Config::default();
        config.console.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.console.live_poll_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_level_validation() {
        let mut config = Config::default();
        config.logging.level = "info,logdesk_core=debug".to_string();
        assert!(config.validate().is_ok());

        config.logging.level = "chatty".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[console]\nrank_limit = 10\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.console.rank_limit, 10);
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[console\npage_size = ").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_state_dir() {
        assert!(Config::state_dir().ends_with("logdesk"));
    }
}
