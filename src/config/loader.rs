//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/league.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure matching config/league.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub valuation: ValuationSection,
    #[serde(default)]
    pub quotes: QuotesSection,
    pub store: StoreSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Valuation timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct ValuationSection {
    /// Budget for one member's whole valuation (ms)
    #[serde(default = "default_member_timeout_ms")]
    pub member_timeout_ms: u64,
    /// Budget for one quote lookup (ms)
    #[serde(default = "default_quote_timeout_ms")]
    pub quote_timeout_ms: u64,
}

impl Default for ValuationSection {
    fn default() -> Self {
        Self {
            member_timeout_ms: default_member_timeout_ms(),
            quote_timeout_ms: default_quote_timeout_ms(),
        }
    }
}

fn default_member_timeout_ms() -> u64 {
    5000
}

fn default_quote_timeout_ms() -> u64 {
    2000
}

/// Quote API section (optional)
#[derive(Debug, Clone, Deserialize)]
pub struct QuotesSection {
    /// League API base URL. Without one, prices come from the snapshot.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Token sent as `Authorization: Token <token>`
    #[serde(default)]
    pub api_token: Option<String>,
    /// HTTP request timeout (ms)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for QuotesSection {
    fn default() -> Self {
        Self {
            api_url: None,
            api_token: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    3000
}

impl QuotesSection {
    /// Get API URL with environment variable override
    /// Checks LEAGUE_QUOTES_URL env var first, falls back to config value
    pub fn get_api_url(&self) -> Option<String> {
        override_or(std::env::var("LEAGUE_QUOTES_URL").ok(), &self.api_url)
    }

    /// Get API token with environment variable override
    pub fn get_api_token(&self) -> Option<String> {
        override_or(std::env::var("LEAGUE_API_TOKEN").ok(), &self.api_token)
    }
}

/// First non-empty of an override and a configured value
fn override_or(over: Option<String>, configured: &Option<String>) -> Option<String> {
    over.filter(|v| !v.is_empty())
        .or_else(|| configured.clone().filter(|v| !v.is_empty()))
}

/// League data section
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// Snapshot file with leagues, members and accounts
    pub snapshot_path: String,
}

impl StoreSection {
    /// Snapshot path with `~` expanded to the home directory
    pub fn expanded_snapshot_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.snapshot_path).to_string())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.valuation.member_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "member_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.valuation.quote_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "quote_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.valuation.quote_timeout_ms > self.valuation.member_timeout_ms {
            return Err(ConfigError::ValidationError(format!(
                "quote_timeout_ms ({}) must not exceed member_timeout_ms ({})",
                self.valuation.quote_timeout_ms, self.valuation.member_timeout_ms
            )));
        }

        if self.quotes.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.store.snapshot_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "snapshot_path cannot be empty".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log level must be one of {:?}, got {}",
                LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }
}
