//! # Configuration Management for RedisHaus
//!
//! This crate provides centralized configuration structures for all RedisHaus components,
//! including the Redis connection, key scanning defaults and the signal system.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{RedisConfig, ScanConfig, SignalConfig};
//!
//! // Connection configuration, every key namespaced under "app:"
//! let redis_config = RedisConfig::new("localhost".to_string(), 6379).with_prefix("app:");
//!
//! // Scan configuration (COUNT hint sent with every SCAN)
//! let scan_config = ScanConfig::new(500);
//!
//! // Signal configuration
//! let signal_config = SignalConfig::new(true);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [redis]
//! host = "localhost"
//! port = 6379
//! database = 0
//! password = "secret"
//! prefix = "app:"
//! connection_timeout_ms = 5000
//!
//! [scan]
//! count = 1000
//!
//! [signal]
//! enabled = true
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from redishaus.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./redishaus.toml";
const CONFIG_PATH_ENV: &str = "REDISHAUS_CONFIG";

/// Default COUNT hint for SCAN
pub const DEFAULT_SCAN_COUNT: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub redis: RedisConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub signal: SignalConfig,
}

/// Redis connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub database: i64,
    #[serde(default)]
    pub password: Option<String>,
    /// Namespace prepended to every key sent through the client
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

/// Key scanning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// COUNT hint passed to SCAN; the server may return more or fewer keys
    pub count: usize,
}

/// Signal system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    pub enabled: bool,
}

fn default_connection_timeout_ms() -> u64 {
    5000
}

impl AppConfig {
    /// Load configuration from TOML file specified in .env or defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = {
            // A missing .env is fine, a malformed one is not
            if let Err(err) = dotenvy::dotenv() {
                if !err.not_found() {
                    return Err(err.into());
                }
            }

            if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
                Self::from_file(&config_path)
            } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
                Self::from_file(DEFAULT_CONFIG_PATH)
            } else {
                Err(ConfigError::Invalid(format!(
                    "Config path must be specified in .env file as {} or in {} file",
                    CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH
                )))
            }
        }?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.redis.validate()?;
        self.scan.validate()?;
        Ok(())
    }
}

impl RedisConfig {
    /// Create a new connection configuration with defaults for everything but the address
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_connection_timeout(mut self, timeout_ms: u64) -> Self {
        self.connection_timeout_ms = timeout_ms;
        self
    }

    /// Key prefix, empty when none is configured
    pub fn key_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    /// Password to authenticate with, `None` when unset or empty
    pub fn auth_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|password| !password.is_empty())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid(
                "Redis host cannot be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid(
                "Redis port cannot be zero".to_string(),
            ));
        }
        if self.database < 0 {
            return Err(ConfigError::Invalid(
                "Redis database index cannot be negative".to_string(),
            ));
        }
        if self.connection_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "Redis connection_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: 0,
            password: None,
            prefix: None,
            connection_timeout_ms: default_connection_timeout_ms(),
        }
    }
}

impl ScanConfig {
    /// Create a new scan configuration
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::Invalid(
                "Scan count must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_SCAN_COUNT,
        }
    }
}

impl SignalConfig {
    /// Create a new signal configuration
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
