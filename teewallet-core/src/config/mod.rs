//! Configuration management for the wallet
//!
//! Settings come from defaults, a TOML file, or `TEEWALLET_*` environment
//! variables. The core only consumes the runtime endpoint, the service ids
//! and the native asset symbol; logging settings are for binaries.

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Logical service id on the remote runtime
pub type ServiceId = u32;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Remote runtime endpoint
    pub runtime: RuntimeConfig,

    /// Well-known service ids
    pub services: ServiceConfig,

    /// Asset presentation
    pub assets: AssetConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Remote runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Base URL of the runtime API
    pub endpoint: String,

    /// Per-call deadline applied by callers around core operations
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

/// Service identifiers understood by the runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Target for queries that do not name a service
    pub default_service: ServiceId,

    /// Balance service
    pub balance_service: ServiceId,

    /// Asset listing service
    pub assets_service: ServiceId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Symbol of the chain's intrinsic currency
    pub native_symbol: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { default_service: 1, balance_service: 2, assets_service: 3 }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self { native_symbol: "PHA".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json_format: false }
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Env { var: key, reason: e.to_string() }),
        Err(_) => Ok(None),
    }
}

impl WalletConfig {
    /// Load configuration from environment variables
    ///
    /// Variables follow the pattern `TEEWALLET_<SECTION>_<KEY>`, for example
    /// `TEEWALLET_RUNTIME_ENDPOINT=https://runtime.example:8000`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables on top of the current values
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(endpoint) = env::var("TEEWALLET_RUNTIME_ENDPOINT") {
            self.runtime.endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("TEEWALLET_RUNTIME_REQUEST_TIMEOUT") {
            self.runtime.request_timeout = humantime_serde::re::humantime::parse_duration(&timeout)
                .map_err(|e| ConfigError::Env {
                    var: "TEEWALLET_RUNTIME_REQUEST_TIMEOUT",
                    reason: e.to_string(),
                })?;
        }

        if let Some(id) = parse_env("TEEWALLET_SERVICES_DEFAULT_SERVICE")? {
            self.services.default_service = id;
        }
        if let Some(id) = parse_env("TEEWALLET_SERVICES_BALANCE_SERVICE")? {
            self.services.balance_service = id;
        }
        if let Some(id) = parse_env("TEEWALLET_SERVICES_ASSETS_SERVICE")? {
            self.services.assets_service = id;
        }

        if let Ok(symbol) = env::var("TEEWALLET_ASSETS_NATIVE_SYMBOL") {
            self.assets.native_symbol = symbol;
        }

        if let Ok(level) = env::var("TEEWALLET_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = parse_env("TEEWALLET_LOG_JSON")? {
            self.logging.json_format = json;
        }

        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read { path: path.to_path_buf(), reason: e.to_string() })?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = url::Url::parse(&self.runtime.endpoint).map_err(|e| {
            ConfigError::Invalid(format!(
                "runtime endpoint '{}' is not a URL: {}",
                self.runtime.endpoint, e
            ))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "runtime endpoint must use http or https, got '{}'",
                endpoint.scheme()
            )));
        }

        if self.runtime.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.services.balance_service == self.services.assets_service {
            return Err(ConfigError::Invalid(
                "balance and assets services must have distinct ids".to_string(),
            ));
        }

        if self.assets.native_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "native_symbol must not be empty".to_string(),
            ));
        }

        if self.logging.level.parse::<LogLevel>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Write { path: path.to_path_buf(), reason: e.to_string() })?;

        Ok(())
    }
}
