//! Errors raised while loading or checking wallet settings

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file missing or unreadable
    #[error("Cannot read wallet config {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Cannot write wallet config {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    /// Settings file is not valid TOML for [`super::WalletConfig`]
    #[error("Malformed wallet config: {0}")]
    Parse(String),

    #[error("Cannot encode wallet config: {0}")]
    Serialize(String),

    /// A `TEEWALLET_*` variable did not parse
    #[error("Environment variable {var}: {reason}")]
    Env { var: &'static str, reason: String },

    /// Values parsed but cannot be used together (endpoint, service ids, symbol, level)
    #[error("Invalid wallet config: {0}")]
    Invalid(String),
}
