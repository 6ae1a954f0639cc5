//! Error types for runtime client operations

use crate::core_account::KeypairError;
use crate::core_channel::ChannelError;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid runtime endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection, TLS or timeout failure below HTTP
    #[error("Transport error: {0}")]
    Transport(String),

    /// Runtime answered with a non-success status
    #[error("Runtime returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response could not be decoded
    #[error("Failed to decode runtime response: {0}")]
    Decode(String),

    /// Sealing or opening the payload failed
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Failed to sign query: {0}")]
    Signing(#[from] KeypairError),

    #[error("No keypair bound to the runtime client")]
    MissingKeypair,

    /// Error reported inside a decrypted response
    #[error("Runtime rejected query: {0}")]
    Remote(String),
}

impl From<reqwest::Error> for RuntimeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RuntimeError::Decode(e.to_string())
        } else {
            RuntimeError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RuntimeError {
    fn from(e: serde_json::Error) -> Self {
        RuntimeError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RuntimeError::Status { status: 503, body: "busy".to_string() };
        assert_eq!(err.to_string(), "Runtime returned HTTP 503: busy");
    }

    #[test]
    fn test_error_conversions() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(RuntimeError::from(json_err), RuntimeError::Decode(_)));

        let err: RuntimeError = KeypairError::Locked.into();
        assert!(matches!(err, RuntimeError::Signing(KeypairError::Locked)));
    }
}
