//! Error types for the secure channel

use thiserror::Error;

pub type ChannelResult<T> = Result<T, ChannelError>;

#[derive(Error, Debug)]
pub enum ChannelError {
    /// Join attempted on a channel without local key material
    #[error("Channel has no local key material; initiate it before joining")]
    NotInitiated,

    /// Remote or local public key could not be decoded
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Diffie-Hellman or key derivation failed
    #[error("Key agreement failed: {0}")]
    KeyAgreement(String),

    /// Operation needs an established channel
    #[error("Channel is not established")]
    NotEstablished,

    #[error("Failed to seal payload: {0}")]
    Seal(String),

    #[error("Failed to open payload: {0}")]
    Open(String),

    /// Failure reported by a channel crypto backend
    #[error("Channel primitive failed: {0}")]
    Primitive(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(ChannelError::NotInitiated.to_string().contains("initiate"));
        let err = ChannelError::InvalidPublicKey("expected 32 bytes".to_string());
        assert_eq!(err.to_string(), "Invalid public key: expected 32 bytes");
    }
}
