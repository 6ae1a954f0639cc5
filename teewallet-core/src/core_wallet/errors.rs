//! Error types for wallet operations

use super::readiness::NotReady;
use crate::config::ConfigError;
use crate::core_channel::ChannelError;
use crate::core_runtime::RuntimeError;
use thiserror::Error;

pub type WalletResult<T> = Result<T, WalletError>;

#[derive(Error, Debug)]
pub enum WalletError {
    /// Channel absent or key agreement incomplete
    #[error("Secure channel not ready")]
    ChannelNotReady,

    /// No account bound, or its keypair is locked
    #[error("Account not ready")]
    AccountNotReady,

    /// No runtime client bound
    #[error("Runtime client not ready")]
    ClientNotReady,

    /// `initiate`/`join` rejected by the channel primitive
    #[error("Handshake failed: {0}")]
    Handshake(#[from] ChannelError),

    /// Transport, encryption or remote failure during a runtime call
    #[error("Query failed: {0}")]
    Query(#[from] RuntimeError),

    /// Join attempted before the runtime's key is known
    #[error("Runtime info not available; probe the runtime before joining")]
    MissingRuntimeInfo,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl WalletError {
    /// Which readiness condition failed, if this is a gate error
    pub fn not_ready_reason(&self) -> Option<NotReady> {
        match self {
            WalletError::ChannelNotReady => Some(NotReady::Channel),
            WalletError::AccountNotReady => Some(NotReady::Account),
            WalletError::ClientNotReady => Some(NotReady::Client),
            _ => None,
        }
    }
}

impl From<NotReady> for WalletError {
    fn from(reason: NotReady) -> Self {
        match reason {
            NotReady::Channel => WalletError::ChannelNotReady,
            NotReady::Account => WalletError::AccountNotReady,
            NotReady::Client => WalletError::ClientNotReady,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_round_trip() {
        for reason in [NotReady::Channel, NotReady::Account, NotReady::Client] {
            assert_eq!(WalletError::from(reason).not_ready_reason(), Some(reason));
        }
        assert_eq!(WalletError::MissingRuntimeInfo.not_ready_reason(), None);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(WalletError::AccountNotReady.to_string(), "Account not ready");
        let err: WalletError = ChannelError::NotInitiated.into();
        assert!(err.to_string().starts_with("Handshake failed"));
        let err: WalletError = RuntimeError::Transport("refused".to_string()).into();
        assert_eq!(err.to_string(), "Query failed: Transport error: refused");
    }
}
