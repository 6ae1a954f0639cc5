//! Client-side store for a wallet talking to a TEE runtime
//!
//! The wallet opens an encrypted channel to the runtime, gates every query on
//! channel, account and client readiness, and keeps balance and asset state
//! refreshed from query results.

pub mod config;
pub mod core_account;
pub mod core_channel;
pub mod core_runtime;
pub mod core_wallet;
pub mod logging;
pub mod metrics;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConfigError, WalletConfig};
pub use core_account::{Account, AccountKeypair, Ed25519Keypair};
pub use core_channel::{Channel, ChannelCrypto, ChannelManager, ChannelPhase, X25519ChannelCrypto};
pub use core_runtime::{HttpConnector, RuntimeClient, RuntimeConnector, RuntimeInfo};
pub use core_wallet::{QueryRequest, WalletError, WalletResult, WalletSnapshot, WalletStore};
pub use logging::{init_logging, LogLevel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = LogLevel::Info;
        let _ = ChannelPhase::Fresh;
        let _ = WalletConfig::default();
    }
}
