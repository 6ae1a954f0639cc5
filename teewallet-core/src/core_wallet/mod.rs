//! Wallet core - gated encrypted queries and local state
//!
//! ```text
//! WalletStore ──> QueryGateway ──> RuntimeClient
//!      │               │
//!      │               └──> ReadinessGate (channel, account, client)
//!      └──> ChannelManager
//! ```

pub mod errors;
pub mod gateway;
pub mod latency;
pub mod readiness;
pub mod store;
pub mod types;

pub use errors::{WalletError, WalletResult};
pub use gateway::{result_field, QueryGateway, QueryRequest};
pub use latency::LatencyTracker;
pub use readiness::{NotReady, ReadinessGate};
pub use store::{WalletSnapshot, WalletStore, FREE_BALANCE, LIST_ASSETS};
pub use types::{Asset, AssetMetadata, BalanceUpdate, LastError, MainAsset};
