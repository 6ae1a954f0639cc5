//! Secure channel with the remote runtime
//!
//! Owns the key agreement handshake and the channel state it produces.

pub mod channel;
pub mod crypto;
pub mod errors;
pub mod manager;

pub use channel::{
    AgreedSecret, Channel, ChannelPhase, EstablishedChannel, LocalKeys, PublicKey, SealedPayload,
    KEY_LEN, NONCE_LEN,
};
pub use crypto::{agree, ChannelCrypto, X25519ChannelCrypto};
pub use errors::{ChannelError, ChannelResult};
pub use manager::ChannelManager;
