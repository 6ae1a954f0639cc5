//! ChannelCrypto trait - the key agreement primitive behind ChannelManager
//!
//! ```text
//! ChannelManager
//!       |
//!       v
//! ChannelCrypto (trait)
//!       |
//!       +---> X25519ChannelCrypto (X25519 + HKDF-SHA256)
//!       |
//!       +---> test doubles in test_utils
//! ```

use super::channel::{AgreedSecret, Channel, LocalKeys, PublicKey, KEY_LEN};
use super::errors::{ChannelError, ChannelResult};
use async_trait::async_trait;
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::PublicKey as X25519PublicKey;

const HKDF_SALT: &[u8] = b"teewallet channel v1";
const HKDF_INFO: &[u8] = b"teewallet agreed secret";

/// Key agreement primitive
#[async_trait]
pub trait ChannelCrypto: Send + Sync {
    /// Produce a channel holding fresh local key material and no shared secret
    async fn new_channel(&self) -> ChannelResult<Channel>;

    /// Complete key agreement against the remote runtime's public key
    ///
    /// Fails with [`ChannelError::NotInitiated`] when `channel` carries no
    /// local key material.
    async fn join_channel(&self, channel: &Channel, remote: PublicKey) -> ChannelResult<Channel>;
}

/// X25519 Diffie-Hellman with HKDF-SHA256 secret derivation
#[derive(Debug, Default, Clone, Copy)]
pub struct X25519ChannelCrypto;

impl X25519ChannelCrypto {
    pub fn new() -> Self {
        X25519ChannelCrypto
    }
}

/// Derive the channel secret from one side's keys and the peer's public key
pub fn agree(local: &LocalKeys, remote: &PublicKey) -> ChannelResult<AgreedSecret> {
    let shared = local
        .static_secret()
        .diffie_hellman(&X25519PublicKey::from(*remote.as_bytes()));
    if !shared.was_contributory() {
        return Err(ChannelError::InvalidPublicKey(
            "remote key produced a non-contributory shared secret".to_string(),
        ));
    }

    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), shared.as_bytes());
    let mut okm = [0u8; KEY_LEN];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|e| ChannelError::KeyAgreement(e.to_string()))?;

    Ok(AgreedSecret::from_bytes(okm))
}

#[async_trait]
impl ChannelCrypto for X25519ChannelCrypto {
    async fn new_channel(&self) -> ChannelResult<Channel> {
        let secret: [u8; KEY_LEN] = rand::random();
        Ok(Channel::initiated(LocalKeys::from_secret(secret)))
    }

    async fn join_channel(&self, channel: &Channel, remote: PublicKey) -> ChannelResult<Channel> {
        let local = channel.local_keys().ok_or(ChannelError::NotInitiated)?;
        let secret = agree(local, &remote)?;
        Ok(Channel::established(local.clone(), remote, secret))
    }
}
