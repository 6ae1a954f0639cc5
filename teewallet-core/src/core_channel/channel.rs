//! Channel state and key material
//!
//! A channel is a sum type over its three legal phases, so "secret without
//! remote key" and similar half-formed states cannot be represented. Secret
//! material is zeroized on drop and never leaves this module; callers seal
//! and open payloads through [`EstablishedChannel`].

use super::errors::{ChannelError, ChannelResult};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of X25519 keys and of the agreed secret
pub const KEY_LEN: usize = 32;

/// Length of the ChaCha20-Poly1305 nonce
pub const NONCE_LEN: usize = 12;

/// X25519 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        PublicKey(bytes)
    }

    /// Parse a hex string, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> ChannelResult<Self> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed)
            .map_err(|e| ChannelError::InvalidPublicKey(format!("not hex: {}", e)))?;
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            ChannelError::InvalidPublicKey(format!("expected {} bytes, got {}", KEY_LEN, v.len()))
        })?;
        Ok(PublicKey(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Local X25519 keypair generated by `initiate`
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LocalKeys {
    #[zeroize(skip)]
    public: PublicKey,
    secret: [u8; KEY_LEN],
}

impl LocalKeys {
    pub fn from_secret(secret: [u8; KEY_LEN]) -> Self {
        let static_secret = StaticSecret::from(secret);
        let public = X25519PublicKey::from(&static_secret);
        LocalKeys { public: PublicKey(public.to_bytes()), secret }
    }

    pub fn public(&self) -> PublicKey {
        self.public
    }

    pub(crate) fn static_secret(&self) -> StaticSecret {
        StaticSecret::from(self.secret)
    }
}

impl fmt::Debug for LocalKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeys").field("public", &self.public).finish_non_exhaustive()
    }
}

/// Shared secret negotiated with the remote runtime
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AgreedSecret([u8; KEY_LEN]);

impl AgreedSecret {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        AgreedSecret(bytes)
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }
}

impl fmt::Debug for AgreedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AgreedSecret(<redacted>)")
    }
}

/// Ciphertext plus the nonce it was sealed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPayload {
    /// Hex-encoded nonce
    pub nonce: String,
    /// Hex-encoded ciphertext including the AEAD tag
    pub ciphertext: String,
}

/// Channel with both sides' keys and the agreed secret
#[derive(Debug)]
pub struct EstablishedChannel {
    local: LocalKeys,
    remote_pubkey: PublicKey,
    agreed_secret: AgreedSecret,
}

impl EstablishedChannel {
    pub fn local_public(&self) -> PublicKey {
        self.local.public()
    }

    pub fn remote_pubkey(&self) -> PublicKey {
        self.remote_pubkey
    }

    pub fn seal(&self, plaintext: &[u8]) -> ChannelResult<SealedPayload> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .agreed_secret
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| ChannelError::Seal(e.to_string()))?;

        Ok(SealedPayload { nonce: hex::encode(nonce_bytes), ciphertext: hex::encode(ciphertext) })
    }

    pub fn open(&self, sealed: &SealedPayload) -> ChannelResult<Vec<u8>> {
        let nonce = hex::decode(&sealed.nonce).map_err(|e| ChannelError::Open(e.to_string()))?;
        if nonce.len() != NONCE_LEN {
            return Err(ChannelError::Open(format!(
                "nonce must be {} bytes, got {}",
                NONCE_LEN,
                nonce.len()
            )));
        }
        let ciphertext =
            hex::decode(&sealed.ciphertext).map_err(|e| ChannelError::Open(e.to_string()))?;

        self.agreed_secret
            .cipher()
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .map_err(|e| ChannelError::Open(e.to_string()))
    }
}

/// Lifecycle phase of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelPhase {
    Fresh,
    Initiated,
    Established,
}

impl fmt::Display for ChannelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelPhase::Fresh => "fresh",
            ChannelPhase::Initiated => "initiated",
            ChannelPhase::Established => "established",
        };
        f.write_str(s)
    }
}

/// Secure session with the remote runtime
#[derive(Debug, Default)]
pub enum Channel {
    /// No key material yet
    #[default]
    Fresh,
    /// Local keypair generated, waiting for the remote key
    Initiated(LocalKeys),
    /// Key agreement completed
    Established(EstablishedChannel),
}

impl Channel {
    pub fn initiated(local: LocalKeys) -> Self {
        Channel::Initiated(local)
    }

    pub fn established(local: LocalKeys, remote_pubkey: PublicKey, secret: AgreedSecret) -> Self {
        Channel::Established(EstablishedChannel {
            local,
            remote_pubkey,
            agreed_secret: secret,
        })
    }

    pub fn phase(&self) -> ChannelPhase {
        match self {
            Channel::Fresh => ChannelPhase::Fresh,
            Channel::Initiated(_) => ChannelPhase::Initiated,
            Channel::Established(_) => ChannelPhase::Established,
        }
    }

    /// Local key material, present once initiated
    pub fn local_keys(&self) -> Option<&LocalKeys> {
        match self {
            Channel::Fresh => None,
            Channel::Initiated(local) => Some(local),
            Channel::Established(est) => Some(&est.local),
        }
    }

    pub fn remote_pubkey(&self) -> Option<PublicKey> {
        self.as_established().map(|est| est.remote_pubkey)
    }

    pub fn has_agreed_secret(&self) -> bool {
        matches!(self, Channel::Established(_))
    }

    pub fn is_established(&self) -> bool {
        self.as_established().is_some()
    }

    pub fn as_established(&self) -> Option<&EstablishedChannel> {
        match self {
            Channel::Established(est) => Some(est),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn established_pair() -> (Channel, Channel) {
        let a = LocalKeys::from_secret([1u8; KEY_LEN]);
        let b = LocalKeys::from_secret([2u8; KEY_LEN]);
        let (a_pub, b_pub) = (a.public(), b.public());
        let secret = [9u8; KEY_LEN];
        (
            Channel::established(a, b_pub, AgreedSecret::from_bytes(secret)),
            Channel::established(b, a_pub, AgreedSecret::from_bytes(secret)),
        )
    }

    #[test]
    fn test_phases() {
        assert_eq!(Channel::default().phase(), ChannelPhase::Fresh);

        let initiated = Channel::initiated(LocalKeys::from_secret([3u8; KEY_LEN]));
        assert_eq!(initiated.phase(), ChannelPhase::Initiated);
        assert!(initiated.local_keys().is_some());
        assert!(initiated.remote_pubkey().is_none());
        assert!(!initiated.has_agreed_secret());

        let (established, _) = established_pair();
        assert_eq!(established.phase(), ChannelPhase::Established);
        assert!(established.remote_pubkey().is_some());
        assert!(established.has_agreed_secret());
    }

    #[test]
    fn test_seal_open_between_peers() {
        let (client, runtime) = established_pair();
        let client = client.as_established().unwrap();
        let runtime = runtime.as_established().unwrap();

        let sealed = client.seal(b"{\"FreeBalance\":{}}").unwrap();
        assert_eq!(runtime.open(&sealed).unwrap(), b"{\"FreeBalance\":{}}");
    }

    #[test]
    fn test_open_rejects_tampering() {
        let (client, _) = established_pair();
        let client = client.as_established().unwrap();

        let mut sealed = client.seal(b"payload").unwrap();
        let mut bytes = hex::decode(&sealed.ciphertext).unwrap();
        bytes[0] ^= 0xff;
        sealed.ciphertext = hex::encode(bytes);
        assert!(matches!(client.open(&sealed), Err(ChannelError::Open(_))));

        sealed.nonce = "00".to_string();
        assert!(matches!(client.open(&sealed), Err(ChannelError::Open(_))));
    }

    #[test]
    fn test_public_key_hex() {
        let key = LocalKeys::from_secret([4u8; KEY_LEN]).public();
        assert_eq!(PublicKey::from_hex(&key.to_hex()).unwrap(), key);
        assert_eq!(PublicKey::from_hex(&format!("0x{}", key.to_hex())).unwrap(), key);
        assert!(PublicKey::from_hex("abcd").is_err());
        assert!(PublicKey::from_hex("zz").is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let (channel, _) = established_pair();
        let rendered = format!("{:?}", channel);
        assert!(rendered.contains("redacted"));
        assert!(!rendered.contains(&hex::encode([9u8; KEY_LEN])));
    }
}
