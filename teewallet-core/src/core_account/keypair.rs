//! Account keypair with lock state
//!
//! The keystore that owns the real signing key is external; the wallet only
//! needs to know whether the keypair is locked and to have it sign query
//! envelopes. [`Ed25519Keypair`] is the in-process implementation used by
//! the CLI and tests.

use ed25519_dalek::{Signer, SigningKey};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeypairError {
    #[error("Keypair is locked")]
    Locked,

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),
}

/// Account keypair as seen by the wallet core
pub trait AccountKeypair: Send + Sync {
    /// Raw 32-byte account id (the public key)
    fn public_key(&self) -> [u8; 32];

    fn is_locked(&self) -> bool;

    /// Sign `msg`; fails while locked
    fn sign(&self, msg: &[u8]) -> Result<[u8; 64], KeypairError>;
}

/// Ed25519 keypair that can be locked and unlocked in place
pub struct Ed25519Keypair {
    signing_key: SigningKey,
    locked: AtomicBool,
}

impl Ed25519Keypair {
    /// Build an unlocked keypair from a 32-byte seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { signing_key: SigningKey::from_bytes(&seed), locked: AtomicBool::new(false) }
    }

    /// Parse a hex seed (optionally `0x`-prefixed)
    pub fn from_seed_hex(seed: &str) -> Result<Self, KeypairError> {
        let raw = Zeroizing::new(
            hex::decode(seed.strip_prefix("0x").unwrap_or(seed))
                .map_err(|e| KeypairError::InvalidSeed(e.to_string()))?,
        );
        let seed: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| KeypairError::InvalidSeed(format!("expected 32 bytes, got {}", raw.len())))?;
        Ok(Self::from_seed(seed))
    }

    pub fn generate() -> Self {
        let seed = Zeroizing::new(rand::random::<[u8; 32]>());
        Self::from_seed(*seed)
    }

    pub fn lock(&self) {
        self.locked.store(true, Ordering::Release);
    }

    pub fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

impl AccountKeypair for Ed25519Keypair {
    fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    fn sign(&self, msg: &[u8]) -> Result<[u8; 64], KeypairError> {
        if self.is_locked() {
            return Err(KeypairError::Locked);
        }
        Ok(self.signing_key.sign(msg).to_bytes())
    }
}

impl fmt::Debug for Ed25519Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Keypair")
            .field("public", &hex::encode(self.public_key()))
            .field("locked", &self.is_locked())
            .finish()
    }
}
