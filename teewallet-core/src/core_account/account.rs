//! Account bound to the wallet
//!
//! Address encoding (human-readable <-> raw id) belongs to the keystore; an
//! `Account` simply carries both forms.

use super::keypair::AccountKeypair;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Account {
    address: String,
    keypair: Arc<dyn AccountKeypair>,
}

impl Account {
    pub fn new(address: impl Into<String>, keypair: Arc<dyn AccountKeypair>) -> Self {
        Self { address: address.into(), keypair }
    }

    /// Human-readable address as supplied by the keystore
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Raw account id
    pub fn account_id(&self) -> [u8; 32] {
        self.keypair.public_key()
    }

    /// `0x`-prefixed hex of the raw account id
    pub fn address_hex(&self) -> String {
        format!("0x{}", hex::encode(self.account_id()))
    }

    pub fn keypair(&self) -> &Arc<dyn AccountKeypair> {
        &self.keypair
    }

    pub fn is_locked(&self) -> bool {
        self.keypair.is_locked()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("locked", &self.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_account::Ed25519Keypair;

    #[test]
    fn test_address_hex() {
        let kp = Arc::new(Ed25519Keypair::from_seed([1u8; 32]));
        let expected = format!("0x{}", hex::encode(kp.public_key()));
        let account = Account::new("45R2pfjQUW2s9PQRHU48HQKLKHVMaDja7N3wpBtmF28UYDs2", kp);

        assert_eq!(account.address_hex(), expected);
        assert_eq!(account.address_hex().len(), 66);
    }

    #[test]
    fn test_lock_state_follows_keypair() {
        let kp = Arc::new(Ed25519Keypair::generate());
        let account = Account::new("alice", kp.clone());
        assert!(!account.is_locked());

        kp.lock();
        assert!(account.is_locked());
    }
}
