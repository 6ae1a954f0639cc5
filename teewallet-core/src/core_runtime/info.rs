//! Runtime metadata returned by the info endpoint

use crate::core_channel::{ChannelResult, PublicKey};
use serde::{Deserialize, Serialize};

/// Status and identity of the remote runtime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeInfo {
    /// Runtime finished its own bootstrap
    pub initialized: bool,

    /// Runtime is registered on chain
    pub registered: bool,

    /// Identity key of the runtime, hex
    pub public_key: String,

    /// Key agreement key the client joins against, hex
    pub ecdh_public_key: String,

    /// Latest synced header number
    pub headernum: u64,

    /// Latest processed block number
    pub blocknum: u64,

    pub state_root: String,

    pub dev_mode: bool,

    pub pending_messages: u64,
}

impl RuntimeInfo {
    /// Parsed key agreement key
    pub fn ecdh_public_key(&self) -> ChannelResult<PublicKey> {
        PublicKey::from_hex(&self.ecdh_public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_channel::{LocalKeys, KEY_LEN};

    #[test]
    fn test_decode_partial_info() {
        let key = LocalKeys::from_secret([8u8; KEY_LEN]).public();
        let raw = format!(
            r#"{{"initialized":true,"ecdh_public_key":"0x{}","blocknum":12,"extra":"ignored"}}"#,
            key.to_hex()
        );
        let info: RuntimeInfo = serde_json::from_str(&raw).unwrap();

        assert!(info.initialized);
        assert!(!info.registered);
        assert_eq!(info.blocknum, 12);
        assert_eq!(info.ecdh_public_key().unwrap(), key);
    }

    #[test]
    fn test_missing_ecdh_key_is_an_error() {
        assert!(RuntimeInfo::default().ecdh_public_key().is_err());
    }
}
