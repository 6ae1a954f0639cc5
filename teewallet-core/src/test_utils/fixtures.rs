//! Test fixtures for channels, accounts and runtime replies

use super::mocks::MockRuntime;
use crate::config::WalletConfig;
use crate::core_account::{Account, Ed25519Keypair};
use crate::core_channel::{agree, Channel, LocalKeys, X25519ChannelCrypto, KEY_LEN};
use crate::core_runtime::RuntimeInfo;
use crate::core_wallet::WalletStore;
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_ADDRESS: &str = "5TestAccountAddress";

/// Both ends of an established channel: (client side, runtime side)
pub fn established_pair() -> (Channel, Channel) {
    let client = LocalKeys::from_secret([11u8; KEY_LEN]);
    let runtime = LocalKeys::from_secret([22u8; KEY_LEN]);
    let client_pub = client.public();
    let runtime_pub = runtime.public();

    let client_secret = agree(&client, &runtime_pub).expect("client side agreement");
    let runtime_secret = agree(&runtime, &client_pub).expect("runtime side agreement");

    (
        Channel::established(client, runtime_pub, client_secret),
        Channel::established(runtime, client_pub, runtime_secret),
    )
}

/// Account with an unlocked keypair from a fixed seed
pub fn test_account() -> Account {
    Account::new(TEST_ADDRESS, Arc::new(Ed25519Keypair::from_seed([7u8; 32])))
}

/// Account whose keypair can be locked by the caller
pub fn lockable_account() -> (Account, Arc<Ed25519Keypair>) {
    let keypair = Arc::new(Ed25519Keypair::from_seed([9u8; 32]));
    (Account::new(TEST_ADDRESS, keypair.clone()), keypair)
}

/// Runtime info advertising `keys` as the key agreement key
pub fn runtime_info_for(keys: &LocalKeys) -> RuntimeInfo {
    RuntimeInfo {
        initialized: true,
        registered: true,
        ecdh_public_key: format!("0x{}", keys.public().to_hex()),
        headernum: 100,
        blocknum: 99,
        ..Default::default()
    }
}

/// Asset entry as the runtime lists it
pub fn asset_json(id: u32, symbol: &str) -> Value {
    json!({
        "id": id,
        "metadata": {
            "symbol": symbol,
            "id": id,
            "owner": "0x00",
            "totalSupply": "1000000",
        },
        "balance": "0",
    })
}

/// Store with the default config and [`test_account`], handshake done against `runtime`
pub async fn established_store(runtime: &MockRuntime) -> WalletStore {
    let store = WalletStore::new(
        WalletConfig::default(),
        Some(test_account()),
        Arc::new(X25519ChannelCrypto::new()),
        Arc::new(runtime.connector()),
    );
    store.establish().await.expect("handshake against mock runtime");
    store
}
