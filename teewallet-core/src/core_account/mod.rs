//! Account and keypair access for the wallet

pub mod account;
pub mod keypair;

pub use account::Account;
pub use keypair::{AccountKeypair, Ed25519Keypair, KeypairError};
