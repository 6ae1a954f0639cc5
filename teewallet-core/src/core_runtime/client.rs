//! RuntimeClient trait - encrypted request/response with the runtime
//!
//! The client owns transport, encryption under the channel secret and
//! decryption of responses. The wallet constructs clients through a
//! [`RuntimeConnector`] so tests can substitute an in-memory runtime.

use super::errors::RuntimeResult;
use super::info::RuntimeInfo;
use crate::config::ServiceId;
use crate::core_account::AccountKeypair;
use crate::core_channel::Channel;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Fetch runtime metadata; does not need an established channel
    async fn info(&self) -> RuntimeResult<RuntimeInfo>;

    /// Send `request` to `service_id` and return the decrypted, parsed response
    async fn query(&self, service_id: ServiceId, request: Value) -> RuntimeResult<Value>;
}

/// Everything a runtime client is constructed from
#[derive(Clone)]
pub struct ClientParams {
    pub endpoint: String,
    pub channel: Arc<Channel>,
    pub keypair: Option<Arc<dyn AccountKeypair>>,
}

impl std::fmt::Debug for ClientParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientParams")
            .field("endpoint", &self.endpoint)
            .field("channel", &self.channel.phase())
            .field("has_keypair", &self.keypair.is_some())
            .finish()
    }
}

/// Factory for runtime clients
pub trait RuntimeConnector: Send + Sync {
    fn connect(&self, params: ClientParams) -> RuntimeResult<Arc<dyn RuntimeClient>>;
}
