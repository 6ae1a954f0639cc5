//! Query gateway - one gated, encrypted exchange with the runtime
//!
//! The gateway owns the bound runtime client. Every query passes the
//! readiness guard before the payload builder runs or any bytes leave the
//! process.

use super::errors::{WalletError, WalletResult};
use super::readiness::ReadinessGate;
use crate::config::ServiceId;
use crate::core_account::Account;
use crate::core_channel::{Channel, ChannelManager};
use crate::core_runtime::{ClientParams, RuntimeClient, RuntimeConnector};
use crate::metrics::{self, Timer};
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

type PayloadBuilder = Box<dyn FnOnce() -> Value + Send>;

/// A named query, optionally with arguments and an explicit target service
pub struct QueryRequest {
    name: String,
    payload: Option<PayloadBuilder>,
    service: Option<ServiceId>,
}

impl QueryRequest {
    /// Bare query: the request body is the name itself
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), payload: None, service: None }
    }

    /// Attach arguments; the body becomes `{ name: payload() }`
    pub fn with_payload(mut self, build: impl FnOnce() -> Value + Send + 'static) -> Self {
        self.payload = Some(Box::new(build));
        self
    }

    pub fn to_service(mut self, service: ServiceId) -> Self {
        self.service = Some(service);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn into_body(self) -> (String, Option<ServiceId>, Value) {
        let body = match self.payload {
            Some(build) => {
                let mut map = Map::with_capacity(1);
                map.insert(self.name.clone(), build());
                Value::Object(map)
            }
            None => Value::String(self.name.clone()),
        };
        (self.name, self.service, body)
    }
}

impl std::fmt::Debug for QueryRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRequest")
            .field("name", &self.name)
            .field("has_payload", &self.payload.is_some())
            .field("service", &self.service)
            .finish()
    }
}

/// Top-level field of a query result, with null treated as absent
pub fn result_field<'a>(result: &'a Value, name: &str) -> Option<&'a Value> {
    result.get(name).filter(|v| !v.is_null())
}

struct BoundClient {
    endpoint: String,
    /// Channel snapshot the client was constructed with
    channel: Arc<Channel>,
    client: Arc<dyn RuntimeClient>,
}

pub struct QueryGateway {
    channels: Arc<ChannelManager>,
    account: Option<Account>,
    connector: Arc<dyn RuntimeConnector>,
    default_service: ServiceId,
    bound: RwLock<Option<BoundClient>>,
}

impl QueryGateway {
    pub fn new(
        channels: Arc<ChannelManager>,
        account: Option<Account>,
        connector: Arc<dyn RuntimeConnector>,
        default_service: ServiceId,
    ) -> Self {
        Self { channels, account, connector, default_service, bound: RwLock::new(None) }
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn channels(&self) -> &Arc<ChannelManager> {
        &self.channels
    }

    /// Construct a runtime client for `endpoint` over the current channel
    ///
    /// Replaces any previously bound client.
    pub fn bind_client(&self, endpoint: &str) -> WalletResult<()> {
        let channel = self.channels.current();
        let phase = channel.phase();
        let client = self.connector.connect(ClientParams {
            endpoint: endpoint.to_string(),
            channel: channel.clone(),
            keypair: self.account.as_ref().map(|a| a.keypair().clone()),
        })?;

        *self.bound.write().unwrap_or_else(PoisonError::into_inner) =
            Some(BoundClient { endpoint: endpoint.to_string(), channel, client });
        info!(endpoint, channel = %phase, "Bound runtime client");
        Ok(())
    }

    /// Rebuild the bound client so it carries the current channel
    pub fn rebind(&self) -> WalletResult<bool> {
        match self.endpoint() {
            Some(endpoint) => self.bind_client(&endpoint).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn endpoint(&self) -> Option<String> {
        self.bound
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|b| b.endpoint.clone())
    }

    /// Bound client, whatever channel it was built over
    pub fn client(&self) -> Option<Arc<dyn RuntimeClient>> {
        self.bound
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|b| b.client.clone())
    }

    /// Bound client only if it was built over `channel`
    fn client_for(&self, channel: &Arc<Channel>) -> Option<Arc<dyn RuntimeClient>> {
        self.bound
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|b| Arc::ptr_eq(&b.channel, channel))
            .map(|b| b.client.clone())
    }

    /// Non-failing readiness probe; logs each failing condition
    pub fn is_ready(&self) -> bool {
        let channel = self.channels.current();
        let client_bound = self.client_for(&channel).is_some();
        ReadinessGate::new(&channel, self.account.as_ref(), client_bound).is_ready()
    }

    /// Readiness guard; returns the client to use when every condition holds
    ///
    /// A client built before the last channel swap counts as unbound.
    pub fn ensure_ready(&self) -> WalletResult<Arc<dyn RuntimeClient>> {
        let channel = self.channels.current();
        let client = self.client_for(&channel);
        ReadinessGate::new(&channel, self.account.as_ref(), client.is_some()).ensure_ready()?;
        client.ok_or(WalletError::ClientNotReady)
    }

    /// Send one query and return the decrypted result object
    pub async fn query(&self, request: QueryRequest) -> WalletResult<Value> {
        let client = self.ensure_ready()?;

        let (name, service, body) = request.into_body();
        let service_id = service.unwrap_or(self.default_service);
        debug!(query = %name, service_id, "Dispatching query");

        metrics::record_counter(metrics::QUERIES_TOTAL, 1);
        let timer = Timer::new(metrics::QUERY_DURATION_MS);
        match client.query(service_id, body).await {
            Ok(result) => {
                let elapsed_ms = timer.stop();
                debug!(query = %name, service_id, elapsed_ms, "Query completed");
                Ok(result)
            }
            Err(e) => {
                timer.stop();
                metrics::record_counter(metrics::QUERIES_FAILED, 1);
                warn!(query = %name, service_id, error = %e, "Query failed");
                Err(e.into())
            }
        }
    }
}
