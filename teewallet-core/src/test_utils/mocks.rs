//! Mock channel crypto and mock runtime

use crate::config::ServiceId;
use crate::core_channel::{
    Channel, ChannelCrypto, ChannelError, ChannelResult, LocalKeys, PublicKey, X25519ChannelCrypto,
    KEY_LEN,
};
use crate::core_runtime::{
    ClientParams, RuntimeClient, RuntimeConnector, RuntimeError, RuntimeInfo, RuntimeResult,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::fixtures::runtime_info_for;

/// Channel crypto that fails one of the two handshake steps
#[derive(Debug, Clone, Copy)]
pub struct FailingChannelCrypto {
    fail_initiate: bool,
    inner: X25519ChannelCrypto,
}

impl FailingChannelCrypto {
    pub fn on_initiate() -> Self {
        Self { fail_initiate: true, inner: X25519ChannelCrypto::new() }
    }

    /// Initiation succeeds, joining fails
    pub fn on_join() -> Self {
        Self { fail_initiate: false, inner: X25519ChannelCrypto::new() }
    }
}

#[async_trait]
impl ChannelCrypto for FailingChannelCrypto {
    async fn new_channel(&self) -> ChannelResult<Channel> {
        if self.fail_initiate {
            return Err(ChannelError::Primitive("injected initiate failure".to_string()));
        }
        self.inner.new_channel().await
    }

    async fn join_channel(&self, _channel: &Channel, _remote: PublicKey) -> ChannelResult<Channel> {
        Err(ChannelError::Primitive("injected join failure".to_string()))
    }
}

#[derive(Default)]
struct MockState {
    info: Option<RuntimeResult<RuntimeInfo>>,
    responses: HashMap<ServiceId, VecDeque<RuntimeResult<Value>>>,
    requests: Vec<(ServiceId, Value)>,
}

struct MockInner {
    keys: LocalKeys,
    state: Mutex<MockState>,
    queries: AtomicUsize,
    connects: AtomicUsize,
}

/// In-memory runtime with scripted replies per service
///
/// Replies are queued per service and consumed in order. A query to a
/// service with an empty queue fails with [`RuntimeError::Remote`].
#[derive(Clone)]
pub struct MockRuntime {
    inner: Arc<MockInner>,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockInner {
                keys: LocalKeys::from_secret([33u8; KEY_LEN]),
                state: Mutex::new(MockState::default()),
                queries: AtomicUsize::new(0),
                connects: AtomicUsize::new(0),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn connector(&self) -> MockConnector {
        MockConnector { runtime: self.clone() }
    }

    /// The runtime's key agreement key
    pub fn ecdh_public_key(&self) -> PublicKey {
        self.inner.keys.public()
    }

    /// Info reply; defaults to [`runtime_info_for`] this runtime's keys
    pub fn set_info(&self, info: RuntimeResult<RuntimeInfo>) {
        self.state().info = Some(info);
    }

    pub fn respond(&self, service: ServiceId, result: Value) {
        self.state().responses.entry(service).or_default().push_back(Ok(result));
    }

    pub fn fail(&self, service: ServiceId, error: RuntimeError) {
        self.state().responses.entry(service).or_default().push_back(Err(error));
    }

    /// Queries that reached the runtime
    pub fn query_count(&self) -> usize {
        self.inner.queries.load(Ordering::SeqCst)
    }

    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(ServiceId, Value)> {
        self.state().requests.clone()
    }

    pub fn last_request(&self) -> Option<(ServiceId, Value)> {
        self.state().requests.last().cloned()
    }
}

/// Connector handing out clients bound to one [`MockRuntime`]
#[derive(Clone)]
pub struct MockConnector {
    runtime: MockRuntime,
}

impl RuntimeConnector for MockConnector {
    fn connect(&self, params: ClientParams) -> RuntimeResult<Arc<dyn RuntimeClient>> {
        self.runtime.inner.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockClient { runtime: self.runtime.clone(), channel: params.channel }))
    }
}

/// Client view of a [`MockRuntime`]; queries need the channel it was built with
pub struct MockClient {
    runtime: MockRuntime,
    channel: Arc<Channel>,
}

#[async_trait]
impl RuntimeClient for MockClient {
    async fn info(&self) -> RuntimeResult<RuntimeInfo> {
        let mut state = self.runtime.state();
        match state.info.take() {
            Some(Ok(info)) => {
                state.info = Some(Ok(info.clone()));
                Ok(info)
            }
            // Scripted errors fire once.
            Some(Err(e)) => Err(e),
            None => Ok(runtime_info_for(&self.runtime.inner.keys)),
        }
    }

    async fn query(&self, service_id: ServiceId, request: Value) -> RuntimeResult<Value> {
        if !self.channel.is_established() {
            return Err(ChannelError::NotEstablished.into());
        }

        self.runtime.inner.queries.fetch_add(1, Ordering::SeqCst);
        let mut state = self.runtime.state();
        state.requests.push((service_id, request));
        state
            .responses
            .get_mut(&service_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(RuntimeError::Remote(format!("no scripted reply for service {service_id}")))
            })
    }
}
