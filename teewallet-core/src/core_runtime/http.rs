//! HTTP runtime client
//!
//! Wire format:
//! - `POST {endpoint}/get_info` returns [`RuntimeInfo`] as JSON.
//! - `POST {endpoint}/query` takes a [`QueryEnvelope`] and returns a
//!   [`QueryReply`] whose sealed payload opens to the JSON result.
//!
//! The sealed request is `{"request": <body>, "nonce": <hex>}`; the account
//! keypair signs the hex ciphertext so the runtime can attribute the query.

use super::client::{ClientParams, RuntimeClient, RuntimeConnector};
use super::errors::{RuntimeError, RuntimeResult};
use super::info::RuntimeInfo;
use crate::config::ServiceId;
use crate::core_account::AccountKeypair;
use crate::core_channel::{Channel, ChannelError, EstablishedChannel, SealedPayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

/// Origin block attached to every query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOrigin {
    /// Raw account id, hex
    pub account: String,
    /// Ed25519 signature over the ciphertext, hex
    pub signature: String,
}

/// Body of `POST /query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEnvelope {
    pub contract_id: ServiceId,
    /// Client's key agreement public key, hex
    pub pubkey: String,
    pub sealed: SealedPayload,
    pub origin: QueryOrigin,
}

/// Body of a successful `/query` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReply {
    pub sealed: SealedPayload,
}

/// Build the signed, sealed envelope for one query
pub fn seal_query(
    channel: &EstablishedChannel,
    keypair: &dyn AccountKeypair,
    service_id: ServiceId,
    request: &Value,
) -> RuntimeResult<QueryEnvelope> {
    let nonce: [u8; 16] = rand::random();
    let plaintext = serde_json::to_vec(&json!({
        "request": request,
        "nonce": hex::encode(nonce),
    }))?;

    let sealed = channel.seal(&plaintext)?;
    let signature = keypair.sign(sealed.ciphertext.as_bytes())?;

    Ok(QueryEnvelope {
        contract_id: service_id,
        pubkey: channel.local_public().to_hex(),
        sealed,
        origin: QueryOrigin {
            account: hex::encode(keypair.public_key()),
            signature: hex::encode(signature),
        },
    })
}

/// Open a reply and surface in-band runtime errors
pub fn open_reply(channel: &EstablishedChannel, reply: &QueryReply) -> RuntimeResult<Value> {
    let plaintext = channel.open(&reply.sealed)?;
    let value: Value = serde_json::from_slice(&plaintext)?;

    if let Some(err) = value.get("Error") {
        let message = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        return Err(RuntimeError::Remote(message));
    }
    Ok(value)
}

/// Parse `endpoint` so that relative joins append rather than replace
pub fn base_url(endpoint: &str) -> RuntimeResult<Url> {
    let mut url =
        Url::parse(endpoint).map_err(|e| RuntimeError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RuntimeError::InvalidEndpoint(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub struct HttpRuntimeClient {
    http: reqwest::Client,
    base: Url,
    channel: Arc<Channel>,
    keypair: Option<Arc<dyn AccountKeypair>>,
}

impl HttpRuntimeClient {
    pub fn new(http: reqwest::Client, params: ClientParams) -> RuntimeResult<Self> {
        Ok(Self {
            http,
            base: base_url(&params.endpoint)?,
            channel: params.channel,
            keypair: params.keypair,
        })
    }

    fn url(&self, path: &str) -> RuntimeResult<Url> {
        self.base.join(path).map_err(|e| RuntimeError::InvalidEndpoint(e.to_string()))
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RuntimeResult<reqwest::Response> {
        let url = self.url(path)?;
        trace!(%url, "POST");
        let response = self.http.post(url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RuntimeError::Status { status: status.as_u16(), body });
        }
        Ok(response)
    }
}

#[async_trait]
impl RuntimeClient for HttpRuntimeClient {
    async fn info(&self) -> RuntimeResult<RuntimeInfo> {
        let response = self.post("get_info", &json!({})).await?;
        Ok(response.json().await?)
    }

    async fn query(&self, service_id: ServiceId, request: Value) -> RuntimeResult<Value> {
        let channel = self.channel.as_established().ok_or(ChannelError::NotEstablished)?;
        let keypair = self.keypair.as_deref().ok_or(RuntimeError::MissingKeypair)?;

        let envelope = seal_query(channel, keypair, service_id, &request)?;
        debug!(service_id, "Sending encrypted query");

        let reply: QueryReply = self.post("query", &envelope).await?.json().await?;
        open_reply(channel, &reply)
    }
}

/// Connector producing [`HttpRuntimeClient`]s that share one connection pool
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    http: reqwest::Client,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl RuntimeConnector for HttpConnector {
    fn connect(&self, params: ClientParams) -> RuntimeResult<Arc<dyn RuntimeClient>> {
        Ok(Arc::new(HttpRuntimeClient::new(self.http.clone(), params)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_account::Ed25519Keypair;
    use crate::test_utils::established_pair;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    #[test]
    fn test_base_url_keeps_path() {
        let url = base_url("http://127.0.0.1:8000/runtime").unwrap();
        assert_eq!(url.join("query").unwrap().as_str(), "http://127.0.0.1:8000/runtime/query");

        let url = base_url("https://tee.example").unwrap();
        assert_eq!(url.join("get_info").unwrap().as_str(), "https://tee.example/get_info");

        assert!(base_url("ws://tee.example").is_err());
        assert!(base_url("tee.example").is_err());
    }

    #[test]
    fn test_sealed_query_opens_on_runtime_side() {
        let (client, runtime) = established_pair();
        let keypair = Ed25519Keypair::from_seed([3u8; 32]);
        let request = json!({"FreeBalance": {"account": "0x01"}});

        let envelope =
            seal_query(client.as_established().unwrap(), &keypair, 2, &request).unwrap();
        assert_eq!(envelope.contract_id, 2);

        let opened = runtime.as_established().unwrap().open(&envelope.sealed).unwrap();
        let opened: Value = serde_json::from_slice(&opened).unwrap();
        assert_eq!(opened["request"], request);

        let vk = VerifyingKey::from_bytes(&keypair.public_key()).unwrap();
        let sig: [u8; 64] = hex::decode(&envelope.origin.signature).unwrap().try_into().unwrap();
        assert!(vk
            .verify(envelope.sealed.ciphertext.as_bytes(), &Signature::from_bytes(&sig))
            .is_ok());
    }

    #[test]
    fn test_locked_keypair_cannot_seal() {
        let (client, _) = established_pair();
        let keypair = Ed25519Keypair::generate();
        keypair.lock();

        let err = seal_query(client.as_established().unwrap(), &keypair, 1, &json!("Info"))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Signing(_)));
    }

    #[test]
    fn test_open_reply_surfaces_remote_error() {
        let (client, runtime) = established_pair();
        let sealed = runtime
            .as_established()
            .unwrap()
            .seal(br#"{"Error":"asset not found"}"#)
            .unwrap();

        let err = open_reply(client.as_established().unwrap(), &QueryReply { sealed }).unwrap_err();
        assert!(matches!(err, RuntimeError::Remote(ref m) if m == "asset not found"));
    }

    #[tokio::test]
    async fn test_query_requires_established_channel() {
        let client = HttpConnector::new()
            .connect(ClientParams {
                endpoint: "http://127.0.0.1:9".to_string(),
                channel: Arc::new(Channel::Fresh),
                keypair: Some(Arc::new(Ed25519Keypair::generate())),
            })
            .unwrap();

        let err = client.query(1, json!("Ping")).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Channel(ChannelError::NotEstablished)));
    }
}
