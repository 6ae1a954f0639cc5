//! Wallet store - refresh orchestration and local state
//!
//! # Responsibilities
//!
//! - **Handshake**: initiate the channel, probe runtime info, join
//! - **Refresh**: balance and asset queries applied to local state
//! - **Network reset**: clear info, latency and error when switching endpoints
//!
//! Refreshes query first and take the state lock only to apply a successful
//! result, so a failure never leaves partially written state behind.

use super::errors::{WalletError, WalletResult};
use super::gateway::{result_field, QueryGateway, QueryRequest};
use super::latency::LatencyTracker;
use super::types::{Asset, BalanceUpdate, LastError, MainAsset};
use crate::config::WalletConfig;
use crate::core_account::Account;
use crate::core_channel::{ChannelCrypto, ChannelManager, ChannelPhase};
use crate::core_runtime::{RuntimeConnector, RuntimeError, RuntimeInfo};
use crate::metrics::{self, Timer};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub const FREE_BALANCE: &str = "FreeBalance";
pub const LIST_ASSETS: &str = "ListAssets";

#[derive(Debug, Default)]
struct WalletState {
    main_asset: Option<MainAsset>,
    assets: Vec<Asset>,
    latency: LatencyTracker,
    info: Option<RuntimeInfo>,
    error: Option<LastError>,
}

/// Owned view of the wallet for UI readers
#[derive(Debug, Clone, Serialize)]
pub struct WalletSnapshot {
    pub main_asset: Option<MainAsset>,
    pub assets: Vec<Asset>,
    pub asset_symbols: Vec<String>,
    pub latency_ms: u64,
    pub info: Option<RuntimeInfo>,
    pub error: Option<LastError>,
    pub channel: ChannelPhase,
    pub should_join: bool,
}

pub struct WalletStore {
    config: WalletConfig,
    channels: Arc<ChannelManager>,
    gateway: QueryGateway,
    state: RwLock<WalletState>,
}

impl WalletStore {
    /// Create a store for `account` using the given channel and client backends
    pub fn new(
        config: WalletConfig,
        account: Option<Account>,
        crypto: Arc<dyn ChannelCrypto>,
        connector: Arc<dyn RuntimeConnector>,
    ) -> Self {
        let channels = Arc::new(ChannelManager::new(crypto));
        let gateway = QueryGateway::new(
            channels.clone(),
            account,
            connector,
            config.services.default_service,
        );
        info!(
            endpoint = %config.runtime.endpoint,
            has_account = gateway.account().is_some(),
            "Creating WalletStore"
        );

        Self { config, channels, gateway, state: RwLock::new(WalletState::default()) }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn channels(&self) -> &ChannelManager {
        &self.channels
    }

    pub fn gateway(&self) -> &QueryGateway {
        &self.gateway
    }

    pub fn runtime_endpoint(&self) -> &str {
        &self.config.runtime.endpoint
    }

    pub fn account(&self) -> Option<&Account> {
        self.gateway.account()
    }

    /// Hex account id used in balance queries
    pub fn account_id_hex(&self) -> Option<String> {
        self.account().map(Account::address_hex)
    }

    // ---- handshake ----------------------------------------------------

    pub async fn initiate_channel(&self) -> WalletResult<()> {
        self.channels.initiate().await?;
        Ok(())
    }

    /// Join against the ECDH key from the last runtime info
    ///
    /// A bound client is rebuilt so it carries the established channel.
    pub async fn join_channel(&self) -> WalletResult<()> {
        let remote = {
            let state = self.state.read().await;
            let info = state.info.as_ref().ok_or(WalletError::MissingRuntimeInfo)?;
            info.ecdh_public_key()?
        };

        self.channels.join(remote).await?;
        self.gateway.rebind()?;
        Ok(())
    }

    pub fn bind_client(&self, endpoint: &str) -> WalletResult<()> {
        self.gateway.bind_client(endpoint)
    }

    /// Bind a client to the configured endpoint
    pub fn bind_default_client(&self) -> WalletResult<()> {
        self.gateway.bind_client(&self.config.runtime.endpoint)
    }

    /// Probe runtime info and fold the round trip into the latency estimate
    pub async fn refresh_info(&self) -> WalletResult<RuntimeInfo> {
        let client = self.gateway.client().ok_or(WalletError::ClientNotReady)?;

        let timer = Timer::new(metrics::QUERY_DURATION_MS);
        let info = client.info().await?;
        let elapsed_ms = timer.stop();

        let latency = {
            let mut state = self.state.write().await;
            state.info = Some(info.clone());
            state.latency.record(elapsed_ms)
        };
        metrics::record_gauge(metrics::LATENCY_MS, latency as f64);
        debug!(blocknum = info.blocknum, elapsed_ms, latency_ms = latency, "Runtime info refreshed");

        Ok(info)
    }

    /// Full handshake: initiate, bind, probe info, join
    pub async fn establish(&self) -> WalletResult<()> {
        self.initiate_channel().await?;
        self.bind_default_client()?;
        self.refresh_info().await?;
        self.join_channel().await?;
        info!(endpoint = %self.config.runtime.endpoint, "Secure channel established");
        Ok(())
    }

    // ---- readiness ----------------------------------------------------

    pub fn is_ready(&self) -> bool {
        self.gateway.is_ready()
    }

    pub fn ensure_ready(&self) -> WalletResult<()> {
        self.gateway.ensure_ready().map(|_| ())
    }

    pub async fn query(&self, request: QueryRequest) -> WalletResult<serde_json::Value> {
        self.gateway.query(request).await
    }

    // ---- refresh ------------------------------------------------------

    /// Query the free balance and merge it into the main asset
    pub async fn refresh_balance(&self) -> WalletResult<MainAsset> {
        // Readiness first: with no account there is no id to build a payload from.
        self.gateway.ensure_ready()?;
        let account = self.account_id_hex().ok_or(WalletError::AccountNotReady)?;

        let result = self
            .gateway
            .query(
                QueryRequest::named(FREE_BALANCE)
                    .with_payload(move || json!({ "account": account }))
                    .to_service(self.config.services.balance_service),
            )
            .await?;

        let update = BalanceUpdate::from_result(result_field(&result, FREE_BALANCE));
        let mut state = self.state.write().await;
        let merged = MainAsset::merge(state.main_asset.as_ref(), update);
        state.main_asset = Some(merged.clone());
        debug!(balance = %merged.balance, "Main asset refreshed");

        Ok(merged)
    }

    /// Query the asset list and store it newest first
    pub async fn refresh_assets(&self) -> WalletResult<Vec<Asset>> {
        let result = self
            .gateway
            .query(
                QueryRequest::named(LIST_ASSETS)
                    .with_payload(|| json!({ "availableOnly": false }))
                    .to_service(self.config.services.assets_service),
            )
            .await?;

        let mut assets: Vec<Asset> = match result_field(&result, LIST_ASSETS)
            .and_then(|list| list.get("assets"))
            .filter(|assets| !assets.is_null())
        {
            Some(raw) => serde_json::from_value(raw.clone()).map_err(RuntimeError::from)?,
            None => Vec::new(),
        };
        // Runtime lists in creation order.
        assets.reverse();

        metrics::record_gauge(metrics::ASSETS_COUNT, assets.len() as f64);
        self.state.write().await.assets = assets.clone();
        debug!(count = assets.len(), "Assets refreshed");

        Ok(assets)
    }

    /// Balance then assets, strictly in sequence; the first failure aborts
    pub async fn refresh_all(&self) -> WalletResult<()> {
        self.refresh_balance().await?;
        self.refresh_assets().await?;
        Ok(())
    }

    // ---- local state --------------------------------------------------

    /// Forget per-network state; channel, account and balances are kept
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.error = None;
        state.latency.reset();
        state.info = None;
        info!("Network state reset");
    }

    pub async fn record_latency(&self, sample_ms: u64) -> u64 {
        let latency = self.state.write().await.latency.record(sample_ms);
        metrics::record_gauge(metrics::LATENCY_MS, latency as f64);
        latency
    }

    pub async fn set_info(&self, info: RuntimeInfo) {
        self.state.write().await.info = Some(info);
    }

    pub async fn set_error(&self, message: impl Into<String>) {
        self.state.write().await.error = Some(LastError::new(message));
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    pub async fn set_main_asset(&self, main_asset: MainAsset) {
        self.state.write().await.main_asset = Some(main_asset);
    }

    pub async fn main_asset(&self) -> Option<MainAsset> {
        self.state.read().await.main_asset.clone()
    }

    pub async fn assets(&self) -> Vec<Asset> {
        self.state.read().await.assets.clone()
    }

    /// Symbols of the listed assets followed by the native symbol
    pub async fn asset_symbols(&self) -> Vec<String> {
        let state = self.state.read().await;
        self.symbols_of(&state.assets)
    }

    fn symbols_of(&self, assets: &[Asset]) -> Vec<String> {
        assets
            .iter()
            .map(|a| a.symbol().to_string())
            .chain(std::iter::once(self.config.assets.native_symbol.clone()))
            .collect()
    }

    pub async fn latency(&self) -> u64 {
        self.state.read().await.latency.estimate()
    }

    pub async fn info(&self) -> Option<RuntimeInfo> {
        self.state.read().await.info.clone()
    }

    pub async fn last_error(&self) -> Option<LastError> {
        self.state.read().await.error.clone()
    }

    pub async fn snapshot(&self) -> WalletSnapshot {
        let state = self.state.read().await;
        WalletSnapshot {
            main_asset: state.main_asset.clone(),
            assets: state.assets.clone(),
            asset_symbols: self.symbols_of(&state.assets),
            latency_ms: state.latency.estimate(),
            info: state.info.clone(),
            error: state.error.clone(),
            channel: self.channels.current().phase(),
            should_join: self.channels.should_join(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_channel::X25519ChannelCrypto;
    use crate::test_utils::{asset_json, established_store, test_account, MockRuntime};
    use serde_json::json;

    #[tokio::test]
    async fn test_refresh_balance_merges() {
        let runtime = MockRuntime::new();
        let store = established_store(&runtime).await;
        store
            .set_main_asset(MainAsset {
                balance: "1".to_string(),
                symbol: Some("PHA".to_string()),
                decimals: Some(12),
            })
            .await;

        runtime.respond(2, json!({"FreeBalance": {"balance": "42"}}));
        let merged = store.refresh_balance().await.unwrap();

        assert_eq!(merged.balance, "42");
        assert_eq!(merged.symbol.as_deref(), Some("PHA"));
        assert_eq!(merged.decimals, Some(12));

        let (service, body) = runtime.last_request().unwrap();
        assert_eq!(service, 2);
        assert_eq!(
            body,
            json!({"FreeBalance": {"account": store.account_id_hex().unwrap()}})
        );
    }

    #[tokio::test]
    async fn test_refresh_balance_missing_field_defaults_to_zero() {
        let runtime = MockRuntime::new();
        let store = established_store(&runtime).await;
        store
            .set_main_asset(MainAsset { balance: "9".to_string(), symbol: Some("PHA".to_string()), decimals: None })
            .await;

        runtime.respond(2, json!({}));
        store.refresh_balance().await.unwrap();

        let main = store.main_asset().await.unwrap();
        assert_eq!(main.balance, "0");
        assert_eq!(main.symbol.as_deref(), Some("PHA"));
    }

    #[tokio::test]
    async fn test_refresh_assets_reverses() {
        let runtime = MockRuntime::new();
        let store = established_store(&runtime).await;

        runtime.respond(
            3,
            json!({"ListAssets": {"assets": [asset_json(1, "A"), asset_json(2, "B"), asset_json(3, "C")]}}),
        );
        let assets = store.refresh_assets().await.unwrap();
        let symbols: Vec<_> = assets.iter().map(Asset::symbol).collect();
        assert_eq!(symbols, vec!["C", "B", "A"]);

        let (service, body) = runtime.last_request().unwrap();
        assert_eq!(service, 3);
        assert_eq!(body, json!({"ListAssets": {"availableOnly": false}}));
    }

    #[tokio::test]
    async fn test_refresh_assets_absent_list() {
        let runtime = MockRuntime::new();
        let store = established_store(&runtime).await;

        runtime.respond(3, json!({"ListAssets": {"assets": [asset_json(1, "A")]}}));
        store.refresh_assets().await.unwrap();
        assert_eq!(store.assets().await.len(), 1);

        runtime.respond(3, json!({"ListAssets": null}));
        assert!(store.refresh_assets().await.unwrap().is_empty());
        assert!(store.assets().await.is_empty());

        runtime.respond(3, json!({"ListAssets": {"assets": []}}));
        assert!(store.refresh_assets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_asset_list_keeps_prior_state() {
        let runtime = MockRuntime::new();
        let store = established_store(&runtime).await;

        runtime.respond(3, json!({"ListAssets": {"assets": [asset_json(1, "A")]}}));
        store.refresh_assets().await.unwrap();

        runtime.respond(3, json!({"ListAssets": {"assets": [{"metadata": 5}]}}));
        let err = store.refresh_assets().await.unwrap_err();
        assert!(matches!(err, WalletError::Query(RuntimeError::Decode(_))));
        assert_eq!(store.asset_symbols().await, vec!["A", "PHA"]);
    }

    #[tokio::test]
    async fn test_refresh_assets_tolerates_unread_field_shapes() {
        let runtime = MockRuntime::new();
        let store = established_store(&runtime).await;

        runtime.respond(
            3,
            json!({"ListAssets": {"assets": [
                asset_json(1, "A"),
                {"id": "7", "metadata": {"symbol": "B", "id": null, "owner": 42}},
            ]}}),
        );
        store.refresh_assets().await.unwrap();
        assert_eq!(store.asset_symbols().await, vec!["B", "A", "PHA"]);
    }

    #[tokio::test]
    async fn test_asset_symbols_end_with_native() {
        let runtime = MockRuntime::new();
        let store = established_store(&runtime).await;
        assert_eq!(store.asset_symbols().await, vec!["PHA"]);

        runtime.respond(3, json!({"ListAssets": {"assets": [asset_json(1, "X")]}}));
        store.refresh_assets().await.unwrap();
        assert_eq!(store.asset_symbols().await, vec!["X", "PHA"]);
    }

    #[tokio::test]
    async fn test_refresh_all_stops_at_balance_failure() {
        let runtime = MockRuntime::new();
        let store = established_store(&runtime).await;

        runtime.respond(3, json!({"ListAssets": {"assets": [asset_json(1, "A")]}}));
        store.refresh_assets().await.unwrap();
        let calls_before = runtime.query_count();

        runtime.fail(2, RuntimeError::Transport("connection reset".to_string()));
        runtime.respond(3, json!({"ListAssets": {"assets": [asset_json(2, "B")]}}));
        let err = store.refresh_all().await.unwrap_err();

        assert!(matches!(err, WalletError::Query(RuntimeError::Transport(_))));
        assert_eq!(runtime.query_count(), calls_before + 1);
        assert_eq!(store.asset_symbols().await, vec!["A", "PHA"]);
    }

    #[tokio::test]
    async fn test_refresh_all_propagates_assets_failure() {
        let runtime = MockRuntime::new();
        let store = established_store(&runtime).await;

        runtime.respond(2, json!({"FreeBalance": {"balance": "3"}}));
        runtime.fail(3, RuntimeError::Remote("assets unavailable".to_string()));

        assert!(store.refresh_all().await.is_err());
        assert_eq!(store.main_asset().await.unwrap().balance, "3");
    }

    #[tokio::test]
    async fn test_reset_keeps_channel_and_balances() {
        let runtime = MockRuntime::new();
        let store = established_store(&runtime).await;

        runtime.respond(2, json!({"FreeBalance": {"balance": "5"}}));
        runtime.respond(3, json!({"ListAssets": {"assets": [asset_json(1, "A")]}}));
        store.refresh_all().await.unwrap();
        store.set_error("timeout").await;
        store.record_latency(120).await;

        store.reset().await;

        assert!(store.last_error().await.is_none());
        assert_eq!(store.latency().await, 0);
        assert!(store.info().await.is_none());
        assert_eq!(store.channels().current().phase(), ChannelPhase::Established);
        assert!(store.account().is_some());
        assert_eq!(store.main_asset().await.unwrap().balance, "5");
        assert_eq!(store.assets().await.len(), 1);
    }

    #[tokio::test]
    async fn test_record_latency() {
        let store = WalletStore::new(
            WalletConfig::default(),
            Some(test_account()),
            Arc::new(X25519ChannelCrypto::new()),
            Arc::new(MockRuntime::new().connector()),
        );
        assert_eq!(store.record_latency(100).await, 100);
        assert_eq!(store.record_latency(50).await, 90);
        assert_eq!(store.latency().await, 90);
    }

    #[tokio::test]
    async fn test_join_requires_runtime_info() {
        let store = WalletStore::new(
            WalletConfig::default(),
            Some(test_account()),
            Arc::new(X25519ChannelCrypto::new()),
            Arc::new(MockRuntime::new().connector()),
        );
        store.initiate_channel().await.unwrap();

        let err = store.join_channel().await.unwrap_err();
        assert!(matches!(err, WalletError::MissingRuntimeInfo));
        assert!(store.channels().should_join());
    }

    #[tokio::test]
    async fn test_refresh_info_requires_client() {
        let store = WalletStore::new(
            WalletConfig::default(),
            Some(test_account()),
            Arc::new(X25519ChannelCrypto::new()),
            Arc::new(MockRuntime::new().connector()),
        );
        assert!(matches!(store.refresh_info().await, Err(WalletError::ClientNotReady)));
    }

    #[tokio::test]
    async fn test_snapshot() {
        let runtime = MockRuntime::new();
        let store = established_store(&runtime).await;
        runtime.respond(3, json!({"ListAssets": {"assets": [asset_json(1, "A")]}}));
        store.refresh_assets().await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.channel, ChannelPhase::Established);
        assert!(!snapshot.should_join);
        assert_eq!(snapshot.asset_symbols, vec!["A", "PHA"]);
        assert!(snapshot.info.is_some());
    }
}
