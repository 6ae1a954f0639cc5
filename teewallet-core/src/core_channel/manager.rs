//! Channel Manager - drives the two-step key agreement
//!
//! `initiate` generates local key material, `join` completes agreement with
//! the runtime's public key. Both replace the current channel as a whole
//! `Arc<Channel>`, so readers see either the old or the new channel, never a
//! partially updated one.

use super::channel::{Channel, PublicKey};
use super::crypto::ChannelCrypto;
use super::errors::{ChannelError, ChannelResult};
use crate::metrics;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct ChannelManager {
    crypto: Arc<dyn ChannelCrypto>,

    /// Current channel, swapped wholesale
    current: RwLock<Arc<Channel>>,

    /// True between a successful `initiate` and a successful `join`
    should_join: AtomicBool,

    /// Serializes handshake steps so `join` never builds on a stale channel
    handshake: Mutex<()>,
}

impl ChannelManager {
    pub fn new(crypto: Arc<dyn ChannelCrypto>) -> Self {
        Self {
            crypto,
            current: RwLock::new(Arc::new(Channel::Fresh)),
            should_join: AtomicBool::new(false),
            handshake: Mutex::new(()),
        }
    }

    /// Snapshot of the current channel
    pub fn current(&self) -> Arc<Channel> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Whether a channel has been initiated and is waiting for `join`
    pub fn should_join(&self) -> bool {
        self.should_join.load(Ordering::Acquire)
    }

    fn replace(&self, channel: Channel) -> Arc<Channel> {
        let channel = Arc::new(channel);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = channel.clone();
        channel
    }

    /// Start a handshake with fresh local key material
    ///
    /// Any previous channel, initiated or established, is discarded.
    pub async fn initiate(&self) -> ChannelResult<Arc<Channel>> {
        let _guard = self.handshake.lock().await;

        let channel = match self.crypto.new_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                metrics::handshake_step("initiate", "error");
                warn!(error = %e, "Channel initiation failed");
                return Err(e);
            }
        };

        let local = channel
            .local_keys()
            .map(|keys| keys.public())
            .ok_or_else(|| ChannelError::Primitive("new channel carries no local key".to_string()))?;

        let channel = self.replace(channel);
        self.should_join.store(true, Ordering::Release);
        metrics::handshake_step("initiate", "ok");
        info!(local_pubkey = %local, "Initiated secure channel");

        Ok(channel)
    }

    /// Complete key agreement with the remote runtime
    pub async fn join(&self, remote_pubkey: PublicKey) -> ChannelResult<Arc<Channel>> {
        let _guard = self.handshake.lock().await;
        let current = self.current();

        if current.local_keys().is_none() {
            metrics::handshake_step("join", "error");
            return Err(ChannelError::NotInitiated);
        }

        let joined = match self.crypto.join_channel(&current, remote_pubkey).await {
            Ok(joined) => joined,
            Err(e) => {
                metrics::handshake_step("join", "error");
                warn!(error = %e, remote_pubkey = %remote_pubkey, "Channel join failed");
                return Err(e);
            }
        };

        if !joined.is_established() {
            metrics::handshake_step("join", "error");
            return Err(ChannelError::Primitive(format!(
                "join produced a {} channel",
                joined.phase()
            )));
        }

        let channel = self.replace(joined);
        self.should_join.store(false, Ordering::Release);
        metrics::handshake_step("join", "ok");
        info!(remote_pubkey = %remote_pubkey, "Joined secure channel");
        debug!(phase = %channel.phase(), "Channel state after join");

        Ok(channel)
    }
}

impl std::fmt::Debug for ChannelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelManager")
            .field("phase", &self.current().phase())
            .field("should_join", &self.should_join())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_channel::{ChannelPhase, LocalKeys, X25519ChannelCrypto, KEY_LEN};
    use crate::test_utils::FailingChannelCrypto;

    fn manager() -> ChannelManager {
        ChannelManager::new(Arc::new(X25519ChannelCrypto::new()))
    }

    fn runtime_key() -> PublicKey {
        LocalKeys::from_secret([42u8; KEY_LEN]).public()
    }

    #[tokio::test]
    async fn test_initiate_then_join() {
        let manager = manager();
        assert_eq!(manager.current().phase(), ChannelPhase::Fresh);
        assert!(!manager.should_join());

        manager.initiate().await.unwrap();
        assert_eq!(manager.current().phase(), ChannelPhase::Initiated);
        assert!(manager.should_join());

        let channel = manager.join(runtime_key()).await.unwrap();
        assert_eq!(channel.phase(), ChannelPhase::Established);
        assert_eq!(channel.remote_pubkey(), Some(runtime_key()));
        assert!(!manager.should_join());
    }

    #[tokio::test]
    async fn test_join_without_initiate_fails() {
        let manager = manager();
        let err = manager.join(runtime_key()).await.unwrap_err();
        assert!(matches!(err, ChannelError::NotInitiated));
        assert_eq!(manager.current().phase(), ChannelPhase::Fresh);
    }

    #[tokio::test]
    async fn test_reinitiate_discards_previous_channel() {
        let manager = manager();
        manager.initiate().await.unwrap();
        manager.join(runtime_key()).await.unwrap();
        let old_local = manager.current().local_keys().unwrap().public();

        manager.initiate().await.unwrap();
        let current = manager.current();
        assert_eq!(current.phase(), ChannelPhase::Initiated);
        assert_ne!(current.local_keys().unwrap().public(), old_local);
        assert!(manager.should_join());
    }

    #[tokio::test]
    async fn test_snapshots_are_not_mutated_by_later_swaps() {
        let manager = manager();
        manager.initiate().await.unwrap();
        let before = manager.current();

        manager.join(runtime_key()).await.unwrap();
        assert_eq!(before.phase(), ChannelPhase::Initiated);
        assert_eq!(manager.current().phase(), ChannelPhase::Established);
    }

    #[tokio::test]
    async fn test_failed_join_keeps_initiated_channel() {
        let manager = ChannelManager::new(Arc::new(FailingChannelCrypto::on_join()));
        manager.initiate().await.unwrap();

        let err = manager.join(runtime_key()).await.unwrap_err();
        assert!(matches!(err, ChannelError::Primitive(_)));
        assert_eq!(manager.current().phase(), ChannelPhase::Initiated);
        assert!(manager.should_join());
    }

    #[tokio::test]
    async fn test_failed_initiate_leaves_state_untouched() {
        let manager = ChannelManager::new(Arc::new(FailingChannelCrypto::on_initiate()));
        assert!(manager.initiate().await.is_err());
        assert_eq!(manager.current().phase(), ChannelPhase::Fresh);
        assert!(!manager.should_join());
    }
}
