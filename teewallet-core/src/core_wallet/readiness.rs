//! Readiness gate for encrypted operations
//!
//! Three conditions, always evaluated in this order: channel established,
//! account unlocked, runtime client bound over the current channel.
//! [`ReadinessGate::is_ready`] and
//! [`ReadinessGate::ensure_ready`] both derive from [`ReadinessGate::failures`]
//! so they cannot disagree.

use super::errors::WalletResult;
use crate::core_account::Account;
use crate::core_channel::Channel;
use crate::metrics;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotReady {
    Channel,
    Account,
    Client,
}

impl NotReady {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotReady::Channel => "channel",
            NotReady::Account => "account",
            NotReady::Client => "client",
        }
    }
}

impl fmt::Display for NotReady {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            NotReady::Channel => "secure channel not ready",
            NotReady::Account => "account not ready",
            NotReady::Client => "runtime client not ready",
        };
        f.write_str(msg)
    }
}

/// Point-in-time view of everything an encrypted operation depends on
#[derive(Debug, Clone, Copy)]
pub struct ReadinessGate<'a> {
    channel: &'a Channel,
    account: Option<&'a Account>,
    client_bound: bool,
}

impl<'a> ReadinessGate<'a> {
    pub fn new(channel: &'a Channel, account: Option<&'a Account>, client_bound: bool) -> Self {
        Self { channel, account, client_bound }
    }

    /// Every failing condition, in check order
    pub fn failures(&self) -> Vec<NotReady> {
        let mut failed = Vec::with_capacity(3);
        if !self.channel.has_agreed_secret() || self.channel.remote_pubkey().is_none() {
            failed.push(NotReady::Channel);
        }
        if self.account.map_or(true, Account::is_locked) {
            failed.push(NotReady::Account);
        }
        if !self.client_bound {
            failed.push(NotReady::Client);
        }
        failed
    }

    /// Non-failing probe; logs one warning per failing condition
    pub fn is_ready(&self) -> bool {
        let failed = self.failures();
        for reason in &failed {
            metrics::readiness_failed(reason.as_str());
            warn!(reason = %reason.as_str(), channel = %self.channel.phase(), "{}", reason);
        }
        failed.is_empty()
    }

    /// Guard for encrypted operations; reports the first failing condition
    pub fn ensure_ready(&self) -> WalletResult<()> {
        match self.failures().first() {
            Some(reason) => Err((*reason).into()),
            None => Ok(()),
        }
    }
}
