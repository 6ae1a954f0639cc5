//! Wallet entity types
//!
//! Amounts are decimal strings. The runtime may encode them as JSON strings
//! or numbers; both are accepted.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::SystemTime;

/// Render a JSON amount as a decimal string
pub fn amount_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn de_amount<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(amount_string))
}

/// Primary balance record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainAsset {
    /// Free balance, decimal string
    pub balance: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

/// Fields a balance refresh is allowed to change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub balance: String,
}

impl BalanceUpdate {
    /// Extract the update from a `FreeBalance` query result
    ///
    /// A missing, null or empty balance counts as `"0"`.
    pub fn from_result(free_balance: Option<&Value>) -> Self {
        let balance = free_balance
            .and_then(|fb| fb.get("balance"))
            .and_then(amount_string)
            .unwrap_or_else(|| "0".to_string());
        Self { balance }
    }
}

impl MainAsset {
    /// New snapshot with `update` applied over `previous`
    pub fn merge(previous: Option<&MainAsset>, update: BalanceUpdate) -> MainAsset {
        MainAsset { balance: update.balance, ..previous.cloned().unwrap_or_default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub symbol: String,

    /// Passed through untouched; the runtime's encoding is not relied upon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Value>,

    #[serde(default, deserialize_with = "de_amount", skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<String>,
}

/// Entry of the asset listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    pub metadata: AssetMetadata,

    /// Holder's balance of this asset
    #[serde(default, deserialize_with = "de_amount", skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
}

impl Asset {
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }
}

/// Last operational error recorded by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastError {
    pub message: String,
    pub at: SystemTime,
}

impl LastError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), at: SystemTime::now() }
    }
}
