use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{NetworkId, TxDigest};

/// A single entry-function call, addressed as `<package>::<module>::<function>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCallRequest {
    pub target: String,
    pub arguments: Vec<String>,
}

impl MoveCallRequest {
    pub fn entry(
        package_id: &str,
        module: &str,
        function: &str,
        arguments: Vec<String>,
    ) -> Self {
        Self {
            target: format!("{package_id}::{module}::{function}"),
            arguments,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignAndExecuteRequest {
    pub network: NetworkId,
    pub call: MoveCallRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignAndExecuteResponse {
    pub digest: TxDigest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One successfully minted item, kept for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRecord {
    pub digest: TxDigest,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub minted_at: DateTime<Utc>,
}
