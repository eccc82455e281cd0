//! Network directory and explorer-link mapping.
//!
//! The set of reachable networks is injected into the workflow controller as
//! an explicit dependency; this module provides the built-in directory and
//! the pure digest-to-explorer-URL mapping.

use serde::{Deserialize, Serialize};

use crate::domain::{NetworkId, TxDigest};

/// The network whose explorer links omit the network segment.
pub const PRIMARY_NETWORK: &str = "mainnet";

const EXPLORER_HOST: &str = "https://suiscan.xyz";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub id: NetworkId,
    pub rpc_url: String,
}

impl NetworkInfo {
    pub fn new(id: impl Into<NetworkId>, rpc_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rpc_url: rpc_url.into(),
        }
    }
}

/// Fullnode endpoints for the networks the client knows out of the box.
pub fn builtin_networks() -> Vec<NetworkInfo> {
    vec![
        NetworkInfo::new("mainnet", "https://fullnode.mainnet.sui.io:443"),
        NetworkInfo::new("testnet", "https://fullnode.testnet.sui.io:443"),
        NetworkInfo::new("devnet", "https://fullnode.devnet.sui.io:443"),
        NetworkInfo::new("localnet", "http://127.0.0.1:9000"),
    ]
}

/// Explorer URL for a transaction digest. The primary network uses the bare
/// `/tx/<digest>` path; every other network is addressed by id in the path.
pub fn explorer_tx_link(network: &NetworkId, digest: &TxDigest) -> String {
    if network.as_str() == PRIMARY_NETWORK {
        format!("{EXPLORER_HOST}/tx/{digest}")
    } else {
        format!("{EXPLORER_HOST}/{network}/tx/{digest}")
    }
}
