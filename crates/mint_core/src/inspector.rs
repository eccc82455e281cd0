//! JSON-RPC module inspector over the active network's fullnode.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::network::NetworkInfo;

use crate::ModuleInspector;

const GET_MODULES_METHOD: &str = "sui_getNormalizedMoveModulesByPackage";

pub struct RpcModuleInspector {
    http: reqwest::Client,
    request_id: AtomicU64,
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl RpcModuleInspector {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            request_id: AtomicU64::new(1),
        }
    }

    async fn call(
        &self,
        rpc_url: &str,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = self
            .http
            .post(rpc_url)
            .json(&request)
            .send()
            .await
            .context("failed to send RPC request")?
            .error_for_status()
            .context("RPC endpoint returned an error status")?;

        let body: JsonRpcResponse = response
            .json()
            .await
            .context("invalid RPC response payload")?;
        if let Some(err) = body.error {
            return Err(anyhow!("RPC error {}: {}", err.code, err.message));
        }
        body.result
            .ok_or_else(|| anyhow!("RPC response carried neither result nor error"))
    }
}

impl Default for RpcModuleInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModuleInspector for RpcModuleInspector {
    async fn package_modules_exist(&self, network: &NetworkInfo, package_id: &str) -> Result<()> {
        self.call(
            &network.rpc_url,
            GET_MODULES_METHOD,
            serde_json::json!([package_id]),
        )
        .await
        .map(|_| ())
    }
}
