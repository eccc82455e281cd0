//! HTTP bridge to the external wallet connection service. Signing,
//! submission and gas handling all happen on the other side of this seam.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use shared::{
    domain::{NetworkId, TxDigest},
    error::WalletApiError,
    protocol::{MoveCallRequest, SignAndExecuteRequest, SignAndExecuteResponse, WalletAccount},
};

use crate::WalletBridge;

pub struct HttpWalletBridge {
    http: reqwest::Client,
    base_url: String,
}

impl HttpWalletBridge {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl WalletBridge for HttpWalletBridge {
    async fn account(&self) -> Result<Option<WalletAccount>> {
        let response = self
            .http
            .get(format!("{}/wallet/account", self.base_url))
            .send()
            .await
            .context("failed to reach wallet bridge")?
            .error_for_status()
            .context("wallet bridge returned an error status")?;

        let account: Option<WalletAccount> = response
            .json()
            .await
            .context("invalid wallet account payload")?;
        Ok(account)
    }

    async fn sign_and_execute(
        &self,
        network: &NetworkId,
        call: MoveCallRequest,
    ) -> Result<TxDigest> {
        let request = SignAndExecuteRequest {
            network: network.clone(),
            call,
        };
        let response = self
            .http
            .post(format!("{}/wallet/sign-and-execute", self.base_url))
            .json(&request)
            .send()
            .await
            .context("failed to reach wallet bridge")?;

        if !response.status().is_success() {
            let status = response.status();
            // The bridge reports rejections and execution failures as a
            // structured payload where it can.
            if let Ok(err) = response.json::<WalletApiError>().await {
                return Err(anyhow!("wallet bridge refused the call: {err}"));
            }
            return Err(anyhow!("wallet bridge returned status {status}"));
        }

        let body: SignAndExecuteResponse = response
            .json()
            .await
            .context("invalid wallet bridge response payload")?;
        Ok(body.digest)
    }
}
