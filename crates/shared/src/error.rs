use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletErrorCode {
    Rejected,
    NoAccount,
    InsufficientGas,
    InvalidArguments,
    Rpc,
    Internal,
}

/// Error payload returned by the wallet bridge over the wire.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct WalletApiError {
    pub code: WalletErrorCode,
    pub message: String,
}

impl WalletApiError {
    pub fn new(code: WalletErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
