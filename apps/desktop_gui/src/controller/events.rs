//! UI/backend events and error modeling for the mint studio controller.

use mint_core::{FetchedResource, WorkflowSnapshot};
use shared::protocol::WalletAccount;

pub enum UiEvent {
    Info(String),
    State(WorkflowSnapshot),
    ImagePreviewReady {
        url: String,
        resource: FetchedResource,
    },
    WalletAccount(Option<WalletAccount>),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Wallet,
    Rpc,
    Resource,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    NetworkSelection,
    General,
}

pub fn describe_startup_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("failed to build") || lower.contains("runtime") {
        "Backend worker startup failure; verify the local app environment and relaunch.".to_string()
    } else {
        format!("Backend startup error: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("reject")
            || message_lower.contains("declined")
            || message_lower.contains("signature")
            || message_lower.contains("wallet")
            || message_lower.contains("gas")
            || message_lower.contains("insufficient")
        {
            UiErrorCategory::Wallet
        } else if message_lower.contains("rpc")
            || message_lower.contains("fullnode")
            || message_lower.contains("jsonrpc")
        {
            UiErrorCategory::Rpc
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("unknown network")
            || message_lower.contains("empty")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("unreachable")
            || message_lower.contains("blocked")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Resource
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
