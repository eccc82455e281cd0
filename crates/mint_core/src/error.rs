//! Error taxonomy for the workflow's three external call sites. Every
//! variant is also reflected to the user as a short status string; the typed
//! values exist for logging and for tests.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageValidationError {
    #[error("package id is empty")]
    EmptyPackageId,
    #[error("package inspection failed: {0}")]
    Inspection(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ImageValidationError {
    #[error("image url is empty")]
    EmptyUrl,
    #[error("image url is malformed: {0}")]
    MalformedUrl(#[source] url::ParseError),
    #[error("declared image size {declared} exceeds the {limit} byte limit")]
    DeclaredTooLarge { declared: u64, limit: u64 },
    #[error("downloaded image exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("image resource unreachable or blocked: {0}")]
    Unreachable(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum MintError {
    #[error("wallet refused or failed to execute the transaction: {0}")]
    Execution(#[source] anyhow::Error),
}
