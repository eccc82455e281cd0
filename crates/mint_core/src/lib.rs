use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{NetworkId, TxDigest},
    network::{builtin_networks, NetworkInfo, PRIMARY_NETWORK},
    protocol::{MintRecord, MoveCallRequest, WalletAccount},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};
use url::Url;

pub mod error;
pub mod fetcher;
pub mod inspector;
pub mod wallet;

pub use error::{ImageValidationError, MintError, PackageValidationError};
pub use fetcher::HttpResourceFetcher;
pub use inspector::RpcModuleInspector;
pub use wallet::HttpWalletBridge;

/// Hard ceiling on accepted image size, enforced on both the declared and
/// the actually downloaded byte count.
pub const MAX_IMAGE_BYTES: u64 = 1024 * 1024;

/// Fixed entry point invoked on the validated package.
pub const NFT_MODULE: &str = "nft";
pub const MINT_FUNCTION: &str = "mint";

pub const STATUS_PACKAGE_VALID: &str = "Package valid";
pub const STATUS_PACKAGE_INVALID: &str = "Package invalid or not found on this network";
pub const STATUS_IMAGE_TOO_LARGE: &str = "Image must be under 1MB";
pub const STATUS_IMAGE_BLOCKED: &str = "Invalid URL or blocked";
pub const STATUS_IMAGE_VALID: &str = "Image valid";
pub const STATUS_MINT_OK: &str = "Mint succeeded";
pub const STATUS_MINT_FAILED: &str = "Mint failed: check gas balance, package and parameters";

/// Resolves whether a package identifier points at loadable on-chain modules
/// on the given network.
#[async_trait]
pub trait ModuleInspector: Send + Sync {
    async fn package_modules_exist(&self, network: &NetworkInfo, package_id: &str) -> Result<()>;
}

pub struct MissingModuleInspector;

#[async_trait]
impl ModuleInspector for MissingModuleInspector {
    async fn package_modules_exist(&self, network: &NetworkInfo, _package_id: &str) -> Result<()> {
        Err(anyhow!(
            "module inspector unavailable for network {}",
            network.id
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Outcome of a size-capped resource retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Complete(FetchedResource),
    /// The body crossed `limit` bytes; the remainder was not read.
    TooLarge { limit: u64 },
}

#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Declared size from a metadata-only probe. `Ok(None)` when the server
    /// does not report one; a transport-level failure is an error.
    async fn declared_size(&self, url: &Url) -> Result<Option<u64>>;

    /// Full retrieval, reading at most `limit` bytes of body.
    async fn fetch_limited(&self, url: &Url, limit: u64) -> Result<FetchOutcome>;
}

pub struct MissingResourceFetcher;

#[async_trait]
impl ResourceFetcher for MissingResourceFetcher {
    async fn declared_size(&self, url: &Url) -> Result<Option<u64>> {
        Err(anyhow!("resource fetcher unavailable for {url}"))
    }

    async fn fetch_limited(&self, url: &Url, _limit: u64) -> Result<FetchOutcome> {
        Err(anyhow!("resource fetcher unavailable for {url}"))
    }
}

/// The external wallet connection: account discovery plus transaction
/// signing and submission. The bridge owns keys and gas; this client only
/// hands it a fully composed call.
#[async_trait]
pub trait WalletBridge: Send + Sync {
    async fn account(&self) -> Result<Option<WalletAccount>>;
    async fn sign_and_execute(
        &self,
        network: &NetworkId,
        call: MoveCallRequest,
    ) -> Result<TxDigest>;
}

pub struct MissingWalletBridge;

#[async_trait]
impl WalletBridge for MissingWalletBridge {
    async fn account(&self) -> Result<Option<WalletAccount>> {
        Err(anyhow!("wallet bridge unavailable"))
    }

    async fn sign_and_execute(
        &self,
        _network: &NetworkId,
        _call: MoveCallRequest,
    ) -> Result<TxDigest> {
        Err(anyhow!("wallet bridge unavailable"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub package_id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationState {
    pub package_valid: bool,
    pub image_preview_url: Option<String>,
    pub busy_package: bool,
    pub busy_image: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MintState {
    pub minting: bool,
    pub status: Option<String>,
    pub last_digest: Option<TxDigest>,
}

fn gating_satisfied(form: &FormState, validation: &ValidationState, mint: &MintState) -> bool {
    validation.package_valid
        && !form.name.trim().is_empty()
        && !form.description.trim().is_empty()
        && validation.image_preview_url.is_some()
        && !mint.minting
}

/// Point-in-time copy of the full workflow state, cheap enough to ship to
/// observers on every transition.
#[derive(Debug, Clone)]
pub struct WorkflowSnapshot {
    pub form: FormState,
    pub validation: ValidationState,
    pub mint: MintState,
    pub history: Vec<MintRecord>,
    pub networks: Vec<NetworkInfo>,
    pub active_network: NetworkId,
}

impl WorkflowSnapshot {
    pub fn can_mint(&self) -> bool {
        gating_satisfied(&self.form, &self.validation, &self.mint)
    }
}

impl Default for WorkflowSnapshot {
    fn default() -> Self {
        Self {
            form: FormState::default(),
            validation: ValidationState::default(),
            mint: MintState::default(),
            history: Vec::new(),
            networks: builtin_networks(),
            active_network: NetworkId::from(PRIMARY_NETWORK),
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    StateChanged(WorkflowSnapshot),
    /// Emitted alongside a successful image validation so observers can
    /// render the already-downloaded bytes without a second fetch.
    ImagePreviewReady {
        url: String,
        resource: FetchedResource,
    },
}

struct WorkflowState {
    form: FormState,
    validation: ValidationState,
    mint: MintState,
    history: Vec<MintRecord>,
    networks: Vec<NetworkInfo>,
    active_network: NetworkId,
}

impl WorkflowState {
    fn can_mint(&self) -> bool {
        gating_satisfied(&self.form, &self.validation, &self.mint)
    }

    fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            form: self.form.clone(),
            validation: self.validation.clone(),
            mint: self.mint.clone(),
            history: self.history.clone(),
            networks: self.networks.clone(),
            active_network: self.active_network.clone(),
        }
    }

    fn active_network_info(&self) -> NetworkInfo {
        self.networks
            .iter()
            .find(|network| network.id == self.active_network)
            .cloned()
            .unwrap_or_else(|| NetworkInfo::new(self.active_network.clone(), String::new()))
    }
}

/// The mint workflow controller: session-lifetime state plus the three
/// external call sites. State lives behind one async mutex; the lock is
/// never held across an external call, so independent operations can be in
/// flight at the same time and each one's updates land atomically when it
/// completes. A stale completion simply overwrites newer state (last writer
/// wins), matching the absence of cancellation in the workflow.
pub struct MintWorkflow {
    inspector: Arc<dyn ModuleInspector>,
    fetcher: Arc<dyn ResourceFetcher>,
    wallet: Arc<dyn WalletBridge>,
    inner: Mutex<WorkflowState>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl MintWorkflow {
    pub fn new() -> Arc<Self> {
        Self::with_dependencies(
            Arc::new(MissingModuleInspector),
            Arc::new(MissingResourceFetcher),
            Arc::new(MissingWalletBridge),
            builtin_networks(),
            NetworkId::from(PRIMARY_NETWORK),
        )
    }

    pub fn with_dependencies(
        inspector: Arc<dyn ModuleInspector>,
        fetcher: Arc<dyn ResourceFetcher>,
        wallet: Arc<dyn WalletBridge>,
        networks: Vec<NetworkInfo>,
        active_network: NetworkId,
    ) -> Arc<Self> {
        let networks = if networks.is_empty() {
            builtin_networks()
        } else {
            networks
        };
        let active_network = if networks.iter().any(|n| n.id == active_network) {
            active_network
        } else {
            warn!(
                network = %active_network,
                "requested startup network is not in the directory; falling back to the first entry"
            );
            networks[0].id.clone()
        };

        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            inspector,
            fetcher,
            wallet,
            inner: Mutex::new(WorkflowState {
                form: FormState::default(),
                validation: ValidationState::default(),
                mint: MintState::default(),
                history: Vec::new(),
                networks,
                active_network,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn can_mint(&self) -> bool {
        self.inner.lock().await.can_mint()
    }

    fn publish(&self, state: &WorkflowState) {
        let _ = self
            .events
            .send(WorkflowEvent::StateChanged(state.snapshot()));
    }

    /// Package identifiers are stored trimmed; any change invalidates the
    /// previous validation result.
    pub async fn set_package_id(&self, value: &str) {
        let mut state = self.inner.lock().await;
        let trimmed = value.trim();
        if state.form.package_id == trimmed {
            return;
        }
        state.form.package_id = trimmed.to_string();
        state.validation.package_valid = false;
        self.publish(&state);
    }

    pub async fn set_name(&self, value: &str) {
        let mut state = self.inner.lock().await;
        if state.form.name == value {
            return;
        }
        state.form.name = value.to_string();
        self.publish(&state);
    }

    pub async fn set_description(&self, value: &str) {
        let mut state = self.inner.lock().await;
        if state.form.description == value {
            return;
        }
        state.form.description = value.to_string();
        self.publish(&state);
    }

    pub async fn set_image_url(&self, value: &str) {
        let mut state = self.inner.lock().await;
        if state.form.image_url == value {
            return;
        }
        state.form.image_url = value.to_string();
        self.publish(&state);
    }

    /// One inspector call against the active network. No retry and no
    /// de-duplication of overlapping invocations.
    pub async fn validate_package(&self) -> Result<(), PackageValidationError> {
        let (package_id, network) = {
            let mut state = self.inner.lock().await;
            if state.form.package_id.is_empty() {
                return Err(PackageValidationError::EmptyPackageId);
            }
            state.validation.busy_package = true;
            state.validation.package_valid = false;
            state.mint.status = None;
            self.publish(&state);
            (state.form.package_id.clone(), state.active_network_info())
        };

        let result = self
            .inspector
            .package_modules_exist(&network, &package_id)
            .await;

        let mut state = self.inner.lock().await;
        state.validation.busy_package = false;
        match result {
            Ok(()) => {
                state.validation.package_valid = true;
                state.mint.status = Some(STATUS_PACKAGE_VALID.to_string());
                info!(network = %network.id, package_id = %package_id, "package validated");
                self.publish(&state);
                Ok(())
            }
            Err(err) => {
                state.mint.status = Some(STATUS_PACKAGE_INVALID.to_string());
                error!(network = %network.id, package_id = %package_id, "package validation failed: {err:#}");
                self.publish(&state);
                Err(PackageValidationError::Inspection(err))
            }
        }
    }

    /// Declared-size probe first, then a capped full retrieval. A server
    /// that does not report a size is probed by downloading and measuring.
    pub async fn validate_image(&self) -> Result<(), ImageValidationError> {
        let raw_url = {
            let mut state = self.inner.lock().await;
            let trimmed = state.form.image_url.trim().to_string();
            if trimmed.is_empty() {
                return Err(ImageValidationError::EmptyUrl);
            }
            state.validation.busy_image = true;
            state.validation.image_preview_url = None;
            state.mint.status = None;
            self.publish(&state);
            trimmed
        };

        let outcome = self.check_image(&raw_url).await;

        let mut state = self.inner.lock().await;
        state.validation.busy_image = false;
        match outcome {
            Ok(resource) => {
                state.validation.image_preview_url = Some(raw_url.clone());
                state.mint.status = Some(STATUS_IMAGE_VALID.to_string());
                info!(url = %raw_url, bytes = resource.bytes.len(), "image validated");
                self.publish(&state);
                let _ = self.events.send(WorkflowEvent::ImagePreviewReady {
                    url: raw_url,
                    resource,
                });
                Ok(())
            }
            Err(err) => {
                state.mint.status = Some(
                    match &err {
                        ImageValidationError::DeclaredTooLarge { .. }
                        | ImageValidationError::TooLarge { .. } => STATUS_IMAGE_TOO_LARGE,
                        _ => STATUS_IMAGE_BLOCKED,
                    }
                    .to_string(),
                );
                error!(url = %raw_url, "image validation failed: {err}");
                self.publish(&state);
                Err(err)
            }
        }
    }

    async fn check_image(&self, raw_url: &str) -> Result<FetchedResource, ImageValidationError> {
        let url = Url::parse(raw_url).map_err(ImageValidationError::MalformedUrl)?;

        let declared = self
            .fetcher
            .declared_size(&url)
            .await
            .map_err(ImageValidationError::Unreachable)?;
        if let Some(size) = declared {
            if size > MAX_IMAGE_BYTES {
                return Err(ImageValidationError::DeclaredTooLarge {
                    declared: size,
                    limit: MAX_IMAGE_BYTES,
                });
            }
        }

        match self
            .fetcher
            .fetch_limited(&url, MAX_IMAGE_BYTES)
            .await
            .map_err(ImageValidationError::Unreachable)?
        {
            FetchOutcome::Complete(resource) => Ok(resource),
            FetchOutcome::TooLarge { limit } => Err(ImageValidationError::TooLarge { limit }),
        }
    }

    /// Composes the fixed `<package>::nft::mint` call from the trimmed form
    /// values and hands it to the wallet bridge. A no-op while the gating
    /// conditions are unmet; `minting` is cleared on every exit path.
    pub async fn mint(&self) -> Result<Option<TxDigest>, MintError> {
        let (call, network, name, description, image_url) = {
            let mut state = self.inner.lock().await;
            if !state.can_mint() {
                warn!("mint requested while gating conditions are unmet");
                return Ok(None);
            }
            state.mint.minting = true;
            state.mint.status = None;
            state.mint.last_digest = None;
            self.publish(&state);

            let name = state.form.name.trim().to_string();
            let description = state.form.description.trim().to_string();
            let image_url = state.form.image_url.trim().to_string();
            let call = MoveCallRequest::entry(
                &state.form.package_id,
                NFT_MODULE,
                MINT_FUNCTION,
                vec![name.clone(), description.clone(), image_url.clone()],
            );
            (call, state.active_network.clone(), name, description, image_url)
        };

        let result = self.wallet.sign_and_execute(&network, call).await;

        let mut state = self.inner.lock().await;
        state.mint.minting = false;
        match result {
            Ok(digest) => {
                state.mint.last_digest = Some(digest.clone());
                state.history.insert(
                    0,
                    MintRecord {
                        digest: digest.clone(),
                        name,
                        description,
                        image_url,
                        minted_at: Utc::now(),
                    },
                );
                state.mint.status = Some(STATUS_MINT_OK.to_string());
                info!(network = %network, digest = %digest, "mint succeeded");
                self.publish(&state);
                Ok(Some(digest))
            }
            Err(err) => {
                state.mint.status = Some(STATUS_MINT_FAILED.to_string());
                error!(network = %network, "mint failed: {err:#}");
                self.publish(&state);
                Err(MintError::Execution(err))
            }
        }
    }

    /// Clears the per-item fields after a successful mint. Package identity,
    /// its validation result, the last digest and the history all survive.
    pub async fn reset_form(&self) {
        let mut state = self.inner.lock().await;
        state.form.name.clear();
        state.form.description.clear();
        state.form.image_url.clear();
        state.validation.image_preview_url = None;
        state.mint.status = None;
        self.publish(&state);
    }

    /// Existing package/image validity is intentionally left as-is on a
    /// switch; the user re-validates when it matters on the new network.
    pub async fn select_network(&self, id: &NetworkId) -> Result<()> {
        let mut state = self.inner.lock().await;
        if !state.networks.iter().any(|network| &network.id == id) {
            warn!(network = %id, "ignoring selection of unknown network");
            return Err(anyhow!("unknown network: {id}"));
        }
        if state.active_network == *id {
            return Ok(());
        }
        state.active_network = id.clone();
        info!(network = %id, "active network switched");
        self.publish(&state);
        Ok(())
    }

    pub async fn wallet_account(&self) -> Result<Option<WalletAccount>> {
        self.wallet.account().await
    }
}

#[cfg(test)]
mod tests;
