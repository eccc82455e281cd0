use super::*;
use std::{collections::VecDeque, time::Duration};

struct StubInspector {
    fail_with: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(NetworkId, String)>>,
}

impl StubInspector {
    fn ok() -> Self {
        Self {
            fail_with: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(err: impl Into<String>) -> Self {
        Self {
            fail_with: Some(err.into()),
            ..Self::ok()
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ModuleInspector for StubInspector {
    async fn package_modules_exist(&self, network: &NetworkInfo, package_id: &str) -> Result<()> {
        self.calls
            .lock()
            .await
            .push((network.id.clone(), package_id.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.fail_with {
            return Err(anyhow!(err.clone()));
        }
        Ok(())
    }
}

struct StubFetcher {
    probes: Mutex<VecDeque<std::result::Result<Option<u64>, String>>>,
    fetches: Mutex<VecDeque<std::result::Result<FetchOutcome, String>>>,
}

impl StubFetcher {
    fn scripted(
        probes: Vec<std::result::Result<Option<u64>, String>>,
        fetches: Vec<std::result::Result<FetchOutcome, String>>,
    ) -> Self {
        Self {
            probes: Mutex::new(probes.into()),
            fetches: Mutex::new(fetches.into()),
        }
    }

    fn ok_image(bytes: Vec<u8>) -> Self {
        Self::scripted(
            vec![Ok(None)],
            vec![Ok(FetchOutcome::Complete(FetchedResource {
                bytes,
                content_type: Some("image/png".to_string()),
            }))],
        )
    }
}

#[async_trait]
impl ResourceFetcher for StubFetcher {
    async fn declared_size(&self, _url: &Url) -> Result<Option<u64>> {
        let next = self
            .probes
            .lock()
            .await
            .pop_front()
            .expect("unexpected declared_size call");
        next.map_err(|err| anyhow!(err))
    }

    async fn fetch_limited(&self, _url: &Url, _limit: u64) -> Result<FetchOutcome> {
        let next = self
            .fetches
            .lock()
            .await
            .pop_front()
            .expect("unexpected fetch_limited call");
        next.map_err(|err| anyhow!(err))
    }
}

struct StubWallet {
    response: std::result::Result<String, String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(NetworkId, MoveCallRequest)>>,
}

impl StubWallet {
    fn minting(digest: impl Into<String>) -> Self {
        Self {
            response: Ok(digest.into()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn rejecting(err: impl Into<String>) -> Self {
        Self {
            response: Err(err.into()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl WalletBridge for StubWallet {
    async fn account(&self) -> Result<Option<WalletAccount>> {
        Ok(None)
    }

    async fn sign_and_execute(
        &self,
        network: &NetworkId,
        call: MoveCallRequest,
    ) -> Result<TxDigest> {
        self.calls.lock().await.push((network.clone(), call));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.response {
            Ok(digest) => Ok(TxDigest::from(digest.as_str())),
            Err(err) => Err(anyhow!(err.clone())),
        }
    }
}

fn build(
    inspector: Arc<StubInspector>,
    fetcher: Arc<StubFetcher>,
    wallet: Arc<StubWallet>,
) -> Arc<MintWorkflow> {
    MintWorkflow::with_dependencies(
        inspector,
        fetcher,
        wallet,
        builtin_networks(),
        NetworkId::from("testnet"),
    )
}

const IMAGE_URL: &str = "https://img.example/ticket.png";

async fn fill_item_fields(workflow: &MintWorkflow) {
    workflow.set_name("Ticket #1").await;
    workflow.set_description("VIP access").await;
    workflow.set_image_url(IMAGE_URL).await;
}

fn drain_snapshots(rx: &mut broadcast::Receiver<WorkflowEvent>) -> Vec<WorkflowSnapshot> {
    let mut snapshots = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let WorkflowEvent::StateChanged(snapshot) = event {
            snapshots.push(snapshot);
        }
    }
    snapshots
}

#[tokio::test]
async fn package_validation_failure_disables_mint() {
    let inspector = Arc::new(StubInspector::failing("package object not found"));
    let fetcher = Arc::new(StubFetcher::ok_image(vec![1, 2, 3]));
    let wallet = Arc::new(StubWallet::minting("TxnNever"));
    let workflow = build(inspector, fetcher, wallet.clone());

    workflow.set_package_id("0xABC").await;
    fill_item_fields(&workflow).await;
    workflow.validate_image().await.expect("image validates");

    let err = workflow
        .validate_package()
        .await
        .expect_err("validation must fail");
    assert!(matches!(err, PackageValidationError::Inspection(_)));

    let snapshot = workflow.snapshot().await;
    assert!(!snapshot.validation.package_valid);
    assert!(!snapshot.validation.busy_package);
    assert_eq!(snapshot.mint.status.as_deref(), Some(STATUS_PACKAGE_INVALID));
    assert!(!snapshot.can_mint());

    assert_eq!(workflow.mint().await.expect("gated mint is a no-op"), None);
    assert!(wallet.calls.lock().await.is_empty());
}

#[tokio::test]
async fn package_validation_targets_the_active_network() {
    let inspector = Arc::new(StubInspector::ok());
    let fetcher = Arc::new(StubFetcher::ok_image(vec![1]));
    let wallet = Arc::new(StubWallet::minting("Txn"));
    let workflow = build(inspector.clone(), fetcher, wallet);

    workflow.set_package_id("  0xC0FFEE  ").await;
    workflow.validate_package().await.expect("validate");

    let calls = inspector.calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.as_str(), "testnet");
    // Stored and validated trimmed.
    assert_eq!(calls[0].1, "0xC0FFEE");

    let snapshot = workflow.snapshot().await;
    assert!(snapshot.validation.package_valid);
    assert_eq!(snapshot.mint.status.as_deref(), Some(STATUS_PACKAGE_VALID));
}

#[tokio::test]
async fn declared_oversize_fails_fast_without_fetch() {
    let fetcher = Arc::new(StubFetcher::scripted(
        vec![Ok(Some(2_000_000))],
        vec![Ok(FetchOutcome::Complete(FetchedResource {
            bytes: vec![0],
            content_type: None,
        }))],
    ));
    let workflow = build(
        Arc::new(StubInspector::ok()),
        fetcher.clone(),
        Arc::new(StubWallet::minting("Txn")),
    );

    workflow.set_image_url(IMAGE_URL).await;
    let err = workflow
        .validate_image()
        .await
        .expect_err("declared size over the limit");
    assert!(matches!(
        err,
        ImageValidationError::DeclaredTooLarge {
            declared: 2_000_000,
            ..
        }
    ));

    let snapshot = workflow.snapshot().await;
    assert!(snapshot.validation.image_preview_url.is_none());
    assert_eq!(snapshot.mint.status.as_deref(), Some(STATUS_IMAGE_TOO_LARGE));
    // The body was never requested.
    assert_eq!(fetcher.fetches.lock().await.len(), 1);
}

#[tokio::test]
async fn oversized_download_is_rejected_when_no_size_was_declared() {
    let fetcher = Arc::new(StubFetcher::scripted(
        vec![Ok(None)],
        vec![Ok(FetchOutcome::TooLarge {
            limit: MAX_IMAGE_BYTES,
        })],
    ));
    let workflow = build(
        Arc::new(StubInspector::ok()),
        fetcher.clone(),
        Arc::new(StubWallet::minting("Txn")),
    );

    workflow.set_image_url(IMAGE_URL).await;
    let err = workflow
        .validate_image()
        .await
        .expect_err("actual size over the limit");
    assert!(matches!(err, ImageValidationError::TooLarge { .. }));

    let snapshot = workflow.snapshot().await;
    assert!(snapshot.validation.image_preview_url.is_none());
    assert_eq!(snapshot.mint.status.as_deref(), Some(STATUS_IMAGE_TOO_LARGE));
    assert!(fetcher.fetches.lock().await.is_empty());
}

#[tokio::test]
async fn unreachable_image_is_reported_blocked() {
    let fetcher = Arc::new(StubFetcher::scripted(
        vec![Ok(None)],
        vec![Err("connection refused".to_string())],
    ));
    let workflow = build(
        Arc::new(StubInspector::ok()),
        fetcher,
        Arc::new(StubWallet::minting("Txn")),
    );

    workflow.set_image_url(IMAGE_URL).await;
    let err = workflow.validate_image().await.expect_err("unreachable");
    assert!(matches!(err, ImageValidationError::Unreachable(_)));

    let snapshot = workflow.snapshot().await;
    assert_eq!(snapshot.mint.status.as_deref(), Some(STATUS_IMAGE_BLOCKED));
    assert!(!snapshot.validation.busy_image);
}

#[tokio::test]
async fn malformed_url_is_reported_blocked() {
    let fetcher = Arc::new(StubFetcher::scripted(vec![], vec![]));
    let workflow = build(
        Arc::new(StubInspector::ok()),
        fetcher,
        Arc::new(StubWallet::minting("Txn")),
    );

    workflow.set_image_url("not a url").await;
    let err = workflow.validate_image().await.expect_err("malformed url");
    assert!(matches!(err, ImageValidationError::MalformedUrl(_)));

    let snapshot = workflow.snapshot().await;
    assert_eq!(snapshot.mint.status.as_deref(), Some(STATUS_IMAGE_BLOCKED));
    assert!(snapshot.validation.image_preview_url.is_none());
}

#[tokio::test]
async fn empty_inputs_are_precondition_errors() {
    let inspector = Arc::new(StubInspector::ok());
    let fetcher = Arc::new(StubFetcher::scripted(vec![], vec![]));
    let workflow = build(
        inspector.clone(),
        fetcher,
        Arc::new(StubWallet::minting("Txn")),
    );

    let err = workflow
        .validate_package()
        .await
        .expect_err("empty package id");
    assert!(matches!(err, PackageValidationError::EmptyPackageId));
    assert!(inspector.calls.lock().await.is_empty());

    let err = workflow.validate_image().await.expect_err("empty url");
    assert!(matches!(err, ImageValidationError::EmptyUrl));

    // Neither precondition failure touches busy flags or status.
    let snapshot = workflow.snapshot().await;
    assert!(!snapshot.validation.busy_package);
    assert!(!snapshot.validation.busy_image);
    assert!(snapshot.mint.status.is_none());
}

#[tokio::test]
async fn can_mint_requires_every_gate() {
    let workflow = build(
        Arc::new(StubInspector::ok()),
        Arc::new(StubFetcher::ok_image(vec![9])),
        Arc::new(StubWallet::minting("Txn")),
    );

    workflow.set_package_id("0xC0FFEE").await;
    workflow.validate_package().await.expect("validate package");
    fill_item_fields(&workflow).await;
    workflow.validate_image().await.expect("validate image");

    let snapshot = workflow.snapshot().await;
    assert!(snapshot.can_mint());

    let mut without_package = snapshot.clone();
    without_package.validation.package_valid = false;
    assert!(!without_package.can_mint());

    let mut blank_name = snapshot.clone();
    blank_name.form.name = "   ".to_string();
    assert!(!blank_name.can_mint());

    let mut blank_description = snapshot.clone();
    blank_description.form.description = String::new();
    assert!(!blank_description.can_mint());

    let mut without_preview = snapshot.clone();
    without_preview.validation.image_preview_url = None;
    assert!(!without_preview.can_mint());

    let mut in_flight = snapshot.clone();
    in_flight.mint.minting = true;
    assert!(!in_flight.can_mint());
}

#[tokio::test]
async fn mint_success_records_digest_and_history() {
    let wallet = Arc::new(StubWallet::minting("Txn123"));
    let workflow = build(
        Arc::new(StubInspector::ok()),
        Arc::new(StubFetcher::ok_image(vec![9])),
        wallet.clone(),
    );

    workflow.set_package_id("0xC0FFEE").await;
    workflow.validate_package().await.expect("validate package");
    workflow.set_name("  Ticket #1  ").await;
    workflow.set_description(" VIP access ").await;
    workflow.set_image_url(IMAGE_URL).await;
    workflow.validate_image().await.expect("validate image");

    let digest = workflow
        .mint()
        .await
        .expect("mint succeeds")
        .expect("gates were satisfied");
    assert_eq!(digest.as_str(), "Txn123");

    let calls = wallet.calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.as_str(), "testnet");
    assert_eq!(calls[0].1.target, "0xC0FFEE::nft::mint");
    assert_eq!(
        calls[0].1.arguments,
        vec!["Ticket #1", "VIP access", IMAGE_URL]
    );
    drop(calls);

    let snapshot = workflow.snapshot().await;
    assert_eq!(snapshot.mint.last_digest.as_ref().map(TxDigest::as_str), Some("Txn123"));
    assert_eq!(snapshot.mint.status.as_deref(), Some(STATUS_MINT_OK));
    assert!(!snapshot.mint.minting);
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.history[0].digest.as_str(), "Txn123");
    assert_eq!(snapshot.history[0].name, "Ticket #1");
    assert_eq!(snapshot.history[0].description, "VIP access");
    assert_eq!(snapshot.history[0].image_url, IMAGE_URL);
}

#[tokio::test]
async fn later_mints_prepend_without_reordering_earlier_entries() {
    let workflow = build(
        Arc::new(StubInspector::ok()),
        Arc::new(StubFetcher::ok_image(vec![9])),
        Arc::new(StubWallet::minting("TxnA")),
    );

    workflow.set_package_id("0xC0FFEE").await;
    workflow.validate_package().await.expect("validate package");
    fill_item_fields(&workflow).await;
    workflow.validate_image().await.expect("validate image");
    workflow.mint().await.expect("first mint");

    workflow.set_name("Ticket #2").await;
    workflow.mint().await.expect("second mint");

    let snapshot = workflow.snapshot().await;
    assert_eq!(snapshot.history.len(), 2);
    assert_eq!(snapshot.history[0].name, "Ticket #2");
    assert_eq!(snapshot.history[1].name, "Ticket #1");
}

#[tokio::test]
async fn wallet_rejection_leaves_history_untouched() {
    let wallet = Arc::new(StubWallet::rejecting("user declined signature"));
    let workflow = build(
        Arc::new(StubInspector::ok()),
        Arc::new(StubFetcher::ok_image(vec![9])),
        wallet,
    );

    workflow.set_package_id("0xC0FFEE").await;
    workflow.validate_package().await.expect("validate package");
    fill_item_fields(&workflow).await;
    workflow.validate_image().await.expect("validate image");

    let err = workflow.mint().await.expect_err("wallet rejects");
    assert!(matches!(err, MintError::Execution(_)));

    let snapshot = workflow.snapshot().await;
    assert!(!snapshot.mint.minting);
    assert_eq!(snapshot.mint.status.as_deref(), Some(STATUS_MINT_FAILED));
    assert!(snapshot.mint.last_digest.is_none());
    assert!(snapshot.history.is_empty());
}

#[tokio::test]
async fn mint_is_noop_until_gates_hold() {
    let wallet = Arc::new(StubWallet::minting("Txn"));
    let workflow = build(
        Arc::new(StubInspector::ok()),
        Arc::new(StubFetcher::ok_image(vec![9])),
        wallet.clone(),
    );

    assert_eq!(workflow.mint().await.expect("no-op"), None);
    assert!(wallet.calls.lock().await.is_empty());

    let snapshot = workflow.snapshot().await;
    assert!(!snapshot.mint.minting);
    assert!(snapshot.mint.status.is_none());
}

#[tokio::test]
async fn reset_form_preserves_package_and_history() {
    let workflow = build(
        Arc::new(StubInspector::ok()),
        Arc::new(StubFetcher::ok_image(vec![9])),
        Arc::new(StubWallet::minting("Txn123")),
    );

    workflow.set_package_id("0xC0FFEE").await;
    workflow.validate_package().await.expect("validate package");
    fill_item_fields(&workflow).await;
    workflow.validate_image().await.expect("validate image");
    workflow.mint().await.expect("mint");

    workflow.reset_form().await;

    let snapshot = workflow.snapshot().await;
    assert_eq!(snapshot.form.package_id, "0xC0FFEE");
    assert!(snapshot.validation.package_valid);
    assert!(snapshot.form.name.is_empty());
    assert!(snapshot.form.description.is_empty());
    assert!(snapshot.form.image_url.is_empty());
    assert!(snapshot.validation.image_preview_url.is_none());
    assert!(snapshot.mint.status.is_none());
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.mint.last_digest.as_ref().map(TxDigest::as_str), Some("Txn123"));
}

#[tokio::test]
async fn network_switch_preserves_validation_state() {
    let workflow = build(
        Arc::new(StubInspector::ok()),
        Arc::new(StubFetcher::ok_image(vec![9])),
        Arc::new(StubWallet::minting("Txn")),
    );

    workflow.set_package_id("0xC0FFEE").await;
    workflow.validate_package().await.expect("validate package");

    workflow
        .select_network(&NetworkId::from("devnet"))
        .await
        .expect("known network");

    let snapshot = workflow.snapshot().await;
    assert_eq!(snapshot.active_network.as_str(), "devnet");
    assert!(snapshot.validation.package_valid);

    workflow
        .select_network(&NetworkId::from("no-such-net"))
        .await
        .expect_err("unknown network");
    let snapshot = workflow.snapshot().await;
    assert_eq!(snapshot.active_network.as_str(), "devnet");
}

#[tokio::test]
async fn package_id_change_resets_validity() {
    let workflow = build(
        Arc::new(StubInspector::ok()),
        Arc::new(StubFetcher::ok_image(vec![9])),
        Arc::new(StubWallet::minting("Txn")),
    );

    workflow.set_package_id("0xC0FFEE").await;
    workflow.validate_package().await.expect("validate package");
    assert!(workflow.snapshot().await.validation.package_valid);

    workflow.set_package_id("0xDECAF").await;
    let snapshot = workflow.snapshot().await;
    assert!(!snapshot.validation.package_valid);

    // Re-setting the identical id is not a change.
    workflow.set_package_id("0xDECAF").await;
    workflow.validate_package().await.expect("validate package");
    workflow.set_package_id(" 0xDECAF ").await;
    assert!(workflow.snapshot().await.validation.package_valid);
}

#[tokio::test]
async fn new_validation_clears_previous_preview_before_probing() {
    let fetcher = Arc::new(StubFetcher::scripted(
        vec![Ok(None), Ok(None)],
        vec![
            Ok(FetchOutcome::Complete(FetchedResource {
                bytes: vec![1],
                content_type: None,
            })),
            Ok(FetchOutcome::Complete(FetchedResource {
                bytes: vec![2],
                content_type: None,
            })),
        ],
    ));
    let workflow = build(
        Arc::new(StubInspector::ok()),
        fetcher,
        Arc::new(StubWallet::minting("Txn")),
    );

    workflow.set_image_url(IMAGE_URL).await;
    workflow.validate_image().await.expect("first validation");
    assert!(workflow
        .snapshot()
        .await
        .validation
        .image_preview_url
        .is_some());

    let mut events = workflow.subscribe_events();
    workflow.validate_image().await.expect("second validation");

    let snapshots = drain_snapshots(&mut events);
    assert!(
        snapshots
            .iter()
            .any(|s| s.validation.busy_image && s.validation.image_preview_url.is_none()),
        "the preview must be cleared while the new validation is in flight"
    );
    assert_eq!(
        workflow
            .snapshot()
            .await
            .validation
            .image_preview_url
            .as_deref(),
        Some(IMAGE_URL)
    );
}

#[tokio::test]
async fn image_preview_event_carries_fetched_bytes() {
    let workflow = build(
        Arc::new(StubInspector::ok()),
        Arc::new(StubFetcher::ok_image(vec![7, 7, 7])),
        Arc::new(StubWallet::minting("Txn")),
    );

    let mut events = workflow.subscribe_events();
    workflow.set_image_url(IMAGE_URL).await;
    workflow.validate_image().await.expect("validate image");

    let mut preview = None;
    while let Ok(event) = events.try_recv() {
        if let WorkflowEvent::ImagePreviewReady { url, resource } = event {
            preview = Some((url, resource));
        }
    }
    let (url, resource) = preview.expect("preview event emitted");
    assert_eq!(url, IMAGE_URL);
    assert_eq!(resource.bytes, vec![7, 7, 7]);
    assert_eq!(resource.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn overlapping_validations_keep_independent_busy_flags() {
    let inspector = Arc::new(StubInspector::ok().with_delay(Duration::from_millis(50)));
    let workflow = build(
        inspector,
        Arc::new(StubFetcher::ok_image(vec![9])),
        Arc::new(StubWallet::minting("Txn")),
    );

    workflow.set_package_id("0xC0FFEE").await;
    workflow.set_image_url(IMAGE_URL).await;

    let mut events = workflow.subscribe_events();
    let (package, image) = tokio::join!(workflow.validate_package(), workflow.validate_image());
    package.expect("package validates");
    image.expect("image validates");

    let snapshots = drain_snapshots(&mut events);
    assert!(
        snapshots
            .iter()
            .any(|s| s.validation.busy_package && s.validation.busy_image),
        "both validations must be observable in flight at once"
    );

    let snapshot = workflow.snapshot().await;
    assert!(snapshot.validation.package_valid);
    assert!(snapshot.validation.image_preview_url.is_some());
    assert!(!snapshot.validation.busy_package);
    assert!(!snapshot.validation.busy_image);
}

#[tokio::test]
async fn a_new_mint_clears_the_previous_digest_while_in_flight() {
    let wallet = Arc::new(StubWallet::minting("Txn123").with_delay(Duration::from_millis(50)));
    let workflow = build(
        Arc::new(StubInspector::ok()),
        Arc::new(StubFetcher::ok_image(vec![9])),
        wallet,
    );

    workflow.set_package_id("0xC0FFEE").await;
    workflow.validate_package().await.expect("validate package");
    fill_item_fields(&workflow).await;
    workflow.validate_image().await.expect("validate image");
    workflow.mint().await.expect("first mint");
    assert!(workflow.snapshot().await.mint.last_digest.is_some());

    let handle = {
        let workflow = Arc::clone(&workflow);
        tokio::spawn(async move { workflow.mint().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let snapshot = workflow.snapshot().await;
    assert!(snapshot.mint.minting);
    assert!(snapshot.mint.last_digest.is_none());
    assert!(!snapshot.can_mint(), "minting itself gates a second submit");

    handle
        .await
        .expect("task join")
        .expect("second mint succeeds");
    let snapshot = workflow.snapshot().await;
    assert!(!snapshot.mint.minting);
    assert!(snapshot.mint.last_digest.is_some());
    assert_eq!(snapshot.history.len(), 2);
}
