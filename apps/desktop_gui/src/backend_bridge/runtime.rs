//! Runtime bridge between the UI command queue and the mint workflow. The
//! worker thread owns the tokio runtime and the controller; each triggered
//! operation runs as its own task so validations and mints can overlap the
//! way the workflow allows.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender};
use mint_core::{
    HttpResourceFetcher, HttpWalletBridge, MintWorkflow, RpcModuleInspector, WorkflowEvent,
};
use shared::{domain::NetworkId, network::NetworkInfo};
use tokio::sync::broadcast::error::RecvError;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{describe_startup_failure, UiError, UiErrorContext, UiEvent};

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub wallet_url: String,
    pub networks: Vec<NetworkInfo>,
    pub startup_network: NetworkId,
}

pub fn launch(config: BackendConfig, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let message = format!("failed to build backend runtime: {err}");
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    describe_startup_failure(&message),
                )));
                tracing::error!("{message}");
                return;
            }
        };

        runtime.block_on(async move {
            let workflow = MintWorkflow::with_dependencies(
                Arc::new(RpcModuleInspector::new()),
                Arc::new(HttpResourceFetcher::new()),
                Arc::new(HttpWalletBridge::new(config.wallet_url)),
                config.networks,
                config.startup_network,
            );

            let mut events = workflow.subscribe_events();
            let ui_events = ui_tx.clone();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(WorkflowEvent::StateChanged(snapshot)) => {
                            let _ = ui_events.try_send(UiEvent::State(snapshot));
                        }
                        Ok(WorkflowEvent::ImagePreviewReady { url, resource }) => {
                            let _ = ui_events.try_send(UiEvent::ImagePreviewReady { url, resource });
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "workflow event stream lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let _ = ui_tx.try_send(UiEvent::State(workflow.snapshot().await));
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));
            refresh_wallet_account(&workflow, &ui_tx);

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::SetPackageId { value } => workflow.set_package_id(&value).await,
                    BackendCommand::SetName { value } => workflow.set_name(&value).await,
                    BackendCommand::SetDescription { value } => {
                        workflow.set_description(&value).await
                    }
                    BackendCommand::SetImageUrl { value } => workflow.set_image_url(&value).await,
                    BackendCommand::ValidatePackage => {
                        tracing::info!("backend: validate_package");
                        let workflow = Arc::clone(&workflow);
                        tokio::spawn(async move {
                            if let Err(err) = workflow.validate_package().await {
                                tracing::error!("backend: validate_package failed: {err}");
                            }
                        });
                    }
                    BackendCommand::ValidateImage => {
                        tracing::info!("backend: validate_image");
                        let workflow = Arc::clone(&workflow);
                        tokio::spawn(async move {
                            if let Err(err) = workflow.validate_image().await {
                                tracing::error!("backend: validate_image failed: {err}");
                            }
                        });
                    }
                    BackendCommand::Mint => {
                        tracing::info!("backend: mint");
                        let workflow = Arc::clone(&workflow);
                        tokio::spawn(async move {
                            match workflow.mint().await {
                                Ok(Some(digest)) => {
                                    tracing::info!(digest = %digest, "backend: mint succeeded")
                                }
                                Ok(None) => {
                                    tracing::warn!("backend: mint skipped; gating conditions unmet")
                                }
                                Err(err) => tracing::error!("backend: mint failed: {err}"),
                            }
                        });
                    }
                    BackendCommand::ResetForm => workflow.reset_form().await,
                    BackendCommand::SelectNetwork { id } => {
                        tracing::info!(network = %id, "backend: select_network");
                        if let Err(err) = workflow.select_network(&id).await {
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                UiErrorContext::NetworkSelection,
                                err.to_string(),
                            )));
                        }
                    }
                    BackendCommand::RefreshWalletAccount => {
                        refresh_wallet_account(&workflow, &ui_tx)
                    }
                }
            }
        });
    });
}

fn refresh_wallet_account(workflow: &Arc<MintWorkflow>, ui_tx: &Sender<UiEvent>) {
    let workflow = Arc::clone(workflow);
    let ui_tx = ui_tx.clone();
    tokio::spawn(async move {
        match workflow.wallet_account().await {
            Ok(account) => {
                let _ = ui_tx.try_send(UiEvent::WalletAccount(account));
            }
            Err(err) => {
                tracing::warn!("wallet account probe failed: {err:#}");
                let _ = ui_tx.try_send(UiEvent::WalletAccount(None));
            }
        }
    });
}
