//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::SetPackageId { .. } => "set_package_id",
        BackendCommand::SetName { .. } => "set_name",
        BackendCommand::SetDescription { .. } => "set_description",
        BackendCommand::SetImageUrl { .. } => "set_image_url",
        BackendCommand::ValidatePackage => "validate_package",
        BackendCommand::ValidateImage => "validate_image",
        BackendCommand::Mint => "mint",
        BackendCommand::ResetForm => "reset_form",
        BackendCommand::SelectNetwork { .. } => "select_network",
        BackendCommand::RefreshWalletAccount => "refresh_wallet_account",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend command processor disconnected (possible startup failure); restart the app"
                    .to_string();
        }
    }
}
