//! Backend commands queued from UI to backend worker.

use shared::domain::NetworkId;

pub enum BackendCommand {
    SetPackageId { value: String },
    SetName { value: String },
    SetDescription { value: String },
    SetImageUrl { value: String },
    ValidatePackage,
    ValidateImage,
    Mint,
    ResetForm,
    SelectNetwork { id: NetworkId },
    RefreshWalletAccount,
}
