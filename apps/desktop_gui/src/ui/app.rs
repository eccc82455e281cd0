//! UI layer for the mint studio: single-page form, image preview, mint
//! action, and the session history of minted items.

use std::collections::HashMap;

use arboard::Clipboard;
use chrono::Local;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use image::GenericImageView;
use mint_core::{
    FetchedResource, WorkflowSnapshot, STATUS_IMAGE_VALID, STATUS_MINT_OK, STATUS_PACKAGE_VALID,
};
use shared::{
    domain::NetworkId,
    network::explorer_tx_link,
    protocol::WalletAccount,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorCategory, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

const PREVIEW_MAX_DIMENSION: f32 = 240.0;
const HISTORY_THUMB_DIMENSION: f32 = 64.0;

#[derive(Clone)]
struct PreviewImage {
    texture: egui::TextureHandle,
    size: egui::Vec2,
    byte_len: usize,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    label: &'static str,
    message: String,
}

impl StatusBanner {
    fn from_error(error: &UiError) -> Self {
        Self {
            label: err_label(error.category()),
            message: error.message().to_string(),
        }
    }
}

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Wallet => "Wallet",
        UiErrorCategory::Rpc => "Network RPC",
        UiErrorCategory::Resource => "Resource",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

pub struct MintStudioApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    snapshot: WorkflowSnapshot,
    package_id_input: String,
    name_input: String,
    description_input: String,
    image_url_input: String,

    preview: Option<PreviewImage>,
    thumbnails: HashMap<String, PreviewImage>,
    wallet_account: Option<WalletAccount>,
    banner: Option<StatusBanner>,
    info_line: Option<String>,
    dispatch_status: String,
}

impl MintStudioApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            snapshot: WorkflowSnapshot::default(),
            package_id_input: String::new(),
            name_input: String::new(),
            description_input: String::new(),
            image_url_input: String::new(),
            preview: None,
            thumbnails: HashMap::new(),
            wallet_account: None,
            banner: None,
            info_line: None,
            dispatch_status: String::new(),
        }
    }

    fn send(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.dispatch_status);
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::State(snapshot) => self.apply_snapshot(snapshot),
                UiEvent::ImagePreviewReady { url, resource } => {
                    self.install_preview(ctx, url, resource)
                }
                UiEvent::WalletAccount(account) => self.wallet_account = account,
                UiEvent::Info(message) => self.info_line = Some(message),
                UiEvent::Error(error) => {
                    tracing::error!(
                        "backend error ({:?}/{:?}): {}",
                        error.category(),
                        error.context(),
                        error.message()
                    );
                    self.banner = Some(StatusBanner::from_error(&error));
                }
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: WorkflowSnapshot) {
        // The preview texture tracks the workflow's preview URL; it goes away
        // the moment a new validation or a form reset clears that URL.
        if snapshot.validation.image_preview_url.is_none() {
            self.preview = None;
        }
        self.snapshot = snapshot;
    }

    fn install_preview(&mut self, ctx: &egui::Context, url: String, resource: FetchedResource) {
        match decode_preview(ctx, &url, &resource.bytes, PREVIEW_MAX_DIMENSION) {
            Some(preview) => {
                self.thumbnails.insert(url.clone(), preview.clone());
                if self.snapshot.validation.image_preview_url.as_deref() == Some(url.as_str()) {
                    self.preview = Some(preview);
                }
            }
            None => {
                self.banner = Some(StatusBanner {
                    label: "Resource",
                    message: format!("Validated image could not be decoded for preview: {url}"),
                });
            }
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text.to_string())) {
            Ok(()) => self.info_line = Some("Digest copied to clipboard".to_string()),
            Err(err) => {
                tracing::warn!("clipboard copy failed: {err}");
                self.banner = Some(StatusBanner {
                    label: "Clipboard",
                    message: format!("Could not copy digest: {err}"),
                });
            }
        }
    }

    fn show_header(&mut self, ctx: &egui::Context, snapshot: &WorkflowSnapshot) {
        egui::TopBottomPanel::top("app_header").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("NFT Mint Studio");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match self.wallet_account.clone() {
                        Some(account) => {
                            ui.label(
                                egui::RichText::new(format!(
                                    "Wallet {}",
                                    shorten_middle(&account.address, 6, 4)
                                ))
                                .monospace(),
                            )
                            .on_hover_text(account.address);
                        }
                        None => {
                            ui.label(egui::RichText::new("No wallet connected").weak());
                        }
                    }
                    if ui
                        .button("Reconnect")
                        .on_hover_text("Probe the wallet bridge for the connected account")
                        .clicked()
                    {
                        self.send(BackendCommand::RefreshWalletAccount);
                    }

                    let mut selected: Option<NetworkId> = None;
                    egui::ComboBox::from_id_salt("active_network")
                        .selected_text(snapshot.active_network.as_str())
                        .show_ui(ui, |ui| {
                            for network in &snapshot.networks {
                                let active = network.id == snapshot.active_network;
                                if ui.selectable_label(active, network.id.as_str()).clicked() {
                                    selected = Some(network.id.clone());
                                }
                            }
                        });
                    if let Some(id) = selected {
                        self.send(BackendCommand::SelectNetwork { id });
                    }
                });
            });
            ui.add_space(4.0);
        });
    }

    fn show_main(&mut self, ctx: &egui::Context, snapshot: &WorkflowSnapshot) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.show_banner(ui);
                self.show_form(ui, snapshot);
                if !snapshot.history.is_empty() {
                    ui.add_space(12.0);
                    ui.separator();
                    self.show_history(ui, snapshot);
                }
                if let Some(info) = self.info_line.clone() {
                    ui.add_space(8.0);
                    ui.label(egui::RichText::new(info).weak().small());
                }
                if !self.dispatch_status.is_empty() {
                    let message = self.dispatch_status.clone();
                    ui.label(egui::RichText::new(message).color(ui.visuals().warn_fg_color));
                }
            });
        });
    }

    fn show_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.banner.clone() else {
            return;
        };
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(format!("{}: {}", banner.label, banner.message))
                            .color(ui.visuals().error_fg_color),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("Dismiss").clicked() {
                            self.banner = None;
                        }
                    });
                });
            });
        ui.add_space(6.0);
    }

    fn show_form(&mut self, ui: &mut egui::Ui, snapshot: &WorkflowSnapshot) {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.package_id_input)
                    .hint_text("Published package id (0x...)")
                    .desired_width(ui.available_width() - 110.0),
            );
            if response.changed() {
                let value = self.package_id_input.clone();
                self.send(BackendCommand::SetPackageId { value });
            }

            let can_validate =
                !self.package_id_input.trim().is_empty() && !snapshot.validation.busy_package;
            let label = if snapshot.validation.busy_package {
                "Validating..."
            } else {
                "Validate"
            };
            if ui
                .add_enabled(can_validate, egui::Button::new(label))
                .clicked()
            {
                self.send(BackendCommand::ValidatePackage);
            }
        });
        if snapshot.validation.package_valid {
            ui.label(
                egui::RichText::new("Package resolves on this network")
                    .color(egui::Color32::from_rgb(0x2e, 0x7d, 0x32))
                    .small(),
            );
        }
        ui.add_space(6.0);

        let response = ui.add(
            egui::TextEdit::singleline(&mut self.name_input)
                .hint_text("NFT name")
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            let value = self.name_input.clone();
            self.send(BackendCommand::SetName { value });
        }

        let response = ui.add(
            egui::TextEdit::multiline(&mut self.description_input)
                .hint_text("NFT description")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            let value = self.description_input.clone();
            self.send(BackendCommand::SetDescription { value });
        }

        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.image_url_input)
                    .hint_text("Image URL (1MB max)")
                    .desired_width(ui.available_width() - 110.0),
            );
            if response.changed() {
                let value = self.image_url_input.clone();
                self.send(BackendCommand::SetImageUrl { value });
            }

            let can_validate =
                !self.image_url_input.trim().is_empty() && !snapshot.validation.busy_image;
            let label = if snapshot.validation.busy_image {
                "Checking..."
            } else {
                "Validate"
            };
            if ui
                .add_enabled(can_validate, egui::Button::new(label))
                .clicked()
            {
                self.send(BackendCommand::ValidateImage);
            }
        });

        if let Some(preview) = self.preview.clone() {
            ui.add_space(6.0);
            ui.add(egui::Image::new((preview.texture.id(), preview.size)));
            ui.label(
                egui::RichText::new(format_byte_size(preview.byte_len as u64))
                    .weak()
                    .small(),
            );
        }

        ui.add_space(10.0);
        let mint_label = if snapshot.mint.minting {
            "Minting..."
        } else {
            "Mint NFT"
        };
        if ui
            .add_enabled(
                snapshot.can_mint(),
                egui::Button::new(mint_label).min_size(egui::vec2(ui.available_width(), 36.0)),
            )
            .clicked()
        {
            self.send(BackendCommand::Mint);
        }

        if let Some(digest) = snapshot.mint.last_digest.clone() {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.hyperlink_to(
                    "View transaction",
                    explorer_tx_link(&snapshot.active_network, &digest),
                );
                if ui.button("Copy digest").clicked() {
                    self.copy_to_clipboard(digest.as_str());
                }
                if ui.button("New NFT").clicked() {
                    self.name_input.clear();
                    self.description_input.clear();
                    self.image_url_input.clear();
                    self.send(BackendCommand::ResetForm);
                }
            });
        }

        if let Some(status) = &snapshot.mint.status {
            ui.add_space(6.0);
            let color = if is_success_status(status) {
                egui::Color32::from_rgb(0x2e, 0x7d, 0x32)
            } else {
                ui.visuals().error_fg_color
            };
            ui.label(egui::RichText::new(status).color(color));
        }
    }

    fn show_history(&mut self, ui: &mut egui::Ui, snapshot: &WorkflowSnapshot) {
        ui.heading("Minted this session");
        ui.add_space(4.0);
        for record in &snapshot.history {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    if let Some(thumb) = self.thumbnails.get(&record.image_url) {
                        let side = HISTORY_THUMB_DIMENSION;
                        ui.add(
                            egui::Image::new((thumb.texture.id(), thumb.size))
                                .fit_to_exact_size(egui::vec2(side, side)),
                        );
                    }
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new(&record.name).strong());
                        if !record.description.is_empty() {
                            ui.label(egui::RichText::new(&record.description).small());
                        }
                        ui.horizontal(|ui| {
                            ui.hyperlink_to(
                                shorten_middle(record.digest.as_str(), 6, 4),
                                explorer_tx_link(&snapshot.active_network, &record.digest),
                            )
                            .on_hover_text(record.digest.as_str());
                            ui.label(
                                egui::RichText::new(
                                    record
                                        .minted_at
                                        .with_timezone(&Local)
                                        .format("%H:%M:%S")
                                        .to_string(),
                                )
                                .weak()
                                .small(),
                            );
                        });
                    });
                });
            });
            ui.add_space(4.0);
        }
    }
}

impl eframe::App for MintStudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);

        let snapshot = self.snapshot.clone();
        self.show_header(ctx, &snapshot);
        self.show_main(ctx, &snapshot);

        let busy = snapshot.validation.busy_package
            || snapshot.validation.busy_image
            || snapshot.mint.minting;
        if busy {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }
}

fn decode_preview(
    ctx: &egui::Context,
    url: &str,
    bytes: &[u8],
    max_dimension: f32,
) -> Option<PreviewImage> {
    let decoded = match image::load_from_memory(bytes) {
        Ok(image) => image,
        Err(err) => {
            tracing::warn!(url = %url, "failed to decode validated image: {err}");
            return None;
        }
    };

    let (orig_w, orig_h) = decoded.dimensions();
    let scale = (max_dimension / (orig_w.max(orig_h) as f32)).min(1.0);
    let resized = if scale < 1.0 {
        decoded.resize(
            (orig_w as f32 * scale).max(1.0) as u32,
            (orig_h as f32 * scale).max(1.0) as u32,
            image::imageops::FilterType::Triangle,
        )
    } else {
        decoded
    };

    let rgba = resized.to_rgba8();
    let [w, h] = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied([w, h], rgba.as_raw());
    let texture = ctx.load_texture(
        format!("image-preview:{url}"),
        color_image,
        egui::TextureOptions::LINEAR,
    );
    Some(PreviewImage {
        texture,
        size: egui::vec2(w as f32, h as f32),
        byte_len: bytes.len(),
    })
}

fn is_success_status(status: &str) -> bool {
    status == STATUS_MINT_OK || status == STATUS_PACKAGE_VALID || status == STATUS_IMAGE_VALID
}

fn shorten_middle(value: &str, head: usize, tail: usize) -> String {
    let count = value.chars().count();
    if count <= head + tail + 2 {
        return value.to_string();
    }
    let head_part: String = value.chars().take(head).collect();
    let tail_part: String = value
        .chars()
        .skip(count.saturating_sub(tail))
        .collect();
    format!("{head_part}…{tail_part}")
}

fn format_byte_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format!("{:.1} KB", bytes as f64 / KB as f64);
    }
    format!("{:.2} MB", bytes as f64 / MB as f64)
}

#[cfg(test)]
mod tests {
    use super::{format_byte_size, is_success_status, shorten_middle};
    use crate::controller::events::{UiError, UiErrorCategory, UiErrorContext};
    use mint_core::{STATUS_MINT_FAILED, STATUS_MINT_OK, STATUS_PACKAGE_INVALID};

    #[test]
    fn byte_sizes_scale_units() {
        assert_eq!(format_byte_size(512), "512 B");
        assert_eq!(format_byte_size(2048), "2.0 KB");
        assert_eq!(format_byte_size(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn short_values_are_not_shortened() {
        assert_eq!(shorten_middle("Txn123", 6, 4), "Txn123");
        assert_eq!(
            shorten_middle("0x1234567890abcdef", 6, 4),
            "0x1234…cdef"
        );
    }

    #[test]
    fn success_and_failure_statuses_are_told_apart() {
        assert!(is_success_status(STATUS_MINT_OK));
        assert!(!is_success_status(STATUS_MINT_FAILED));
        assert!(!is_success_status(STATUS_PACKAGE_INVALID));
    }

    #[test]
    fn wallet_failures_are_classified_for_the_banner() {
        let error = UiError::from_message(UiErrorContext::General, "user declined signature");
        assert_eq!(error.category(), UiErrorCategory::Wallet);

        let error = UiError::from_message(UiErrorContext::General, "RPC endpoint unavailable");
        assert_eq!(error.category(), UiErrorCategory::Rpc);

        let error =
            UiError::from_message(UiErrorContext::NetworkSelection, "unknown network: nowhere");
        assert_eq!(error.category(), UiErrorCategory::Validation);

        let error = UiError::from_message(UiErrorContext::General, "connection refused");
        assert_eq!(error.category(), UiErrorCategory::Resource);
    }
}
