use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use shared::{
    domain::NetworkId,
    network::{builtin_networks, NetworkInfo},
};

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use backend_bridge::runtime::{launch, BackendConfig};
use controller::events::UiEvent;
use ui::MintStudioApp;

/// Desktop client for minting NFTs against a published on-chain package.
#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the external wallet bridge service.
    #[arg(long, default_value = "http://127.0.0.1:9327")]
    wallet_url: String,
    /// Network selected at startup.
    #[arg(long, default_value = "mainnet")]
    network: String,
    /// Fullnode RPC override as `<network-id>=<url>`; repeatable. Unknown
    /// ids are added to the directory.
    #[arg(long = "rpc-url", value_name = "NETWORK=URL")]
    rpc_urls: Vec<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let networks = apply_rpc_overrides(builtin_networks(), &args.rpc_urls);
    let config = BackendConfig {
        wallet_url: args.wallet_url,
        networks,
        startup_network: NetworkId::from(args.network),
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    launch(config, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("NFT Mint Studio")
            .with_inner_size([1080.0, 760.0])
            .with_min_inner_size([860.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "NFT Mint Studio",
        options,
        Box::new(move |_cc| Ok(Box::new(MintStudioApp::new(cmd_tx, ui_rx)))),
    )
}

fn apply_rpc_overrides(mut networks: Vec<NetworkInfo>, overrides: &[String]) -> Vec<NetworkInfo> {
    for entry in overrides {
        match entry.split_once('=') {
            Some((id, rpc_url)) if !id.trim().is_empty() && !rpc_url.trim().is_empty() => {
                let id = id.trim();
                match networks.iter_mut().find(|network| network.id.as_str() == id) {
                    Some(network) => network.rpc_url = rpc_url.trim().to_string(),
                    None => networks.push(NetworkInfo::new(id, rpc_url.trim())),
                }
            }
            _ => {
                tracing::warn!(entry = %entry, "ignoring malformed --rpc-url override; expected NETWORK=URL")
            }
        }
    }
    networks
}

#[cfg(test)]
mod tests {
    use super::apply_rpc_overrides;
    use shared::network::builtin_networks;

    #[test]
    fn overrides_replace_known_networks_and_add_unknown_ones() {
        let networks = apply_rpc_overrides(
            builtin_networks(),
            &[
                "localnet=http://127.0.0.1:9124".to_string(),
                "staging=https://fullnode.staging.example:443".to_string(),
                "garbage".to_string(),
            ],
        );

        let localnet = networks
            .iter()
            .find(|n| n.id.as_str() == "localnet")
            .expect("localnet stays in the directory");
        assert_eq!(localnet.rpc_url, "http://127.0.0.1:9124");

        let staging = networks
            .iter()
            .find(|n| n.id.as_str() == "staging")
            .expect("unknown network appended");
        assert_eq!(staging.rpc_url, "https://fullnode.staging.example:443");

        assert_eq!(networks.len(), builtin_networks().len() + 1);
    }
}
