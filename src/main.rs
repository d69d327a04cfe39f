mod config;
mod filter;
mod filter_file;
mod ninja;
mod prices;
mod updater;

use anyhow::Context;
use futures::StreamExt;
use ninja::NinjaClient;
use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook_tokio::Signals;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use updater::FilterUpdater;

const DEFAULT_CONFIG_PATH: &str = "config.txt";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with env-declared filters.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "poe_autofilter=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    tracing::info!("Starting poe-autofilter");

    // The config file is the first commandline argument. It gets re-read on every update.
    let config_path: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
        .into();
    if config::ensure_config_file(&config_path)? {
        tracing::warn!(
            "Set FilePath and League in {} before the next update",
            config_path.display()
        );
    }
    tracing::info!("Using configuration file {}", config_path.display());

    //
    // Spawn our updater task.
    let client = NinjaClient::new()?;
    let updater = FilterUpdater::new(config_path, client);
    let updater_handle = tokio::spawn(async move { updater.launch().await });

    //
    // Handle signals.
    let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT])
        .context("Failed to register signal handlers")?;

    // Sends a message to shutdown_recv if any of the signals are received.
    let (shutdown_send, shutdown_recv) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        while let Some(signal) = signals.next().await {
            match signal {
                SIGTERM | SIGINT | SIGQUIT => {
                    // The receiver only goes away once main is already returning.
                    shutdown_send.send(()).ok();
                    break;
                }
                _ => unreachable!(),
            }
        }
    });

    //
    // Wait for a signal, or for the updater to exit prematurely.
    tokio::select! {
        _ = shutdown_recv => tracing::info!("Received stop signal, shutting down"),
        _ = updater_handle => tracing::error!("Filter updater stopped unexpectedly, shutting down"),
    }

    Ok(())
}
