//! Periodic filter updater.

use anyhow::{Context, bail};

use crate::{
    config::{self, Config},
    filter::{self, NameFilter},
    filter_file,
    ninja::NinjaClient,
    prices::ReferencePrices,
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub const UPDATE_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Wait after a failed update.
pub const RETRY_DELAY: Duration = Duration::from_secs(60);

pub struct FilterUpdater {
    config_path: PathBuf,
    client: NinjaClient,
    interval: Duration,
    retry_delay: Duration,
}

impl FilterUpdater {
    pub fn new(config_path: PathBuf, client: NinjaClient) -> Self {
        Self {
            config_path,
            client,
            interval: UPDATE_INTERVAL,
            retry_delay: RETRY_DELAY,
        }
    }

    // Launches the periodic filter updater. The first update runs immediately.
    pub async fn launch(self) {
        tracing::info!(
            "Starting filter updater with interval of {} seconds",
            self.interval.as_secs()
        );

        loop {
            tracing::debug!("[filter_updater]: Updating filter");
            let result = self.update().await;
            if let Err(error) = &result {
                tracing::warn!(
                    "Filter update failed, retrying in {} seconds: {error:#}",
                    self.retry_delay.as_secs()
                );
            }

            tokio::time::sleep(self.next_delay(&result)).await;
        }
    }

    /// How long to wait before the next update.
    fn next_delay(&self, result: &anyhow::Result<()>) -> Duration {
        match result {
            Ok(()) => self.interval,
            Err(_) => self.retry_delay,
        }
    }

    /// Runs one update: config, prices, rules, file.
    pub async fn update(&self) -> anyhow::Result<()> {
        // The config is re-read every cycle so edits apply without a restart.
        config::ensure_config_file(&self.config_path)?;
        let config = Config::load(&self.config_path)?;
        if config.file_path.is_empty() {
            bail!("No FilePath set in {}", self.config_path.display());
        }

        tracing::info!("Fetching prices for league {:?}", config.league);
        let table = self.client.fetch_price_table(&config.league).await?;

        let prices = ReferencePrices::from_table(&table);
        tracing::info!(
            "Current prices: chaos {}c, exalted {}c, divine {}c",
            prices.chaos,
            prices.exalted,
            prices.divine
        );

        let names = NameFilter::from(&config);
        if !names.is_enabled() {
            tracing::debug!("Name filtering disabled");
        }
        let blocks = filter::generate_blocks(&config, &table, &prices, &names);
        let rules = filter::render_blocks(&blocks);

        let file_path = Path::new(&config.file_path);
        filter_file::update_filter_file(file_path, &[&config.override_text, &rules])
            .with_context(|| format!("Failed to update filter file {}", file_path.display()))?;

        tracing::info!(
            "Wrote {} rules for {} priced items to {}",
            blocks.len(),
            table.len(),
            file_path.display()
        );

        Ok(())
    }
}
