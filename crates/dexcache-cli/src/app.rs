//! Composition root for the dexcache CLI.
//!
//! `App` owns the configuration, opens the cache store once, and wires the
//! store and the API client into a `CacheFetcher`. Every command goes
//! through it, and `shutdown` waits for outstanding cache writes.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use dexcache_core::cache::StoreStats;
use dexcache_core::{
    ApiClient, CacheFetcher, CacheStore, Config, DetailRecord, LoadError, LoadState, Partition,
    SummaryRecord, WarmReport,
};

pub struct App {
    config: Config,
    fetcher: CacheFetcher,
}

impl App {
    /// Build the store and API client from config and open the store.
    pub async fn open(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        debug!(?cache_dir, "Cache directory configured");

        let store = Arc::new(CacheStore::new(cache_dir));
        store
            .ensure_open()
            .await
            .with_context(|| format!("Failed to open cache at {}", store.root().display()))?;

        let api = ApiClient::from_config(&config)?;
        debug!(base_url = api.base_url(), "API client configured");

        let fetcher =
            CacheFetcher::new(store, Arc::new(api)).with_write_policy(config.write_policy());

        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn list(&self) -> LoadState<Vec<SummaryRecord>> {
        self.fetcher.load_collection().await.into()
    }

    pub async fn show(&self, id: u32) -> LoadState<DetailRecord> {
        self.fetcher.load_detail(id).await.into()
    }

    pub async fn warm(&self) -> Result<WarmReport, LoadError> {
        self.fetcher.warm_details().await
    }

    pub async fn status(&self) -> Result<StoreStats> {
        Ok(self.fetcher.store().stats().await?)
    }

    pub async fn clear(&self, partitions: &[Partition]) -> Result<()> {
        for partition in partitions {
            self.fetcher
                .store()
                .clear(*partition)
                .await
                .with_context(|| format!("Failed to clear {} cache", partition))?;
            info!(%partition, "Cache cleared");
        }
        Ok(())
    }

    /// Wait for detached cache writes so nothing is lost on exit.
    pub async fn shutdown(self) {
        let pending = self.fetcher.pending_writes();
        if pending > 0 {
            debug!(pending, "Waiting for cache writes");
        }
        self.fetcher.settle().await;
    }
}
