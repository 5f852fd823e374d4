use std::sync::{Arc, Mutex, PoisonError};

use futures::stream::{self, StreamExt};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::api::{DetailLocator, RemoteSource};
use crate::cache::{CacheStore, Record};
use crate::models::{DetailRecord, SummaryRecord};

use super::error::FetchFailure;
use super::{LoadError, WritePolicy};

/// Maximum concurrent detail requests while warming the cache.
const MAX_CONCURRENT_REQUESTS: usize = 10;

/// Cache-first loader for the listing and detail views.
pub struct CacheFetcher {
    store: Arc<CacheStore>,
    remote: Arc<dyn RemoteSource>,
    policy: WritePolicy,
    pending: Mutex<JoinSet<()>>,
}

/// Outcome of [`CacheFetcher::warm_details`], ids in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmReport {
    pub loaded: Vec<u32>,
    pub failed: Vec<u32>,
}

impl CacheFetcher {
    pub fn new(store: Arc<CacheStore>, remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            store,
            remote,
            policy: WritePolicy::default(),
            pending: Mutex::new(JoinSet::new()),
        }
    }

    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Load the listing: cached summaries if there are any, otherwise the
    /// remote listing numbered 1..=N in order.
    pub async fn load_collection(&self) -> Result<Vec<SummaryRecord>, LoadError> {
        self.try_load_collection().await.map_err(|cause| {
            warn!(error = %cause, "Failed to load listing");
            LoadError::Collection
        })
    }

    async fn try_load_collection(&self) -> Result<Vec<SummaryRecord>, FetchFailure> {
        let cached = self.store.get_all::<SummaryRecord>().await?;
        if !cached.is_empty() {
            debug!(count = cached.len(), "Listing loaded from cache");
            return Ok(cached);
        }

        let listing = self
            .remote
            .fetch_listing()
            .await
            .map_err(FetchFailure::RemoteUnavailable)?;
        let records = listing.into_records();

        self.write_back(records.clone()).await?;
        info!(count = records.len(), "Listing fetched from API and saved to cache");
        Ok(records)
    }

    /// Load one detail record by id, going to the remote source on a miss.
    pub async fn load_detail(&self, id: u32) -> Result<DetailRecord, LoadError> {
        self.try_load_detail(id).await.map_err(|cause| {
            warn!(id, error = %cause, "Failed to load detail");
            LoadError::Detail { id }
        })
    }

    async fn try_load_detail(&self, id: u32) -> Result<DetailRecord, FetchFailure> {
        if let Some(record) = self.store.get_one::<DetailRecord>(id).await? {
            debug!(id, "Detail loaded from cache");
            return Ok(record);
        }

        let locator = match self.store.get_one::<SummaryRecord>(id).await? {
            Some(summary) => DetailLocator::for_summary(&summary),
            None => DetailLocator::Id(id),
        };

        let payload = self
            .remote
            .fetch_detail(&locator)
            .await
            .map_err(FetchFailure::RemoteUnavailable)?;
        if payload.id != id {
            warn!(id, remote_id = payload.id, "Remote id differs from requested id, keeping requested id");
        }
        let record = payload.into_record(id);

        self.write_back(vec![record.clone()]).await?;
        info!(id, name = %record.name, "Detail fetched from API and saved to cache");
        Ok(record)
    }

    /// Resolve the listing, then make sure every listed entry has a cached
    /// detail record.
    pub async fn warm_details(&self) -> Result<WarmReport, LoadError> {
        let summaries = self.load_collection().await?;
        // Detail lookups follow the cached summary's source_ref
        self.settle().await;

        let results: Vec<(u32, Result<DetailRecord, LoadError>)> =
            stream::iter(summaries.iter().map(|summary| summary.id))
                .map(|id| async move { (id, self.load_detail(id).await) })
                .buffer_unordered(MAX_CONCURRENT_REQUESTS)
                .collect()
                .await;

        let mut report = WarmReport::default();
        for (id, result) in results {
            match result {
                Ok(_) => report.loaded.push(id),
                Err(_) => report.failed.push(id),
            }
        }
        report.loaded.sort_unstable();
        report.failed.sort_unstable();

        info!(loaded = report.loaded.len(), failed = report.failed.len(), "Detail cache warmed");
        Ok(report)
    }

    async fn write_back<R: Record>(&self, records: Vec<R>) -> Result<(), FetchFailure> {
        match self.policy {
            WritePolicy::Awaited => Ok(self.store.put_many(&records).await?),
            WritePolicy::Detached => {
                let store = Arc::clone(&self.store);
                let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
                // Reap writes that already finished
                while pending.try_join_next().is_some() {}
                pending.spawn(async move {
                    if let Err(e) = store.put_many(&records).await {
                        warn!(partition = %R::PARTITION, error = %e, "Background cache write failed");
                    }
                });
                Ok(())
            }
        }
    }

    /// Number of detached writes not yet awaited by [`settle`](Self::settle).
    pub fn pending_writes(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait for every detached cache write spawned so far.
    pub async fn settle(&self) {
        let mut tasks = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Background cache write task panicked or was cancelled");
            }
        }
    }
}

impl Drop for CacheFetcher {
    fn drop(&mut self) {
        // Unsettled writes keep running on the runtime instead of being aborted
        self.pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .detach_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DetailPayload, ListingEntry, ListingResponse, Sprites};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FlakyRemote {
        fail: bool,
        remote_id_offset: u32,
        /// Replaced with a regular file once the listing is requested,
        /// so the cache read succeeds and the write-back fails.
        break_partition: Option<PathBuf>,
        listing_calls: AtomicUsize,
        detail_calls: Mutex<Vec<DetailLocator>>,
    }

    #[async_trait]
    impl RemoteSource for FlakyRemote {
        async fn fetch_listing(&self) -> Result<ListingResponse> {
            self.listing_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("connection refused");
            }
            if let Some(path) = &self.break_partition {
                std::fs::remove_dir_all(path)?;
                std::fs::write(path, b"not a directory")?;
            }
            Ok(ListingResponse {
                count: 2,
                next: None,
                previous: None,
                results: vec![
                    ListingEntry { name: "bulbasaur".into(), url: "https://pokeapi.test/pokemon/1/".into() },
                    ListingEntry { name: "ivysaur".into(), url: "https://pokeapi.test/pokemon/2/".into() },
                ],
            })
        }

        async fn fetch_detail(&self, locator: &DetailLocator) -> Result<DetailPayload> {
            self.detail_calls.lock().unwrap().push(locator.clone());
            if self.fail {
                anyhow::bail!("connection refused");
            }
            let id = match locator {
                DetailLocator::Id(id) => *id,
                DetailLocator::Url(url) => url
                    .trim_end_matches('/')
                    .rsplit('/')
                    .next()
                    .and_then(|s| s.parse().ok())
                    .unwrap(),
            };
            Ok(DetailPayload {
                id: id + self.remote_id_offset,
                name: format!("pokemon-{}", id),
                height: id,
                weight: id * 10,
                sprites: Sprites { front_default: None },
            })
        }
    }

    fn fetcher(dir: &std::path::Path, remote: Arc<FlakyRemote>) -> CacheFetcher {
        CacheFetcher::new(Arc::new(CacheStore::new(dir)), remote)
    }

    #[tokio::test]
    async fn test_remote_failure_is_generic_collection_error() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FlakyRemote { fail: true, ..Default::default() });
        let fetcher = fetcher(dir.path(), remote.clone());

        let err = fetcher.load_collection().await.unwrap_err();
        assert_eq!(err, LoadError::Collection);
        assert_eq!(err.to_string(), "Failed to load Pokémon data");
        assert_eq!(fetcher.pending_writes(), 0);

        let err = fetcher.load_detail(3).await.unwrap_err();
        assert_eq!(err, LoadError::Detail { id: 3 });
        assert_eq!(err.to_string(), "Failed to load Pokémon details");
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic_error_without_remote_call() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("file");
        std::fs::write(&root, b"x").unwrap();
        let remote = Arc::new(FlakyRemote::default());
        let fetcher = fetcher(&root, remote.clone());

        assert_eq!(fetcher.load_collection().await, Err(LoadError::Collection));
        assert_eq!(remote.listing_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_awaited_policy_writes_before_resolving() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FlakyRemote::default());
        let fetcher = fetcher(dir.path(), remote.clone()).with_write_policy(WritePolicy::Awaited);

        fetcher.load_collection().await.unwrap();
        assert_eq!(fetcher.pending_writes(), 0);
        assert_eq!(fetcher.store().get_all::<SummaryRecord>().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_detached_policy_tracks_pending_writes() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FlakyRemote::default());
        let fetcher = fetcher(dir.path(), remote.clone());

        fetcher.load_detail(1).await.unwrap();
        assert!(fetcher.pending_writes() <= 1);

        fetcher.settle().await;
        assert_eq!(fetcher.pending_writes(), 0);
        assert!(fetcher.store().get_one::<DetailRecord>(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_detail_follows_cached_summary_locator() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FlakyRemote::default());
        let fetcher = fetcher(dir.path(), remote.clone()).with_write_policy(WritePolicy::Awaited);

        fetcher.load_detail(2).await.unwrap();
        fetcher.load_collection().await.unwrap();
        fetcher.store().clear(crate::cache::Partition::Detail).await.unwrap();
        fetcher.load_detail(2).await.unwrap();

        let calls = remote.detail_calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                DetailLocator::Id(2),
                DetailLocator::Url("https://pokeapi.test/pokemon/2/".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_detail_is_keyed_by_requested_id() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FlakyRemote { remote_id_offset: 100, ..Default::default() });
        let fetcher = fetcher(dir.path(), remote.clone()).with_write_policy(WritePolicy::Awaited);

        let record = fetcher.load_detail(5).await.unwrap();
        assert_eq!(record.id, 5);
        assert!(fetcher.store().get_one::<DetailRecord>(105).await.unwrap().is_none());
        assert_eq!(fetcher.store().get_one::<DetailRecord>(5).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_warm_details_loads_every_listed_entry() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FlakyRemote::default());
        let fetcher = fetcher(dir.path(), remote.clone());

        let report = fetcher.warm_details().await.unwrap();
        assert_eq!(report, WarmReport { loaded: vec![1, 2], failed: vec![] });

        fetcher.settle().await;
        assert_eq!(fetcher.store().get_all::<DetailRecord>().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_warm_details_follows_listing_urls() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FlakyRemote::default());
        let fetcher = fetcher(dir.path(), remote.clone());

        fetcher.warm_details().await.unwrap();

        let mut calls = remote.detail_calls.lock().unwrap().clone();
        calls.sort_by_key(|locator| format!("{:?}", locator));
        assert_eq!(
            calls,
            vec![
                DetailLocator::Url("https://pokeapi.test/pokemon/1/".into()),
                DetailLocator::Url("https://pokeapi.test/pokemon/2/".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_fetcher_still_completes_detached_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CacheStore::new(dir.path()));
        let fetcher = CacheFetcher::new(Arc::clone(&store), Arc::new(FlakyRemote::default()));

        assert_eq!(fetcher.load_collection().await.unwrap().len(), 2);
        drop(fetcher);

        let mut cached = Vec::new();
        for _ in 0..1000 {
            cached = store.get_all::<SummaryRecord>().await.unwrap();
            if cached.len() == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].name, "bulbasaur");
    }

    #[tokio::test]
    async fn test_failed_detached_write_does_not_fail_request() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FlakyRemote {
            break_partition: Some(dir.path().join("summary")),
            ..Default::default()
        });
        let fetcher = fetcher(dir.path(), remote.clone());

        let records = fetcher.load_collection().await.unwrap();
        assert_eq!(records.len(), 2);

        fetcher.settle().await;
        assert_eq!(fetcher.pending_writes(), 0);
        assert!(dir.path().join("summary").is_file());
    }

    #[tokio::test]
    async fn test_failed_awaited_write_fails_request() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(FlakyRemote {
            break_partition: Some(dir.path().join("summary")),
            ..Default::default()
        });
        let fetcher = fetcher(dir.path(), remote.clone()).with_write_policy(WritePolicy::Awaited);

        assert_eq!(fetcher.load_collection().await, Err(LoadError::Collection));
        assert_eq!(remote.listing_calls.load(Ordering::SeqCst), 1);
    }
}
