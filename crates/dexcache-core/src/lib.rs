//! Core library for dexcache.
//!
//! A cache-first client for the PokéAPI: listing and detail lookups are
//! answered from a persistent local store and only go to the network on a
//! miss, writing the result back for next time.
//!
//! - [`cache`]: the two-partition on-disk store
//! - [`api`]: the HTTP client and the `RemoteSource` seam
//! - [`fetcher`]: fetch-or-load orchestration
//! - [`models`]: wire payloads and cached records
//! - [`config`]: configuration file and environment overrides

pub mod api;
pub mod cache;
pub mod config;
pub mod fetcher;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, DetailLocator, RemoteSource};
pub use cache::{CacheStore, Partition, StoreError};
pub use config::Config;
pub use fetcher::{CacheFetcher, LoadError, LoadState, WarmReport, WritePolicy};
pub use models::{DetailRecord, SummaryRecord};
