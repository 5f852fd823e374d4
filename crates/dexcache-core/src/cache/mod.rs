//! Local cache store for offline data access.
//!
//! This module provides the `CacheStore`, a persistent key-value store with
//! two partitions keyed by numeric id:
//! - `summary`: listing rows (`SummaryRecord`)
//! - `detail`: per-Pokémon details (`DetailRecord`)
//!
//! Records are stored one JSON file per key, wrapped in a `CachedData`
//! envelope that records when they were written. Nothing is ever evicted;
//! a partition only shrinks through `clear`.

pub mod cached;
pub mod error;
pub mod partition;
pub mod store;

pub use cached::CachedData;
pub use error::StoreError;
pub use partition::{Partition, Record};
pub use store::{CacheStore, PartitionStats, StoreHandle, StoreStats, SCHEMA_VERSION};
