use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, de::IgnoredAny, Deserialize, Serialize};
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::cached::{format_age, CachedData};
use super::{Partition, Record, StoreError};

/// Schema marker file at the store root.
const SCHEMA_FILE: &str = "store.json";

/// Current on-disk layout version. There is no migration chain.
pub const SCHEMA_VERSION: u32 = 1;

/// Suffix for in-flight writes; renamed into place once complete.
const TEMP_SUFFIX: &str = ".tmp";

/// Distinguishes temp files of concurrent writers to the same key.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct SchemaMarker {
    schema_version: u32,
}

/// Persistent two-partition key-value store on the local filesystem.
///
/// The store is opened lazily and exactly once; every operation goes
/// through [`CacheStore::ensure_open`], so callers never need to open it
/// explicitly.
pub struct CacheStore {
    root: PathBuf,
    handle: OnceCell<StoreHandle>,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            handle: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open the store, creating the root and partitions if absent.
    /// Repeated and concurrent calls share one handle.
    pub async fn ensure_open(&self) -> Result<StoreHandle, StoreError> {
        self.handle
            .get_or_try_init(|| StoreHandle::open(self.root.clone()))
            .await
            .cloned()
    }

    pub async fn put_many<R: Record>(&self, records: &[R]) -> Result<(), StoreError> {
        self.ensure_open().await?.put_many(records).await
    }

    pub async fn get_all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        self.ensure_open().await?.get_all().await
    }

    pub async fn get_one<R: Record>(&self, id: u32) -> Result<Option<R>, StoreError> {
        self.ensure_open().await?.get_one(id).await
    }

    pub async fn clear(&self, partition: Partition) -> Result<(), StoreError> {
        self.ensure_open().await?.clear(partition).await
    }

    pub async fn stats(&self) -> Result<StoreStats, StoreError> {
        self.ensure_open().await?.stats().await
    }
}

/// An open connection to the store. Clone is cheap.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    root: Arc<PathBuf>,
}

impl StoreHandle {
    async fn open(root: PathBuf) -> Result<Self, StoreError> {
        for partition in Partition::ALL {
            let dir = root.join(partition.dir_name());
            fs::create_dir_all(&dir).await.map_err(|e| {
                StoreError::unavailable(format!("create partition {}", dir.display()), e)
            })?;
        }

        let handle = Self {
            root: Arc::new(root),
        };
        handle.check_schema().await?;
        debug!(root = %handle.root.display(), "Cache store opened");
        Ok(handle)
    }

    /// Write the schema marker on first open; otherwise just compare versions.
    async fn check_schema(&self) -> Result<(), StoreError> {
        let path = self.root.join(SCHEMA_FILE);
        match fs::read(&path).await {
            Ok(bytes) => {
                match serde_json::from_slice::<SchemaMarker>(&bytes) {
                    Ok(marker) if marker.schema_version == SCHEMA_VERSION => {}
                    Ok(marker) => warn!(
                        found = marker.schema_version,
                        expected = SCHEMA_VERSION,
                        "Cache schema version differs, no upgrade needed"
                    ),
                    Err(e) => warn!(error = %e, "Unreadable cache schema marker, ignoring"),
                }
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let marker = SchemaMarker {
                    schema_version: SCHEMA_VERSION,
                };
                let contents = serde_json::to_vec_pretty(&marker)
                    .map_err(|e| StoreError::unavailable("encode schema marker", e))?;
                write_atomic(&path, &contents).await
            }
            Err(e) => Err(StoreError::unavailable("read schema marker", e)),
        }
    }

    fn partition_dir(&self, partition: Partition) -> PathBuf {
        self.root.join(partition.dir_name())
    }

    fn record_path(&self, partition: Partition, id: u32) -> PathBuf {
        self.partition_dir(partition).join(format!("{}.json", id))
    }

    /// Upsert each record by id. Writes are independent: a failed record
    /// does not stop the rest, and the first failure is returned.
    pub async fn put_many<R: Record>(&self, records: &[R]) -> Result<(), StoreError> {
        let dir = self.partition_dir(R::PARTITION);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::unavailable(format!("create partition {}", dir.display()), e))?;

        let mut first_error = None;
        for record in records {
            if let Err(e) = self.put_one(record).await {
                warn!(partition = %R::PARTITION, id = record.id(), error = %e, "Failed to write cache record");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                debug!(partition = %R::PARTITION, count = records.len(), "Cache records written");
                Ok(())
            }
        }
    }

    async fn put_one<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        let path = self.record_path(R::PARTITION, record.id());
        let contents = serde_json::to_vec_pretty(&CachedData::new(record))
            .map_err(|e| StoreError::unavailable(format!("encode {} record {}", R::PARTITION, record.id()), e))?;
        write_atomic(&path, &contents).await
    }

    /// All records of the partition in ascending id order.
    pub async fn get_all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let entries = self.load_partition::<R>(R::PARTITION).await?;
        Ok(entries.into_iter().map(|cached| cached.data).collect())
    }

    pub async fn get_one<R: Record>(&self, id: u32) -> Result<Option<R>, StoreError> {
        let path = self.record_path(R::PARTITION, id);
        Ok(read_entry::<R>(&path).await?.map(|cached| cached.data))
    }

    /// Remove every record in the partition. Clearing an empty or missing
    /// partition is not an error.
    pub async fn clear(&self, partition: Partition) -> Result<(), StoreError> {
        let dir = self.partition_dir(partition);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StoreError::unavailable(format!("clear partition {}", partition), e));
            }
        }
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::unavailable(format!("create partition {}", dir.display()), e))?;
        debug!(%partition, "Cache partition cleared");
        Ok(())
    }

    pub async fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(StoreStats {
            summary: self.partition_stats(Partition::Summary).await?,
            detail: self.partition_stats(Partition::Detail).await?,
        })
    }

    async fn partition_stats(&self, partition: Partition) -> Result<PartitionStats, StoreError> {
        let entries = self.load_partition::<IgnoredAny>(partition).await?;
        Ok(PartitionStats {
            records: entries.len(),
            newest: entries.iter().map(|cached| cached.cached_at).max(),
        })
    }

    /// Read every `<id>.json` entry of a partition, sorted by id.
    async fn load_partition<T: DeserializeOwned>(
        &self,
        partition: Partition,
    ) -> Result<Vec<CachedData<T>>, StoreError> {
        let dir = self.partition_dir(partition);
        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::unavailable(format!("list partition {}", partition), e)),
        };

        let mut ids = Vec::new();
        loop {
            let entry = read_dir
                .next_entry()
                .await
                .map_err(|e| StoreError::unavailable(format!("list partition {}", partition), e))?;
            let Some(entry) = entry else { break };
            if let Some(id) = parse_record_file_name(&entry.file_name().to_string_lossy()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();

        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            // A record removed between listing and reading is simply skipped
            if let Some(cached) = read_entry::<T>(&self.record_path(partition, id)).await? {
                entries.push(cached);
            }
        }
        Ok(entries)
    }
}

async fn read_entry<T: DeserializeOwned>(path: &Path) -> Result<Option<CachedData<T>>, StoreError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::unavailable(format!("read {}", path.display()), e)),
    };
    let cached = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::unavailable(format!("parse {}", path.display()), e))?;
    Ok(Some(cached))
}

/// Write to a sibling temp file and rename it over `path`.
async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.{}{}", file_name, seq, TEMP_SUFFIX));

    if let Err(e) = fs::write(&temp, contents).await {
        return Err(StoreError::unavailable(format!("write {}", temp.display()), e));
    }
    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(StoreError::unavailable(format!("write {}", path.display()), e));
    }
    Ok(())
}

/// `"42.json"` -> `Some(42)`; temp files and anything else -> `None`.
fn parse_record_file_name(name: &str) -> Option<u32> {
    name.strip_suffix(".json")?.parse().ok()
}

/// Record counts and freshness for both partitions.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub summary: PartitionStats,
    pub detail: PartitionStats,
}

#[derive(Debug, Clone, Default)]
pub struct PartitionStats {
    pub records: usize,
    pub newest: Option<DateTime<Utc>>,
}

impl PartitionStats {
    /// Age of the most recent write, or "never" for an empty partition.
    pub fn age_display(&self) -> String {
        self.newest
            .map(format_age)
            .unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
