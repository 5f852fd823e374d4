use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

use crate::models::{DetailRecord, SummaryRecord};

/// A named table inside the cache store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Summary,
    Detail,
}

impl Partition {
    pub const ALL: [Partition; 2] = [Partition::Summary, Partition::Detail];

    /// Directory name under the store root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Partition::Summary => "summary",
            Partition::Detail => "detail",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A value that can live in the cache store, keyed by its numeric id.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const PARTITION: Partition;

    fn id(&self) -> u32;
}

impl Record for SummaryRecord {
    const PARTITION: Partition = Partition::Summary;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Record for DetailRecord {
    const PARTITION: Partition = Partition::Detail;

    fn id(&self) -> u32 {
        self.id
    }
}
