use thiserror::Error;

use crate::cache::StoreError;

/// The only failure a caller ever sees. The underlying cause is logged
/// where it happens and deliberately not carried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Failed to load Pokémon data")]
    Collection,

    #[error("Failed to load Pokémon details")]
    Detail { id: u32 },
}

/// Why a miss path failed.
#[derive(Error, Debug)]
pub(crate) enum FetchFailure {
    #[error(transparent)]
    StorageUnavailable(#[from] StoreError),

    #[error("Remote unavailable: {0:#}")]
    RemoteUnavailable(anyhow::Error),
}
