//! Fetch-or-load orchestration.
//!
//! `CacheFetcher` answers listing and detail requests from the local cache
//! and only calls the remote API on a miss, writing the result back. Both
//! the store and the remote source are injected by the caller.

pub mod cache_fetcher;
pub mod error;
pub mod state;

pub use cache_fetcher::{CacheFetcher, WarmReport};
pub use error::LoadError;
pub use state::LoadState;

/// How a miss-path result is written back to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Spawn the write and resolve immediately. `CacheFetcher::settle`
    /// waits for outstanding writes.
    #[default]
    Detached,
    /// Finish the write before resolving; a failed write fails the request.
    Awaited,
}
