//! REST API client module for PokéAPI.
//!
//! This module provides the `ApiClient` for fetching the Pokémon listing
//! and per-Pokémon details, and the `RemoteSource` trait the fetcher uses
//! so the network side can be swapped out in tests.

pub mod client;
pub mod error;
pub mod source;

pub use client::ApiClient;
pub use error::ApiError;
pub use source::{DetailLocator, RemoteSource};
