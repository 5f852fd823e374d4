//! Data models for PokéAPI entities.
//!
//! This module contains both the wire payloads returned by the API and the
//! records we persist in the local cache:
//!
//! - `ListingResponse`, `ListingEntry`: the `/pokemon` listing page
//! - `SummaryRecord`: a cached listing row
//! - `DetailPayload`, `Sprites`: the `/pokemon/{id}` payload
//! - `DetailRecord`: a cached detail entry

pub mod detail;
pub mod summary;

pub use detail::{DetailPayload, DetailRecord, Sprites};
pub use summary::{ListingEntry, ListingResponse, SummaryRecord};
