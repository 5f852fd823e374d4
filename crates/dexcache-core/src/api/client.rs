//! API client for communicating with the PokéAPI REST API.
//!
//! This module provides the `ApiClient` struct for fetching the Pokémon
//! listing and individual Pokémon details. The API is public and needs no
//! authentication.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::models::{DetailPayload, ListingResponse};

use super::{ApiError, DetailLocator, RemoteSource};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for PokéAPI v2
pub const DEFAULT_API_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Number of entries requested from the listing endpoint.
pub const DEFAULT_LISTING_LIMIT: u32 = 20;

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("dexcache/", env!("CARGO_PKG_VERSION"));

/// API client for PokéAPI.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    listing_limit: u32,
}

impl ApiClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_settings(
            &config.api_base_url,
            config.listing_limit,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_settings(base_url: &str, listing_limit: u32, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            listing_limit,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn listing_url(&self) -> String {
        format!("{}/pokemon?limit={}", self.base_url, self.listing_limit)
    }

    fn detail_url(&self, locator: &DetailLocator) -> String {
        match locator {
            DetailLocator::Id(id) => format!("{}/pokemon/{}", self.base_url, id),
            DetailLocator::Url(url) => url.clone(),
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        let body = response
            .text()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to read response body from {}", url))?;

        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url, e)).into())
    }

    /// Fetch the first page of the Pokémon listing
    pub async fn fetch_listing(&self) -> Result<ListingResponse> {
        let url = self.listing_url();
        let listing: ListingResponse = self.get(&url).await?;
        debug!(count = listing.count, results = listing.results.len(), "Fetched listing");
        Ok(listing)
    }

    /// Fetch the details of a single Pokémon
    pub async fn fetch_detail(&self, locator: &DetailLocator) -> Result<DetailPayload> {
        let url = self.detail_url(locator);
        let detail: DetailPayload = self.get(&url).await?;
        debug!(id = detail.id, name = %detail.name, "Fetched detail");
        Ok(detail)
    }
}

#[async_trait]
impl RemoteSource for ApiClient {
    async fn fetch_listing(&self) -> Result<ListingResponse> {
        ApiClient::fetch_listing(self).await
    }

    async fn fetch_detail(&self, locator: &DetailLocator) -> Result<DetailPayload> {
        ApiClient::fetch_detail(self, locator).await
    }
}
