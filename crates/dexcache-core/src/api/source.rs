use anyhow::Result;
use async_trait::async_trait;

use crate::models::{DetailPayload, ListingResponse, SummaryRecord};

/// Where to fetch a detail payload from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailLocator {
    /// Resolve against the API base URL as `/pokemon/{id}`.
    Id(u32),
    /// An absolute URL handed out by the listing.
    Url(String),
}

impl DetailLocator {
    /// Follow the summary's locator when it is an absolute http(s) URL,
    /// otherwise fall back to the summary id.
    pub fn for_summary(summary: &SummaryRecord) -> Self {
        let source = summary.source_ref.as_str();
        if source.starts_with("https://") || source.starts_with("http://") {
            DetailLocator::Url(summary.source_ref.clone())
        } else {
            DetailLocator::Id(summary.id)
        }
    }
}

/// Read-only access to the remote listing and detail endpoints.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_listing(&self) -> Result<ListingResponse>;

    async fn fetch_detail(&self, locator: &DetailLocator) -> Result<DetailPayload>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_for_summary() {
        let mut summary = SummaryRecord {
            id: 4,
            name: "charmander".into(),
            source_ref: "https://pokeapi.co/api/v2/pokemon/4/".into(),
        };
        assert_eq!(
            DetailLocator::for_summary(&summary),
            DetailLocator::Url("https://pokeapi.co/api/v2/pokemon/4/".into())
        );

        summary.source_ref = "u4".into();
        assert_eq!(DetailLocator::for_summary(&summary), DetailLocator::Id(4));
    }
}
