use serde::{Deserialize, Serialize};

/// One page of the `/pokemon` listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingResponse {
    pub count: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<ListingEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub name: String,
    pub url: String,
}

/// A cached listing row.
///
/// `id` is the 1-based position in the listing and is the key used for
/// both the summary and the detail partition. `source_ref` is the locator
/// the listing gave us for the detail resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: u32,
    pub name: String,
    #[serde(rename = "url")]
    pub source_ref: String,
}

impl ListingResponse {
    /// Map the listing into summary records, numbering them 1..=N in
    /// listing order.
    pub fn into_records(self) -> Vec<SummaryRecord> {
        self.results
            .into_iter()
            .zip(1u32..)
            .map(|(entry, id)| SummaryRecord {
                id,
                name: entry.name,
                source_ref: entry.url,
            })
            .collect()
    }
}
