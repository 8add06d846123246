//! Incremental discovery over the registry's tender change feed.
//!
//! The feed is walked newest-first, one page at a time, until the first record
//! older than the cutoff shows up, the cursor runs out, or the page ceiling is
//! reached. The HTTP side lives behind [`TenderFeedPort`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{config::SearchSettings, tender::TenderRecord, Result};

/// One page request against the change feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub descending: bool,
    /// Opaque cursor returned with the previous page.
    pub offset: Option<String>,
}

/// One page of the change feed plus the cursor for the next one.
#[derive(Clone, Debug, Default)]
pub struct FeedPage {
    pub records: Vec<TenderRecord>,
    pub next_offset: Option<String>,
}

/// Port for fetching a single feed page (Prozorro over HTTP in production).
#[async_trait]
pub trait TenderFeedPort: Send + Sync {
    async fn fetch_page(&self, req: &PageRequest) -> Result<FeedPage>;
}

/// Bounds applied to one fetch pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedLimits {
    pub page_size: usize,
    pub max_pages: usize,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 50,
        }
    }
}

impl From<&SearchSettings> for FeedLimits {
    fn from(s: &SearchSettings) -> Self {
        Self {
            page_size: s.page_size,
            max_pages: s.max_pages,
        }
    }
}

/// Collect every record modified at or after `cutoff`, newest first.
///
/// Stops at the first record strictly older than `cutoff` without requesting
/// another page. Records without a timestamp are skipped. Reaching
/// `max_pages` returns what was gathered so far; any page failure fails the
/// whole call.
pub async fn fetch_since(
    port: &dyn TenderFeedPort,
    cutoff: DateTime<Utc>,
    limits: FeedLimits,
) -> Result<Vec<TenderRecord>> {
    let mut results = Vec::new();
    let mut offset: Option<String> = None;

    for page_no in 1..=limits.max_pages {
        let req = PageRequest {
            limit: limits.page_size,
            descending: true,
            offset: offset.take(),
        };
        let page = port.fetch_page(&req).await?;
        tracing::debug!(page = page_no, records = page.records.len(), "feed page fetched");

        if page.records.is_empty() {
            return Ok(results);
        }

        for record in page.records {
            let Some(modified) = record.date_modified else {
                tracing::debug!(id = %record.id, "skipping record without dateModified");
                continue;
            };
            if modified < cutoff {
                return Ok(results);
            }
            results.push(record);
        }

        match page.next_offset.filter(|o| !o.is_empty()) {
            Some(next) => offset = Some(next),
            None => return Ok(results),
        }
    }

    tracing::warn!(
        max_pages = limits.max_pages,
        records = results.len(),
        "feed page ceiling reached; returning partial results"
    );
    Ok(results)
}
