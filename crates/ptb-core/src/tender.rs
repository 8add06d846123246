//! Tender records as they come off the registry change feed.

use chrono::{DateTime, Utc};

pub const TITLE_PLACEHOLDER: &str = "Без назви";
pub const ENTITY_PLACEHOLDER: &str = "—";

/// One change-feed entry.
///
/// Every field except `id` is optional upstream; the accessors below apply the
/// defaulting rules so callers never deal with missing display values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TenderRecord {
    pub id: String,
    /// Human-facing registry number (`UA-2024-...`).
    pub tender_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// `None` when the feed omitted the timestamp or it could not be parsed.
    pub date_modified: Option<DateTime<Utc>>,
    pub procuring_entity_name: Option<String>,
}

impl TenderRecord {
    pub fn title_or_placeholder(&self) -> &str {
        present(&self.title).unwrap_or(TITLE_PLACEHOLDER)
    }

    pub fn entity_or_placeholder(&self) -> &str {
        present(&self.procuring_entity_name).unwrap_or(ENTITY_PLACEHOLDER)
    }

    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn registry_number(&self) -> Option<&str> {
        present(&self.tender_id)
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

/// Parse a registry timestamp (`2024-05-01T12:34:56.123456+03:00`, or with `Z`).
///
/// Returns `None` for anything that is not RFC 3339; such records cannot be
/// placed in time and are skipped by the feed client.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
