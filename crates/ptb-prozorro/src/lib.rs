//! Prozorro adapter (public tender change feed).
//!
//! Implements the `ptb-core` feed port over `GET {base}/tenders`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use ptb_core::{
    config::SearchSettings,
    errors::Error,
    feed::{FeedPage, PageRequest, TenderFeedPort},
    tender::{parse_timestamp, TenderRecord},
    Result,
};

/// Field projection requested for every page.
pub const OPT_FIELDS: &str = "id,tenderID,title,description,dateModified,procuringEntity";

#[derive(Clone, Debug)]
pub struct ProzorroClient {
    base_url: String,
    http: reqwest::Client,
}

impl ProzorroClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ptb/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        Self::new(settings.api_base_url.clone(), settings.request_timeout)
    }

    pub fn tenders_url(&self) -> String {
        format!("{}/tenders", self.base_url)
    }

    fn query(req: &PageRequest) -> Vec<(&'static str, String)> {
        let mut q = vec![
            ("opt_fields", OPT_FIELDS.to_string()),
            ("limit", req.limit.to_string()),
        ];
        if req.descending {
            q.push(("descending", "1".to_string()));
        }
        if let Some(offset) = &req.offset {
            q.push(("offset", offset.clone()));
        }
        q
    }
}

#[async_trait]
impl TenderFeedPort for ProzorroClient {
    async fn fetch_page(&self, req: &PageRequest) -> Result<FeedPage> {
        tracing::debug!(offset = ?req.offset, limit = req.limit, "requesting tender page");
        let resp = self
            .http
            .get(self.tenders_url())
            .query(&Self::query(req))
            .send()
            .await
            .map_err(map_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "prozorro returned non-success status");
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body = resp.text().await.map_err(map_transport)?;
        decode_page(status.as_u16(), &body)
    }
}

fn map_transport(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Network(format!("prozorro request timed out: {e}"))
    } else {
        Error::Network(format!("prozorro request failed: {e}"))
    }
}

#[derive(Debug, Deserialize)]
struct PageDto {
    #[serde(default)]
    data: Vec<TenderDto>,
    #[serde(default)]
    next_page: Option<NextPageDto>,
}

#[derive(Debug, Deserialize)]
struct NextPageDto {
    #[serde(default)]
    offset: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TenderDto {
    #[serde(default)]
    id: String,
    #[serde(rename = "tenderID", default)]
    tender_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    // Kept loose so one odd value skips the record instead of failing the page.
    #[serde(rename = "dateModified", default)]
    date_modified: Option<serde_json::Value>,
    #[serde(rename = "procuringEntity", default)]
    procuring_entity: Option<EntityDto>,
}

#[derive(Debug, Deserialize)]
struct EntityDto {
    #[serde(default)]
    name: Option<String>,
}

impl From<TenderDto> for TenderRecord {
    fn from(t: TenderDto) -> Self {
        TenderRecord {
            id: t.id,
            tender_id: t.tender_id,
            title: t.title,
            description: t.description,
            date_modified: t
                .date_modified
                .as_ref()
                .and_then(|v| v.as_str())
                .and_then(parse_timestamp),
            procuring_entity_name: t.procuring_entity.and_then(|e| e.name),
        }
    }
}

/// Decode one `/tenders` response body.
pub fn decode_page(status: u16, body: &str) -> Result<FeedPage> {
    let page: PageDto = serde_json::from_str(body).map_err(|e| Error::Upstream {
        status,
        message: format!("invalid tender page: {e}"),
    })?;

    let next_offset = page
        .next_page
        .and_then(|n| n.offset)
        .and_then(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty());

    Ok(FeedPage {
        records: page.data.into_iter().map(TenderRecord::from).collect(),
        next_offset,
    })
}
