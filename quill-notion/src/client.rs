//! HTTP client for the remote document API.
//!
//! All calls go through one retry loop: transient failures (429, 5xx, or a
//! transport error) sleep on an exponential schedule and try again, up to
//! [`MAX_ATTEMPTS`]; anything else returns immediately as
//! [`NotionError::Http`].

use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use quill_core::{Block, Page};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::NotionError;
use crate::wire::{BlockDto, PageDto, Paginated};

const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
const API_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

const MAX_ATTEMPTS: u32 = 4;
const BACKOFF_BASE_MS: u64 = 500;

/// Delay before the retry that follows attempt `attempt` (1-based).
/// 500ms, 1s, 2s.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS << (attempt - 1).min(8))
}

fn is_transient(status: u16) -> bool {
    status == 429 || status >= 500
}

// ---------------------------------------------------------------------------
// Listing filter
// ---------------------------------------------------------------------------

/// Server-side filter for a database listing.
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    /// Only pages edited at or after this instant.
    pub edited_after: Option<DateTime<Utc>>,
    /// Only pages whose "Sync" checkbox is set.
    pub require_sync: bool,
}

impl PageQuery {
    fn body(&self) -> serde_json::Value {
        let mut conditions = Vec::new();
        if let Some(after) = self.edited_after {
            conditions.push(json!({
                "timestamp": "last_edited_time",
                "last_edited_time": { "on_or_after": after.to_rfc3339() }
            }));
        }
        if self.require_sync {
            conditions.push(json!({
                "property": "Sync",
                "checkbox": { "equals": true }
            }));
        }

        let mut body = json!({
            "sorts": [{ "timestamp": "last_edited_time", "direction": "descending" }],
            "page_size": PAGE_SIZE,
        });
        match conditions.len() {
            0 => {}
            1 => body["filter"] = conditions.remove(0),
            _ => body["filter"] = json!({ "and": conditions }),
        }
        body
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated client for one remote workspace.
pub struct NotionClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl NotionClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Point the client at a different endpoint, for tests against a local
    /// stub server.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// List database pages matching `query`, following cursors until the
    /// server reports no more results. Newest edits come first.
    pub fn query_pages(
        &self,
        database_id: &str,
        query: &PageQuery,
    ) -> Result<Vec<Page>, NotionError> {
        let url = format!("{}/databases/{}/query", self.base_url, database_id);
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut body = query.body();
            if let Some(c) = &cursor {
                body["start_cursor"] = json!(c);
            }
            let batch: Paginated<PageDto> = self.post_json(&url, &body)?;
            pages.extend(batch.results.into_iter().map(PageDto::into_page));
            match (batch.has_more, batch.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }
        debug!(count = pages.len(), "listed pages");
        Ok(pages)
    }

    /// Fetch one page of a block's direct children.
    pub fn list_block_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<(Vec<Block>, Option<String>), NotionError> {
        let mut url = format!(
            "{}/blocks/{}/children?page_size={}",
            self.base_url, block_id, PAGE_SIZE
        );
        if let Some(c) = cursor {
            url.push_str("&start_cursor=");
            url.push_str(c);
        }
        let batch: Paginated<BlockDto> = self.get_json(&url)?;
        let blocks = batch.results.into_iter().map(BlockDto::into_block).collect();
        let next = if batch.has_more { batch.next_cursor } else { None };
        Ok((blocks, next))
    }

    // -- transport ---------------------------------------------------------

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, NotionError> {
        self.execute(url, None)
    }

    fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, NotionError> {
        self.execute(url, Some(body))
    }

    fn execute<T: DeserializeOwned>(
        &self,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, NotionError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = match body {
                Some(_) => self.agent.post(url),
                None => self.agent.get(url),
            }
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Notion-Version", API_VERSION);

            let result = match body {
                Some(json) => request.send_json(json),
                None => request.call(),
            };

            let last = match result {
                Ok(response) => return Ok(response.into_json()?),
                Err(ureq::Error::Status(status, response)) => {
                    if !is_transient(status) {
                        let body = response
                            .into_string()
                            .unwrap_or_else(|_| "(unreadable body)".to_owned());
                        return Err(NotionError::Http { status, body });
                    }
                    format!("HTTP {status}")
                }
                Err(err) => err.to_string(),
            };

            if attempt >= MAX_ATTEMPTS {
                return Err(NotionError::RetriesExhausted {
                    attempts: attempt,
                    last,
                });
            }
            let delay = backoff_delay(attempt);
            warn!(%url, attempt, ?delay, error = %last, "transient failure, retrying");
            thread::sleep(delay);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn backoff_schedule_doubles_from_base() {
        assert_eq!(backoff_delay(1), Duration::from_millis(500));
        assert_eq!(backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3), Duration::from_millis(2000));
    }

    #[test]
    fn transient_statuses() {
        assert!(is_transient(429));
        assert!(is_transient(500));
        assert!(is_transient(503));
        assert!(!is_transient(400));
        assert!(!is_transient(404));
    }

    #[test]
    fn empty_query_has_no_filter() {
        let body = PageQuery::default().body();
        assert!(body.get("filter").is_none());
        assert_eq!(body["page_size"], 100);
    }

    #[test]
    fn single_condition_is_not_wrapped_in_and() {
        let query = PageQuery {
            edited_after: None,
            require_sync: true,
        };
        let body = query.body();
        assert_eq!(body["filter"]["property"], "Sync");
    }

    #[test]
    fn combined_conditions_wrap_in_and() {
        let query = PageQuery {
            edited_after: Some(Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap()),
            require_sync: true,
        };
        let body = query.body();
        let and = body["filter"]["and"].as_array().unwrap();
        assert_eq!(and.len(), 2);
        assert_eq!(and[0]["timestamp"], "last_edited_time");
        assert_eq!(and[1]["property"], "Sync");
    }
}
