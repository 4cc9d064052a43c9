//! HTTP client for the CMS collection API.
//!
//! Implements [`Collection`] over the v2 item endpoints. Listing is
//! paginated by offset; `find_by_source_id` scans the whole collection
//! because the API has no server-side filter on custom fields.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::CmsError;
use crate::fields::ItemFields;
use crate::upsert::{Collection, ItemRef};

const DEFAULT_BASE_URL: &str = "https://api.webflow.com/v2";
const LIST_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct ItemDto {
    id: String,
    #[serde(default, rename = "fieldData")]
    field_data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ItemListDto {
    #[serde(default)]
    items: Vec<ItemDto>,
}

/// Authenticated client scoped to one collection.
pub struct CmsClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
    collection_id: String,
}

impl CmsClient {
    pub fn new(token: impl Into<String>, collection_id: impl Into<String>) -> Self {
        Self::with_base_url(token, collection_id, DEFAULT_BASE_URL)
    }

    /// Point the client at a different endpoint, for tests against a local
    /// stub server.
    pub fn with_base_url(
        token: impl Into<String>,
        collection_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: base_url.into(),
            token: token.into(),
            collection_id: collection_id.into(),
        }
    }

    fn items_url(&self) -> String {
        format!("{}/collections/{}/items", self.base_url, self.collection_id)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/json")
    }

    fn check<T: serde::de::DeserializeOwned>(
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<T, CmsError> {
        match result {
            Ok(response) => Ok(response.into_json()?),
            Err(ureq::Error::Status(status, response)) => {
                let body = response
                    .into_string()
                    .unwrap_or_else(|_| "(unreadable body)".to_owned());
                Err(CmsError::Http { status, body })
            }
            Err(err) => Err(CmsError::Transport(err.to_string())),
        }
    }
}

impl Collection for CmsClient {
    fn find_by_source_id(&self, source_id: &str) -> Result<Vec<ItemRef>, CmsError> {
        let mut matches = Vec::new();
        let mut offset = 0u32;
        loop {
            let url = format!(
                "{}?limit={}&offset={}",
                self.items_url(),
                LIST_LIMIT,
                offset
            );
            let batch: ItemListDto = Self::check(self.request("GET", &url).call())?;
            let count = batch.items.len();
            for item in batch.items {
                if item.field_data.get("source-id").and_then(|v| v.as_str()) == Some(source_id) {
                    matches.push(ItemRef { id: item.id });
                }
            }
            if count < LIST_LIMIT as usize {
                break;
            }
            offset += LIST_LIMIT;
        }
        debug!(source_id, count = matches.len(), "scanned collection");
        Ok(matches)
    }

    fn create_item(&self, fields: &ItemFields) -> Result<ItemRef, CmsError> {
        let body = json!({ "fieldData": fields.to_field_data() });
        let item: ItemDto = Self::check(self.request("POST", &self.items_url()).send_json(body))?;
        Ok(ItemRef { id: item.id })
    }

    fn update_item(&self, item_id: &str, fields: &ItemFields) -> Result<(), CmsError> {
        let url = format!("{}/{}", self.items_url(), item_id);
        let body = json!({ "fieldData": fields.to_field_data() });
        let _: serde_json::Value = Self::check(self.request("PATCH", &url).send_json(body))?;
        Ok(())
    }

    fn publish_item(&self, item_id: &str) -> Result<(), CmsError> {
        let url = format!("{}/publish", self.items_url());
        let body = json!({ "itemIds": [item_id] });
        let _: serde_json::Value = Self::check(self.request("POST", &url).send_json(body))?;
        Ok(())
    }
}
