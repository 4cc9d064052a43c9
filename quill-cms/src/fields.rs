//! Mapping from a page to CMS collection fields.

use chrono::NaiveDate;
use quill_core::Page;
use serde_json::json;

/// The field set written on every create and update. Field keys match the
/// collection schema's slugs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields {
    pub name: String,
    pub slug: String,
    /// The remote page id, the upsert identity key.
    pub source_id: String,
    pub author: Option<String>,
    pub publish_date: Option<NaiveDate>,
    /// Rendered HTML body.
    pub post_body: String,
}

impl ItemFields {
    /// Build the field set for `page` with its already-rendered HTML body.
    /// The slug comes from the page's explicit slug property when present,
    /// otherwise it is derived from the title; the publish date falls back
    /// to the page's last edit date.
    pub fn from_page(page: &Page, body_html: &str) -> Self {
        let slug = page
            .properties
            .slug
            .clone()
            .unwrap_or_else(|| slugify(&page.title));
        let publish_date = page
            .properties
            .publish_date
            .unwrap_or_else(|| page.last_edited_time.date_naive());
        Self {
            name: page.title.clone(),
            slug,
            source_id: page.id.to_string(),
            author: page.properties.author.clone(),
            publish_date: Some(publish_date),
            post_body: body_html.to_owned(),
        }
    }

    /// The `fieldData` object for create/update payloads. Optional fields
    /// are omitted rather than sent as null.
    pub fn to_field_data(&self) -> serde_json::Value {
        let mut data = json!({
            "name": self.name,
            "slug": self.slug,
            "source-id": self.source_id,
            "post-body": self.post_body,
        });
        if let Some(author) = &self.author {
            data["author"] = json!(author);
        }
        if let Some(date) = self.publish_date {
            data["publish-date"] = json!(date.format("%Y-%m-%d").to_string());
        }
        data
    }
}

/// Derive a URL slug from a title: lowercase, runs of non-alphanumerics
/// collapse to single hyphens, no leading or trailing hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
