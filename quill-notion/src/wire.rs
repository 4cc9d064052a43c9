//! Serde DTOs for the remote document API's JSON shapes.
//!
//! The API wraps every payload in a per-type envelope (a `paragraph` block
//! carries its text under a `"paragraph"` key, and so on), so the DTOs here
//! mirror that nesting and then flatten into the `quill-core` model in the
//! `into_*` conversions. Everything the converters do not consume is dropped
//! at this boundary.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use quill_core::{Block, BlockId, BlockKind, Page, PageId, PageProperties, RichTextRun};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Pagination envelope
// ---------------------------------------------------------------------------

/// One page of a paginated listing response.
#[derive(Debug, Deserialize)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// Rich text
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RichTextDto {
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: AnnotationsDto,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnnotationsDto {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub code: bool,
}

impl RichTextDto {
    fn into_run(self) -> RichTextRun {
        RichTextRun {
            text: self.plain_text,
            bold: self.annotations.bold,
            italic: self.annotations.italic,
            strikethrough: self.annotations.strikethrough,
            code: self.annotations.code,
            href: self.href,
        }
    }
}

fn into_runs(dtos: Vec<RichTextDto>) -> Vec<RichTextRun> {
    dtos.into_iter().map(RichTextDto::into_run).collect()
}

fn runs_plain(dtos: &[RichTextDto]) -> String {
    dtos.iter().map(|r| r.plain_text.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct RichTextPayload {
    #[serde(default)]
    pub rich_text: Vec<RichTextDto>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ToDoPayload {
    #[serde(default)]
    pub rich_text: Vec<RichTextDto>,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CodePayload {
    #[serde(default)]
    pub rich_text: Vec<RichTextDto>,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UrlDto {
    #[serde(default)]
    pub url: String,
}

/// Image payloads come in two hosting flavors; both reduce to a URL.
#[derive(Debug, Default, Deserialize)]
pub struct FilePayload {
    #[serde(default)]
    pub external: Option<UrlDto>,
    #[serde(default)]
    pub file: Option<UrlDto>,
    #[serde(default)]
    pub caption: Vec<RichTextDto>,
}

impl FilePayload {
    fn url(&self) -> String {
        self.external
            .as_ref()
            .or(self.file.as_ref())
            .map(|u| u.url.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TablePayload {
    #[serde(default)]
    pub has_column_header: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TableRowPayload {
    #[serde(default)]
    pub cells: Vec<Vec<RichTextDto>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChildPagePayload {
    #[serde(default)]
    pub title: String,
}

/// One block as the API sends it. The per-type payload lives under a key
/// named after `type`; only the one matching payload is ever populated.
#[derive(Debug, Deserialize)]
pub struct BlockDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub paragraph: Option<RichTextPayload>,
    #[serde(default)]
    pub heading_1: Option<RichTextPayload>,
    #[serde(default)]
    pub heading_2: Option<RichTextPayload>,
    #[serde(default)]
    pub heading_3: Option<RichTextPayload>,
    #[serde(default)]
    pub bulleted_list_item: Option<RichTextPayload>,
    #[serde(default)]
    pub numbered_list_item: Option<RichTextPayload>,
    #[serde(default)]
    pub quote: Option<RichTextPayload>,
    #[serde(default)]
    pub to_do: Option<ToDoPayload>,
    #[serde(default)]
    pub code: Option<CodePayload>,
    #[serde(default)]
    pub image: Option<FilePayload>,
    #[serde(default)]
    pub table: Option<TablePayload>,
    #[serde(default)]
    pub table_row: Option<TableRowPayload>,
    #[serde(default)]
    pub child_page: Option<ChildPagePayload>,
}

impl BlockDto {
    /// Flatten the envelope into the core model. Children are left empty;
    /// the tree fetcher fills them in when `has_children` is set.
    pub fn into_block(self) -> Block {
        let mut rich_text = Vec::new();
        let mut take = |payload: Option<RichTextPayload>| {
            rich_text = into_runs(payload.unwrap_or_default().rich_text);
        };

        let kind = match self.kind.as_str() {
            "paragraph" => {
                take(self.paragraph);
                BlockKind::Paragraph
            }
            "heading_1" => {
                take(self.heading_1);
                BlockKind::Heading1
            }
            "heading_2" => {
                take(self.heading_2);
                BlockKind::Heading2
            }
            "heading_3" => {
                take(self.heading_3);
                BlockKind::Heading3
            }
            "bulleted_list_item" => {
                take(self.bulleted_list_item);
                BlockKind::BulletedListItem
            }
            "numbered_list_item" => {
                take(self.numbered_list_item);
                BlockKind::NumberedListItem
            }
            "quote" => {
                take(self.quote);
                BlockKind::Quote
            }
            "to_do" => {
                let payload = self.to_do.unwrap_or_default();
                rich_text = into_runs(payload.rich_text);
                BlockKind::ToDo {
                    checked: payload.checked,
                }
            }
            "code" => {
                let payload = self.code.unwrap_or_default();
                rich_text = into_runs(payload.rich_text);
                BlockKind::Code {
                    language: payload.language,
                }
            }
            "image" => {
                let payload = self.image.unwrap_or_default();
                let url = payload.url();
                rich_text = into_runs(payload.caption);
                BlockKind::Image { url }
            }
            "divider" => BlockKind::Divider,
            "table" => BlockKind::Table {
                has_column_header: self.table.unwrap_or_default().has_column_header,
            },
            "table_row" => BlockKind::TableRow {
                cells: self
                    .table_row
                    .unwrap_or_default()
                    .cells
                    .into_iter()
                    .map(into_runs)
                    .collect(),
            },
            "child_page" => BlockKind::ChildPage {
                title: self.child_page.unwrap_or_default().title,
            },
            other => BlockKind::Other {
                original_type: other.to_owned(),
            },
        };

        Block {
            id: BlockId::from(self.id),
            kind,
            rich_text,
            has_children: self.has_children,
            children: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DateDto {
    #[serde(default)]
    pub start: String,
}

/// One property value from a page's property bag. Like blocks, the value
/// lives under a key named after `type`.
#[derive(Debug, Deserialize)]
pub struct PropertyDto {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: Option<Vec<RichTextDto>>,
    #[serde(default)]
    pub rich_text: Option<Vec<RichTextDto>>,
    #[serde(default)]
    pub checkbox: Option<bool>,
    #[serde(default)]
    pub date: Option<DateDto>,
}

#[derive(Debug, Deserialize)]
pub struct PageDto {
    pub id: String,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDto>,
}

impl PageDto {
    pub fn into_page(self) -> Page {
        let title = self
            .properties
            .values()
            .find(|p| p.kind == "title")
            .and_then(|p| p.title.as_deref())
            .map(runs_plain)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Untitled {}", &self.id[..self.id.len().min(8)]));

        let properties = PageProperties {
            sync: self.checkbox("Sync"),
            publish: self.checkbox("Publish"),
            slug: self.text("Slug"),
            author: self.text("Author"),
            publish_date: self.date("Publish Date").or_else(|| self.date("Date")),
        };

        Page {
            id: PageId::from(self.id),
            title,
            created_time: self.created_time,
            last_edited_time: self.last_edited_time,
            properties,
            blocks: Vec::new(),
        }
    }

    fn checkbox(&self, name: &str) -> bool {
        self.properties
            .get(name)
            .and_then(|p| p.checkbox)
            .unwrap_or(false)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.properties
            .get(name)
            .and_then(|p| p.rich_text.as_deref())
            .map(runs_plain)
            .filter(|t| !t.is_empty())
    }

    /// Date properties arrive as ISO strings, sometimes with a time part;
    /// only the calendar date matters downstream.
    fn date(&self, name: &str) -> Option<NaiveDate> {
        self.properties
            .get(name)
            .and_then(|p| p.date.as_ref())
            .and_then(|d| d.start.get(..10))
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
