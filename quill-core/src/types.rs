//! Domain types for the Quill mirror.
//!
//! Everything here is a plain data type: the Notion wire shapes live in
//! `quill-notion`, the converters in `quill-render`. All types are
//! serializable via serde; timestamps are `chrono::DateTime<Utc>`.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed identifier for a remote page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub String);

impl PageId {
    /// The id with dashes stripped, as used in canonical notion.so URLs.
    pub fn compact(&self) -> String {
        self.0.replace('-', "")
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed identifier for a content block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub String);

impl BlockId {
    /// The id with dashes stripped. A child-page block's id is the id of the
    /// page it links to, so this feeds the same canonical URL scheme as
    /// [`PageId::compact`].
    pub fn compact(&self) -> String {
        self.0.replace('-', "")
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Rich text
// ---------------------------------------------------------------------------

/// A styled span of inline text. Value type — never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RichTextRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub code: bool,
    /// Link target, when the run is a link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl RichTextRun {
    /// An unstyled run of plain text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// The closed set of block types the converters know about.
///
/// Anything the remote store sends that is not modeled here lands in
/// [`BlockKind::Other`] and renders as nothing (children still render).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    BulletedListItem,
    NumberedListItem,
    ToDo { checked: bool },
    Quote,
    Code { language: String },
    Image { url: String },
    Divider,
    Table { has_column_header: bool },
    TableRow { cells: Vec<Vec<RichTextRun>> },
    ChildPage { title: String },
    Other { original_type: String },
}

/// One node of a page's content tree.
///
/// Children are owned exclusively by their parent; list indentation and
/// ordinals are derived from tree position at render time, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    /// The block's own inline text, in display order. Empty for blocks that
    /// carry no text (divider, image, table).
    #[serde(default)]
    pub rich_text: Vec<RichTextRun>,
    /// Whether the remote store reported children for this node.
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub children: Vec<Block>,
}

impl Block {
    /// A childless block with the given kind and text runs.
    pub fn leaf(id: impl Into<BlockId>, kind: BlockKind, rich_text: Vec<RichTextRun>) -> Self {
        Self {
            id: id.into(),
            kind,
            rich_text,
            has_children: false,
            children: Vec::new(),
        }
    }

    /// The block's text runs concatenated without styling.
    pub fn plain_text(&self) -> String {
        self.rich_text.iter().map(|r| r.text.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Property values carried on a page row, as mirrored from the remote
/// database. Only the properties the sync paths consume are modeled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PageProperties {
    /// The "Sync" checkbox — pages without it are never mirrored outward.
    #[serde(default)]
    pub sync: bool,
    /// The "Publish" checkbox — gates the CMS publish call after upsert.
    #[serde(default)]
    pub publish: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<NaiveDate>,
}

/// A remote page: metadata plus its body as an owned block forest.
///
/// The body is a sequence, not a single root node — pages have no root block.
/// `last_edited_time` is remote-authoritative and drives both the listing
/// window and the local file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    #[serde(default)]
    pub properties: PageProperties,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Page {
    /// Canonical remote URL for this page.
    pub fn url(&self) -> String {
        format!("https://www.notion.so/{}", self.id.compact())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
