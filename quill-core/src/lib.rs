//! Quill core library — the domain model shared by every other crate.
//!
//! Public API surface:
//! - [`types`] — id newtypes, rich text runs, the block tree, pages
//!
//! The block tree is an owned tree: every [`Block`](types::Block) owns its
//! children outright, there are no parent back-pointers and no shared nodes.

pub mod types;

pub use types::{
    Block, BlockId, BlockKind, Page, PageId, PageProperties, RichTextRun,
};
