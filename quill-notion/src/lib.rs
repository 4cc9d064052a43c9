//! # quill-notion
//!
//! Client for the remote document API: paginated database queries, paginated
//! block-children listing, and the recursive tree fetcher that materializes a
//! page's full block forest before conversion begins.
//!
//! Transient failures (429, 5xx, transport) are retried with bounded
//! exponential backoff; exhaustion surfaces as a per-page
//! [`NotionError::RetriesExhausted`] that callers downgrade to a skip.

pub mod client;
pub mod error;
pub mod fetch;
pub mod wire;

pub use client::{NotionClient, PageQuery};
pub use error::NotionError;
pub use fetch::fetch_block_tree;
