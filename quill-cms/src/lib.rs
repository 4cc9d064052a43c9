//! # quill-cms
//!
//! Outward push to a CMS collection: field mapping from a page plus its
//! rendered HTML body, slug derivation, and the source-id keyed upsert that
//! keeps repeated pushes idempotent.
//!
//! The [`Collection`] trait is the seam between the upsert logic and the
//! HTTP client, so the decision table (zero matches create, one updates,
//! more than one is a conflict) is tested without a network.

pub mod client;
pub mod error;
pub mod fields;
pub mod upsert;

pub use client::CmsClient;
pub use error::CmsError;
pub use fields::{slugify, ItemFields};
pub use upsert::{upsert_page, Collection, ItemRef, PushReport, UpsertOutcome};
