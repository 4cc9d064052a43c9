//! Error types for quill-cms.

use thiserror::Error;

/// All errors that can arise while pushing items to the CMS.
#[derive(Debug, Error)]
pub enum CmsError {
    /// CMS returned an error status.
    #[error("CMS HTTP error: {status} - {body}")]
    Http { status: u16, body: String },

    /// Transport-level failure before any status arrived.
    #[error("CMS transport error: {0}")]
    Transport(String),

    /// Response body could not be deserialized.
    #[error("CMS JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure while reading a response body.
    #[error("CMS I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// More than one collection item claims the same source page. The push
    /// refuses to guess which one to overwrite.
    #[error("identity conflict: {count} items share source id {source_id}")]
    IdentityConflict { source_id: String, count: usize },
}
