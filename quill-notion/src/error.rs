//! Error types for quill-notion.

use thiserror::Error;

/// All errors that can arise from remote document API calls.
#[derive(Debug, Error)]
pub enum NotionError {
    /// Server returned a non-transient error status.
    #[error("HTTP error: {status} - {body}")]
    Http { status: u16, body: String },

    /// Transient failures (rate limit, 5xx, transport) outlasted the retry
    /// budget. Callers treat this as a per-page skip, not a run abort.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Response body could not be deserialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure while reading a response body.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
