//! Error types for quill-sync.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that abort a sync run. Per-page remote failures are downgraded to
/// skips inside the engine and never surface here; these are the fatal ones.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The initial listing call failed — with no page set there is nothing
    /// to sync against.
    #[error("remote source error: {0}")]
    Source(#[from] quill_notion::NotionError),

    /// Local filesystem failure while writing, pruning, or reading state.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The state file exists but is not valid JSON.
    #[error("state error: {0}")]
    State(#[from] serde_json::Error),
}

pub(crate) fn io_err(path: &Path, source: io::Error) -> SyncError {
    SyncError::Io {
        path: path.to_path_buf(),
        source,
    }
}
