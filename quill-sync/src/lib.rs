//! # quill-sync
//!
//! The local mirror: incremental, windowed sync of remote pages into a
//! directory of dated markdown or HTML files.
//!
//! A run lists pages edited inside the rolling day-window, fetches and
//! renders only the ones the persisted watermark cannot prove fresh, writes
//! atomically, prunes files that aged out of the window, then advances the
//! watermark. Remote failures degrade to per-page skips and do not block
//! the commit; only listing and local persistence failures abort the run.

pub mod engine;
pub mod error;
pub mod files;
pub mod state;

pub use engine::{run, ContentSource, NotionSource, SyncOptions, SyncReport};
pub use error::SyncError;
pub use files::{file_name, parse_file_name, OutputFormat};
pub use state::SyncState;
