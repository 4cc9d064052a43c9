//! Persisted sync watermark.
//!
//! The state file lives next to the mirrored pages so moving the output
//! directory moves its history with it. An absent file is a valid state
//! (first run); a corrupt file is an error, not a silent reset.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, SyncError};

pub const STATE_FILE: &str = "sync_state.json";

/// The run-to-run memory of the sync engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Start instant of the last run that finished without page failures.
    /// Pages edited at or before this, whose file exists, are fresh.
    #[serde(default)]
    pub watermark: Option<DateTime<Utc>>,
}

impl SyncState {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(STATE_FILE)
    }

    /// Load state from `dir`, defaulting when no file exists yet.
    pub fn load_at(dir: &Path) -> Result<Self, SyncError> {
        let path = Self::path_in(dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist state into `dir` atomically: write a sibling temp file, then
    /// rename over the target.
    pub fn save_at(&self, dir: &Path) -> Result<(), SyncError> {
        fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        let path = Self::path_in(dir);
        let tmp = path.with_extension("json.tmp");
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, raw).map_err(|e| io_err(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
