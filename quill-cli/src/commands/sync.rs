//! `quill sync` — mirror recently edited pages into a local directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use quill_notion::NotionClient;
use quill_sync::{NotionSource, SyncOptions};

use crate::config;
use crate::FormatArg;

/// Arguments for `quill sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Rolling window in days; pages edited earlier fall out of the mirror.
    #[arg(long)]
    pub days: Option<i64>,

    /// Database to sync from (falls back to QUILL_NOTION_DATABASE).
    #[arg(long)]
    pub database: Option<String>,

    /// Output format: markdown or html.
    #[arg(long, default_value = "markdown")]
    pub format: FormatArg,

    /// Output directory (default: pages/).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Show what would be written and pruned without touching any files.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let token = config::notion_token()?;
        let database = config::database_id(self.database)?;

        let source = NotionSource::new(NotionClient::new(token), database);
        let options = SyncOptions {
            window_days: self.days.unwrap_or(config::DEFAULT_WINDOW_DAYS),
            format: self.format.into(),
            out_dir: config::out_dir(self.out),
            dry_run: self.dry_run,
        };

        let report = quill_sync::run(&source, &options).context("sync failed")?;

        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        println!("{prefix}{report}");
        if report.failed > 0 {
            println!("{} page(s) failed and will be retried next run", report.failed);
        }
        Ok(())
    }
}
