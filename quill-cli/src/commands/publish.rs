//! `quill publish` — upsert sync-flagged pages into the CMS collection.

use anyhow::{Context, Result};
use clap::Args;
use quill_cms::{upsert_page, CmsClient, CmsError, PushReport};
use quill_notion::NotionClient;
use quill_render::page_to_html;
use quill_sync::{ContentSource, NotionSource};
use tracing::warn;

use crate::config;

/// Arguments for `quill publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Database to publish from (falls back to QUILL_NOTION_DATABASE).
    #[arg(long)]
    pub database: Option<String>,

    /// Target collection (falls back to QUILL_CMS_COLLECTION).
    #[arg(long)]
    pub collection: Option<String>,

    /// Show what would be created and updated without writing to the CMS.
    #[arg(long)]
    pub dry_run: bool,
}

impl PublishArgs {
    pub fn run(self) -> Result<()> {
        let notion_token = config::notion_token()?;
        let database = config::database_id(self.database)?;
        let cms_token = config::cms_token()?;
        let collection_id = config::collection_id(self.collection)?;

        let source = NotionSource::new(NotionClient::new(notion_token), database).require_sync(true);
        let collection = CmsClient::new(cms_token, collection_id);

        let pages = source.list_pages(None).context("listing pages failed")?;
        println!("{} page(s) flagged for publication", pages.len());

        let mut report = PushReport::default();
        for page in &pages {
            let blocks = match source.fetch_blocks(&page.id) {
                Ok(blocks) => blocks,
                Err(err) => {
                    warn!(page = %page.id, error = %err, "page fetch failed, skipping");
                    report.failed += 1;
                    continue;
                }
            };
            let body = page_to_html(&blocks);
            match upsert_page(&collection, page, &body, self.dry_run) {
                Ok(outcome) => report.record(&outcome),
                Err(CmsError::IdentityConflict { source_id, count }) => {
                    warn!(%source_id, count, "identity conflict, skipping page");
                    report.skipped += 1;
                }
                Err(err) => {
                    warn!(page = %page.id, error = %err, "push failed, skipping page");
                    report.failed += 1;
                }
            }
        }

        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        println!("{prefix}{report}");
        Ok(())
    }
}
