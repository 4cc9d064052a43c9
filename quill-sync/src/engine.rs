//! The sync run: list, decide, render, write, prune, commit.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use quill_core::{Block, Page, PageId};
use quill_notion::{fetch_block_tree, NotionClient, NotionError, PageQuery};
use quill_render::{page_to_html, page_to_markdown};
use tracing::{info, warn};

use crate::error::{io_err, SyncError};
use crate::files::{file_name, parse_file_name, OutputFormat};
use crate::state::SyncState;

// ---------------------------------------------------------------------------
// Source seam
// ---------------------------------------------------------------------------

/// Where pages come from. The engine only needs these two calls, so tests
/// drive it with an in-memory source and never open a socket.
pub trait ContentSource {
    /// Pages edited at or after `edited_after`, newest first.
    fn list_pages(&self, edited_after: Option<DateTime<Utc>>) -> Result<Vec<Page>, NotionError>;
    /// The full block forest of one page.
    fn fetch_blocks(&self, page_id: &PageId) -> Result<Vec<Block>, NotionError>;
}

/// The production source: a remote database behind a [`NotionClient`].
pub struct NotionSource {
    client: NotionClient,
    database_id: String,
    require_sync: bool,
}

impl NotionSource {
    pub fn new(client: NotionClient, database_id: impl Into<String>) -> Self {
        Self {
            client,
            database_id: database_id.into(),
            require_sync: false,
        }
    }

    /// Restrict listing to pages whose "Sync" checkbox is set.
    pub fn require_sync(mut self, on: bool) -> Self {
        self.require_sync = on;
        self
    }
}

impl ContentSource for NotionSource {
    fn list_pages(&self, edited_after: Option<DateTime<Utc>>) -> Result<Vec<Page>, NotionError> {
        let query = PageQuery {
            edited_after,
            require_sync: self.require_sync,
        };
        self.client.query_pages(&self.database_id, &query)
    }

    fn fetch_blocks(&self, page_id: &PageId) -> Result<Vec<Block>, NotionError> {
        fetch_block_tree(&self.client, &page_id.0)
    }
}

// ---------------------------------------------------------------------------
// Options and report
// ---------------------------------------------------------------------------

/// Knobs for one sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Rolling window in days; pages edited earlier are out of scope and
    /// their files become prune candidates.
    pub window_days: i64,
    pub format: OutputFormat,
    pub out_dir: PathBuf,
    /// Report every decision but touch nothing on disk.
    pub dry_run: bool,
}

/// What one run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub written: usize,
    pub unchanged: usize,
    /// Skipped without fetching: watermark proved the file current.
    pub fresh: usize,
    pub failed: usize,
    pub pruned: usize,
    pub watermark_advanced: bool,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} written, {} unchanged, {} fresh, {} failed, {} pruned",
            self.written, self.unchanged, self.fresh, self.failed, self.pruned
        )
    }
}

enum PageOutcome {
    Written,
    Unchanged,
    Fresh,
    Failed,
}

// ---------------------------------------------------------------------------
// The run
// ---------------------------------------------------------------------------

/// Execute one sync run.
///
/// A fetch failure skips that page and the watermark stays put, so the next
/// run retries it; listing and filesystem failures abort. Under dry-run the
/// report is computed in full but no file and no state changes.
pub fn run<S: ContentSource>(source: &S, options: &SyncOptions) -> Result<SyncReport, SyncError> {
    let started = Utc::now();
    let window_start = started - Duration::days(options.window_days);
    let state = SyncState::load_at(&options.out_dir)?;

    let pages = source.list_pages(Some(window_start))?;
    info!(
        count = pages.len(),
        window_days = options.window_days,
        dry_run = options.dry_run,
        "listed pages in window"
    );

    if !options.dry_run {
        fs::create_dir_all(&options.out_dir).map_err(|e| io_err(&options.out_dir, e))?;
    }

    let mut report = SyncReport::default();
    let mut current_ids: HashSet<String> = HashSet::new();
    for page in &pages {
        current_ids.insert(page.id.to_string());
        match sync_page(source, page, &state, options)? {
            PageOutcome::Written => report.written += 1,
            PageOutcome::Unchanged => report.unchanged += 1,
            PageOutcome::Fresh => report.fresh += 1,
            PageOutcome::Failed => report.failed += 1,
        }
    }

    report.pruned = prune(options, window_start.date_naive(), &current_ids)?;

    // Per-page failures do not block the commit: a failed page has no file
    // under its current name, so the next run re-fetches it regardless of
    // the watermark. Fatal errors never reach this point.
    if !options.dry_run {
        SyncState {
            watermark: Some(started),
        }
        .save_at(&options.out_dir)?;
        report.watermark_advanced = true;
    }

    info!(%report, "sync run finished");
    Ok(report)
}

fn sync_page<S: ContentSource>(
    source: &S,
    page: &Page,
    state: &SyncState,
    options: &SyncOptions,
) -> Result<PageOutcome, SyncError> {
    let name = file_name(page, options.format);
    let path = options.out_dir.join(&name);

    // Watermark shortcut: not edited since the last clean run and the file
    // is where we left it.
    if let Some(mark) = state.watermark {
        if page.last_edited_time <= mark && path.exists() {
            return Ok(PageOutcome::Fresh);
        }
    }

    let blocks = match source.fetch_blocks(&page.id) {
        Ok(blocks) => blocks,
        Err(err) => {
            warn!(page = %page.id, error = %err, "page fetch failed, skipping");
            return Ok(PageOutcome::Failed);
        }
    };

    let content = match options.format {
        OutputFormat::Markdown => page_to_markdown(&blocks),
        OutputFormat::Html => page_to_html(&blocks),
    };

    match fs::read_to_string(&path) {
        Ok(existing) if existing == content => return Ok(PageOutcome::Unchanged),
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(io_err(&path, err)),
    }

    if options.dry_run {
        info!(file = %name, "would write");
        return Ok(PageOutcome::Written);
    }

    write_atomic(&path, &content)?;
    remove_superseded(page, &name, options)?;
    info!(file = %name, "wrote page");
    Ok(PageOutcome::Written)
}

/// Write via a sibling temp file and rename, so readers never see a torn
/// file.
fn write_atomic(path: &Path, content: &str) -> Result<(), SyncError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

/// A re-edited page changes its date prefix, leaving the previous file
/// behind under the old name. Drop any same-id file that is not the one
/// just written.
fn remove_superseded(page: &Page, current_name: &str, options: &SyncOptions) -> Result<(), SyncError> {
    let id = page.id.to_string();
    let Some(entries) = list_dir(&options.out_dir)? else {
        return Ok(());
    };
    for entry in entries {
        let entry = entry.map_err(|e| io_err(&options.out_dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name == current_name {
            continue;
        }
        match parse_file_name(name, options.format) {
            Some((_, file_id)) if file_id == id => {
                fs::remove_file(entry.path()).map_err(|e| io_err(&entry.path(), e))?;
                info!(file = %name, "removed superseded file");
            }
            _ => {}
        }
    }
    Ok(())
}

/// Delete files whose encoded date fell out of the window and whose page no
/// longer appears in the listing. Files that do not parse as sync output
/// are never touched.
fn prune(
    options: &SyncOptions,
    cutoff: NaiveDate,
    current_ids: &HashSet<String>,
) -> Result<usize, SyncError> {
    let mut pruned = 0;
    let Some(entries) = list_dir(&options.out_dir)? else {
        return Ok(0);
    };
    for entry in entries {
        let entry = entry.map_err(|e| io_err(&options.out_dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some((date, id)) = parse_file_name(name, options.format) else {
            continue;
        };
        if date >= cutoff || current_ids.contains(&id) {
            continue;
        }
        if options.dry_run {
            info!(file = %name, "would prune");
        } else {
            fs::remove_file(entry.path()).map_err(|e| io_err(&entry.path(), e))?;
            info!(file = %name, "pruned");
        }
        pruned += 1;
    }
    Ok(pruned)
}

/// `None` when the directory does not exist yet (first dry-run).
fn list_dir(dir: &Path) -> Result<Option<fs::ReadDir>, SyncError> {
    match fs::read_dir(dir) {
        Ok(entries) => Ok(Some(entries)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(dir, err)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{BlockKind, PageProperties, RichTextRun};
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct StubSource {
        pages: Vec<Page>,
        bodies: HashMap<String, Vec<Block>>,
        fail_fetch: HashSet<String>,
    }

    impl StubSource {
        fn new(pages: Vec<(Page, &str)>) -> Self {
            let mut bodies = HashMap::new();
            let pages = pages
                .into_iter()
                .map(|(page, text)| {
                    bodies.insert(
                        page.id.to_string(),
                        vec![Block::leaf(
                            "b1",
                            BlockKind::Paragraph,
                            vec![RichTextRun::plain(text)],
                        )],
                    );
                    page
                })
                .collect();
            Self {
                pages,
                bodies,
                fail_fetch: HashSet::new(),
            }
        }
    }

    impl ContentSource for StubSource {
        fn list_pages(&self, _: Option<DateTime<Utc>>) -> Result<Vec<Page>, NotionError> {
            Ok(self.pages.clone())
        }

        fn fetch_blocks(&self, page_id: &PageId) -> Result<Vec<Block>, NotionError> {
            if self.fail_fetch.contains(&page_id.0) {
                return Err(NotionError::RetriesExhausted {
                    attempts: 4,
                    last: "HTTP 503".to_owned(),
                });
            }
            Ok(self.bodies.get(&page_id.0).cloned().unwrap_or_default())
        }
    }

    fn page(id: &str, edited: DateTime<Utc>) -> Page {
        Page {
            id: PageId::from(id),
            title: format!("Page {id}"),
            created_time: edited,
            last_edited_time: edited,
            properties: PageProperties::default(),
            blocks: vec![],
        }
    }

    fn options(dir: &Path) -> SyncOptions {
        SyncOptions {
            window_days: 5,
            format: OutputFormat::Markdown,
            out_dir: dir.to_path_buf(),
            dry_run: false,
        }
    }

    #[test]
    fn first_run_writes_dated_files_and_advances_watermark() {
        let dir = TempDir::new().unwrap();
        let edited = Utc::now() - Duration::hours(1);
        let source = StubSource::new(vec![(page("p1", edited), "hello")]);

        let report = run(&source, &options(dir.path())).unwrap();
        assert_eq!(report.written, 1);
        assert!(report.watermark_advanced);

        let expected = dir
            .path()
            .join(format!("{}-p1.md", edited.date_naive().format("%Y-%m-%d")));
        assert_eq!(fs::read_to_string(expected).unwrap(), "hello");
        assert!(SyncState::load_at(dir.path()).unwrap().watermark.is_some());
    }

    #[test]
    fn second_run_skips_fresh_pages_without_fetching() {
        let dir = TempDir::new().unwrap();
        let edited = Utc::now() - Duration::hours(1);
        let source = StubSource::new(vec![(page("p1", edited), "hello")]);

        run(&source, &options(dir.path())).unwrap();

        // Fetch now fails; freshness must keep the engine from noticing.
        let mut source = source;
        source.fail_fetch.insert("p1".to_owned());
        let report = run(&source, &options(dir.path())).unwrap();
        assert_eq!(report.fresh, 1);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn edited_page_is_rewritten_and_old_name_removed() {
        let dir = TempDir::new().unwrap();
        let first_edit = Utc::now() - Duration::days(2);
        let source = StubSource::new(vec![(page("p1", first_edit), "v1")]);
        run(&source, &options(dir.path())).unwrap();

        let second_edit = Utc::now() + Duration::hours(1);
        let source = StubSource::new(vec![(page("p1", second_edit), "v2")]);
        let report = run(&source, &options(dir.path())).unwrap();
        assert_eq!(report.written, 1);

        let files: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".md"))
            .collect();
        assert_eq!(files.len(), 1, "old-dated file must be superseded: {files:?}");
        assert!(files[0].contains("p1"));
    }

    #[test]
    fn unchanged_content_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let edited = Utc::now() - Duration::hours(1);
        let source = StubSource::new(vec![(page("p1", edited), "same")]);
        run(&source, &options(dir.path())).unwrap();

        // Wipe the watermark so the engine re-fetches and compares bytes.
        SyncState::default().save_at(dir.path()).unwrap();
        let report = run(&source, &options(dir.path())).unwrap();
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.written, 0);
    }

    #[test]
    fn fetch_failure_skips_page_but_commits_the_run() {
        let dir = TempDir::new().unwrap();
        let edited = Utc::now() - Duration::hours(1);
        let mut source = StubSource::new(vec![
            (page("p1", edited), "ok"),
            (page("p2", edited), "broken"),
        ]);
        source.fail_fetch.insert("p2".to_owned());

        let report = run(&source, &options(dir.path())).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.failed, 1);
        assert!(report.watermark_advanced);

        // The failed page has no file, so the next run must re-fetch it
        // even though the watermark moved past its edit time.
        source.fail_fetch.clear();
        let report = run(&source, &options(dir.path())).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.fresh, 1);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let edited = Utc::now() - Duration::hours(1);
        let source = StubSource::new(vec![(page("p1", edited), "hello")]);
        let mut opts = options(dir.path());
        opts.dry_run = true;

        let report = run(&source, &opts).unwrap();
        assert_eq!(report.written, 1);
        assert!(!report.watermark_advanced);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn prune_removes_aged_files_of_absent_pages_only() {
        let dir = TempDir::new().unwrap();
        let edited = Utc::now() - Duration::hours(1);
        let source = StubSource::new(vec![(page("p1", edited), "keep")]);

        // An aged file of a page no longer listed, and foreign files — one
        // with a name that breaks at a non-ASCII byte boundary.
        fs::write(dir.path().join("2020-01-01-gone.md"), "old").unwrap();
        fs::write(dir.path().join("README.md"), "not sync output").unwrap();
        fs::write(dir.path().join("あああああ.md"), "foreign").unwrap();

        let report = run(&source, &options(dir.path())).unwrap();
        assert_eq!(report.pruned, 1);
        assert!(!dir.path().join("2020-01-01-gone.md").exists());
        assert!(dir.path().join("README.md").exists());
        assert!(dir.path().join("あああああ.md").exists());
    }

    #[test]
    fn prune_failure_aborts_before_commit() {
        use chrono::TimeZone;

        let dir = TempDir::new().unwrap();
        let edited = Utc::now() - Duration::hours(1);
        let source = StubSource::new(vec![(page("p1", edited), "x")]);

        let prior = SyncState {
            watermark: Some(Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap()),
        };
        prior.save_at(dir.path()).unwrap();

        // Parses as an aged prune candidate, but is a directory, so the
        // delete fails and the run must abort without committing.
        fs::create_dir(dir.path().join("2019-01-01-stale.md")).unwrap();

        let err = run(&source, &options(dir.path())).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }), "got: {err}");
        assert_eq!(SyncState::load_at(dir.path()).unwrap(), prior);
    }

    #[test]
    fn aged_file_of_listed_page_survives_pruning() {
        let dir = TempDir::new().unwrap();
        let edited = Utc::now() - Duration::hours(1);
        let source = StubSource::new(vec![(page("p1", edited), "x")]);

        fs::write(dir.path().join("2020-01-01-p2.html"), "wrong ext").unwrap();
        let report = run(&source, &options(dir.path())).unwrap();
        // .html does not parse under the markdown format, so it is foreign.
        assert_eq!(report.pruned, 0);
        assert!(dir.path().join("2020-01-01-p2.html").exists());
    }

    #[test]
    fn html_format_renders_markup() {
        let dir = TempDir::new().unwrap();
        let edited = Utc::now() - Duration::hours(1);
        let source = StubSource::new(vec![(page("p1", edited), "hello")]);
        let mut opts = options(dir.path());
        opts.format = OutputFormat::Html;

        run(&source, &opts).unwrap();
        let name = format!("{}-p1.html", edited.date_naive().format("%Y-%m-%d"));
        let content = fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(content, "<p>hello</p>\n");
    }
}
