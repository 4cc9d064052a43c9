//! Output file naming.
//!
//! Every mirrored page lands at `<YYYY-MM-DD>-<page-id>.<ext>`, the date
//! being the page's last edit date. The name is the pruning index: the date
//! prefix decides age, the id part decides membership in the current run.

use chrono::NaiveDate;
use quill_core::Page;

/// Which rendering a sync run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Html,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
        }
    }
}

/// The file name a page syncs to under the given format.
pub fn file_name(page: &Page, format: OutputFormat) -> String {
    format!(
        "{}-{}.{}",
        page.last_edited_time.date_naive().format("%Y-%m-%d"),
        page.id,
        format.extension()
    )
}

/// Parse a file name produced by [`file_name`] back into its date and page
/// id. Anything else in the output directory returns `None` and is left
/// alone by pruning.
pub fn parse_file_name(name: &str, format: OutputFormat) -> Option<(NaiveDate, String)> {
    let stem = name.strip_suffix(format.extension())?.strip_suffix('.')?;
    // get() rather than split_at: foreign names may put a multibyte char
    // across the boundary, and those must parse as None, not panic.
    let date_part = stem.get(..10)?;
    let rest = stem.get(10..)?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    let id = rest.strip_prefix('-')?;
    if id.is_empty() {
        return None;
    }
    Some((date, id.to_owned()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
