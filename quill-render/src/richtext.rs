//! Rich-text run merging — styled spans to inline target syntax.
//!
//! Markers compose in a fixed nesting order (bold outside italic outside
//! strikethrough outside code outside link) so overlapping styles never
//! produce ambiguous marker adjacency, and every run's markers are balanced
//! on their own. Adjacent runs are concatenated with no inserted whitespace;
//! whitespace belongs to the run text itself.

use quill_core::RichTextRun;

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

/// Merge a run sequence into one markdown inline string.
pub fn merge_markdown(runs: &[RichTextRun]) -> String {
    runs.iter().map(run_to_markdown).collect()
}

fn run_to_markdown(run: &RichTextRun) -> String {
    if run.text.is_empty() {
        return String::new();
    }
    let mut text = run.text.clone();
    if let Some(href) = &run.href {
        text = format!("[{text}]({href})");
    }
    if run.code {
        text = format!("`{text}`");
    }
    if run.strikethrough {
        text = format!("~~{text}~~");
    }
    if run.italic {
        text = format!("*{text}*");
    }
    if run.bold {
        text = format!("**{text}**");
    }
    text
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

/// Escape text content for insertion between HTML tags.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for use inside a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

/// Merge a run sequence into one HTML inline string.
///
/// Run text is escaped before any tag wrapping, so run content can never
/// break the surrounding markup.
pub fn merge_html(runs: &[RichTextRun]) -> String {
    runs.iter().map(run_to_html).collect()
}

fn run_to_html(run: &RichTextRun) -> String {
    if run.text.is_empty() {
        return String::new();
    }
    let mut text = escape_html(&run.text);
    if let Some(href) = &run.href {
        text = format!("<a href=\"{}\">{text}</a>", escape_attr(href));
    }
    if run.code {
        text = format!("<code>{text}</code>");
    }
    if run.strikethrough {
        text = format!("<s>{text}</s>");
    }
    if run.italic {
        text = format!("<em>{text}</em>");
    }
    if run.bold {
        text = format!("<strong>{text}</strong>");
    }
    text
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
