//! Block tree to markdown — depth-first, order-preserving.
//!
//! # Rendering rules
//!
//! - Top-level siblings are separated by exactly one blank line; consecutive
//!   list items stay adjacent so lists read as one list.
//! - List items indent 2 spaces per depth level; ordinals count the run of
//!   immediately preceding same-type siblings and reset whenever any other
//!   block type interrupts the run.
//! - Images and unknown block types render as nothing, but their children
//!   still render — content nested under a skipped block is never lost.
//! - Tables require a uniform column count; anything else degrades to a
//!   bullet dump of cell text.

use quill_core::{Block, BlockKind, RichTextRun};

use crate::richtext::merge_markdown;

/// Convert a page body to a markdown document.
///
/// Rendering the same tree twice yields byte-identical output.
pub fn page_to_markdown(blocks: &[Block]) -> String {
    collapse(render_siblings(blocks, 0))
}

fn is_list_item(kind: &BlockKind) -> bool {
    matches!(
        kind,
        BlockKind::BulletedListItem | BlockKind::NumberedListItem | BlockKind::ToDo { .. }
    )
}

/// Render a sibling sequence at the given depth, inserting blank-line
/// separators and tracking numbered-list ordinals.
fn render_siblings(blocks: &[Block], depth: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut ordinal = 0usize;
    let mut prev_was_list = false;

    for block in blocks {
        // Ordinals reset on any interruption by a different block type.
        if matches!(block.kind, BlockKind::NumberedListItem) {
            ordinal += 1;
        } else {
            ordinal = 0;
        }

        let lines = render_block(block, depth, ordinal);
        if lines.is_empty() {
            continue;
        }
        if !out.is_empty() && !(prev_was_list && is_list_item(&block.kind)) {
            out.push(String::new());
        }
        prev_was_list = is_list_item(&block.kind);
        out.extend(lines);
    }
    out
}

fn render_block(block: &Block, depth: usize, ordinal: usize) -> Vec<String> {
    let indent = "  ".repeat(depth);
    let text = merge_markdown(&block.rich_text);

    let mut lines: Vec<String> = match &block.kind {
        BlockKind::Paragraph => {
            if text.is_empty() {
                vec![]
            } else {
                vec![format!("{indent}{text}")]
            }
        }
        BlockKind::Heading1 => vec![format!("{indent}# {text}")],
        BlockKind::Heading2 => vec![format!("{indent}## {text}")],
        BlockKind::Heading3 => vec![format!("{indent}### {text}")],
        BlockKind::BulletedListItem => vec![format!("{indent}- {text}")],
        BlockKind::NumberedListItem => vec![format!("{indent}{ordinal}. {text}")],
        BlockKind::ToDo { checked } => {
            let mark = if *checked { 'x' } else { ' ' };
            vec![format!("{indent}- [{mark}] {text}")]
        }
        BlockKind::Quote => return render_quote(block, depth),
        BlockKind::Code { language } => render_code(block, &indent, language),
        // Skipped on purpose: downstream text consumers cannot fetch images.
        BlockKind::Image { .. } => vec![],
        BlockKind::Divider => vec![format!("{indent}---")],
        BlockKind::Table { .. } => return render_table(block, &indent),
        // Only meaningful inside a table block.
        BlockKind::TableRow { .. } => vec![],
        BlockKind::ChildPage { title } => {
            vec![format!(
                "{indent}[{title}](https://www.notion.so/{})",
                block.id.compact()
            )]
        }
        BlockKind::Other { .. } => vec![],
    };

    if !block.children.is_empty() {
        lines.extend(render_siblings(&block.children, depth + 1));
    }
    lines
}

/// Code content is literal — no run merging, no escaping.
fn render_code(block: &Block, indent: &str, language: &str) -> Vec<String> {
    let mut lines = vec![format!("{indent}```{language}")];
    for line in block.plain_text().split('\n') {
        lines.push(format!("{indent}{line}"));
    }
    lines.push(format!("{indent}```"));
    lines
}

/// Every rendered line of a quote, children included, gets the `> ` prefix.
fn render_quote(block: &Block, depth: usize) -> Vec<String> {
    let mut inner: Vec<String> = Vec::new();
    let text = merge_markdown(&block.rich_text);
    if !text.is_empty() {
        inner.push(text);
    }
    if !block.children.is_empty() {
        let child_lines = render_siblings(&block.children, 0);
        if !inner.is_empty() && !child_lines.is_empty() {
            inner.push(String::new());
        }
        inner.extend(child_lines);
    }

    let indent = "  ".repeat(depth);
    inner
        .into_iter()
        .map(|line| {
            if line.is_empty() {
                format!("{indent}>")
            } else {
                format!("{indent}> {line}")
            }
        })
        .collect()
}

fn table_rows(block: &Block) -> Vec<&Vec<Vec<RichTextRun>>> {
    block
        .children
        .iter()
        .filter_map(|child| match &child.kind {
            BlockKind::TableRow { cells } => Some(cells),
            _ => None,
        })
        .collect()
}

fn render_table(block: &Block, indent: &str) -> Vec<String> {
    let rows = table_rows(block);
    let uniform = !rows.is_empty()
        && rows.len() == block.children.len()
        && rows.iter().all(|cells| cells.len() == rows[0].len());

    if !uniform {
        // Graceful degradation: dump cell text as bullets.
        return rows
            .iter()
            .flat_map(|cells| cells.iter())
            .map(|cell| format!("{indent}- {}", merge_markdown(cell)))
            .collect();
    }

    let render_row = |cells: &[Vec<RichTextRun>]| {
        let joined = cells
            .iter()
            .map(|cell| merge_markdown(cell).replace('|', "\\|"))
            .collect::<Vec<_>>()
            .join(" | ");
        format!("{indent}| {joined} |")
    };

    let mut lines = vec![render_row(rows[0])];
    lines.push(format!("{indent}|{}", " --- |".repeat(rows[0].len())));
    for cells in &rows[1..] {
        lines.push(render_row(cells));
    }
    lines
}

/// Collapse blank-line runs, trim the edges, end with a single newline.
fn collapse(lines: Vec<String>) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in lines {
        if line.is_empty() && out.last().map(|l| l.is_empty()).unwrap_or(true) {
            continue;
        }
        out.push(line);
    }
    while out.last().map(|l| l.is_empty()).unwrap_or(false) {
        out.pop();
    }
    if out.is_empty() {
        String::new()
    } else {
        out.join("\n") + "\n"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
