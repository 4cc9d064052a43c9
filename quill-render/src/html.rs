//! Block tree to HTML fragments.
//!
//! Same dispatch and recursion discipline as the markdown renderer, but every
//! block type maps to a semantic tag and all text goes through escaping. The
//! output is the concatenation of top-level fragments only — no document
//! shell, no title chrome; the downstream template owns that.
//!
//! Consecutive sibling list items group into one `<ul>`/`<ol>`; any other
//! block type closes the open list, matching the markdown renderer's
//! reset-on-interruption ordinal policy.

use quill_core::{Block, BlockKind, RichTextRun};

use crate::richtext::{escape_attr, escape_html, merge_html};

/// Convert a page body to a sequence of HTML fragments.
pub fn page_to_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    render_siblings(blocks, &mut out);
    out
}

fn list_tag(kind: &BlockKind) -> Option<&'static str> {
    match kind {
        BlockKind::BulletedListItem => Some("ul"),
        BlockKind::NumberedListItem => Some("ol"),
        _ => None,
    }
}

fn render_siblings(blocks: &[Block], out: &mut String) {
    let mut open: Option<&'static str> = None;
    for block in blocks {
        let want = list_tag(&block.kind);
        if open != want {
            if let Some(tag) = open {
                out.push_str(&format!("</{tag}>\n"));
            }
            if let Some(tag) = want {
                out.push_str(&format!("<{tag}>\n"));
            }
            open = want;
        }
        render_block(block, out);
    }
    if let Some(tag) = open {
        out.push_str(&format!("</{tag}>\n"));
    }
}

fn render_block(block: &Block, out: &mut String) {
    let text = merge_html(&block.rich_text);

    match &block.kind {
        BlockKind::Paragraph => out.push_str(&format!("<p>{text}</p>\n")),
        BlockKind::Heading1 => out.push_str(&format!("<h1>{text}</h1>\n")),
        BlockKind::Heading2 => out.push_str(&format!("<h2>{text}</h2>\n")),
        BlockKind::Heading3 => out.push_str(&format!("<h3>{text}</h3>\n")),
        BlockKind::BulletedListItem | BlockKind::NumberedListItem => {
            out.push_str(&format!("<li>{text}"));
            if !block.children.is_empty() {
                out.push('\n');
                render_siblings(&block.children, out);
            }
            out.push_str("</li>\n");
            return;
        }
        BlockKind::ToDo { checked } => {
            let input = if *checked {
                "<input type=\"checkbox\" checked disabled>"
            } else {
                "<input type=\"checkbox\" disabled>"
            };
            out.push_str(&format!("<div class=\"todo-item\">{input} {text}</div>\n"));
        }
        BlockKind::Quote => {
            out.push_str(&format!("<blockquote>{text}"));
            if !block.children.is_empty() {
                out.push('\n');
                render_siblings(&block.children, out);
            }
            out.push_str("</blockquote>\n");
            return;
        }
        BlockKind::Code { language } => {
            let code = escape_html(&block.plain_text());
            if language.is_empty() {
                out.push_str(&format!("<pre><code>{code}</code></pre>\n"));
            } else {
                out.push_str(&format!(
                    "<pre><code class=\"language-{}\">{code}</code></pre>\n",
                    escape_attr(language)
                ));
            }
        }
        // Unlike the markdown target, images render here — this path feeds
        // outward CMS publication.
        BlockKind::Image { url } => {
            out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\">\n",
                escape_attr(url),
                escape_attr(&block.plain_text())
            ));
        }
        BlockKind::Divider => out.push_str("<hr>\n"),
        BlockKind::Table { has_column_header } => {
            render_table(block, *has_column_header, out);
            return;
        }
        BlockKind::TableRow { .. } => return,
        BlockKind::ChildPage { title } => {
            out.push_str(&format!(
                "<p><a href=\"https://www.notion.so/{}\">{}</a></p>\n",
                block.id.compact(),
                escape_html(title)
            ));
        }
        BlockKind::Other { .. } => {}
    }

    render_siblings(&block.children, out);
}

fn render_table(block: &Block, has_column_header: bool, out: &mut String) {
    let rows: Vec<&Vec<Vec<RichTextRun>>> = block
        .children
        .iter()
        .filter_map(|child| match &child.kind {
            BlockKind::TableRow { cells } => Some(cells),
            _ => None,
        })
        .collect();

    let uniform = !rows.is_empty()
        && rows.len() == block.children.len()
        && rows.iter().all(|cells| cells.len() == rows[0].len());

    if !uniform {
        out.push_str("<ul>\n");
        for cell in rows.iter().flat_map(|cells| cells.iter()) {
            out.push_str(&format!("<li>{}</li>\n", merge_html(cell)));
        }
        out.push_str("</ul>\n");
        return;
    }

    out.push_str("<table>\n");
    for (i, cells) in rows.iter().enumerate() {
        let tag = if i == 0 && has_column_header { "th" } else { "td" };
        out.push_str("<tr>");
        for cell in cells.iter() {
            out.push_str(&format!("<{tag}>{}</{tag}>", merge_html(cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{Block, BlockKind, RichTextRun};

    fn leaf(id: &str, kind: BlockKind, text: &str) -> Block {
        Block::leaf(id, kind, vec![RichTextRun::plain(text)])
    }

    fn with_children(mut block: Block, children: Vec<Block>) -> Block {
        block.has_children = true;
        block.children = children;
        block
    }

    #[test]
    fn heading_paragraph_image_scenario_includes_img() {
        let blocks = vec![
            leaf("h", BlockKind::Heading1, "Title"),
            Block::leaf(
                "p",
                BlockKind::Paragraph,
                vec![RichTextRun {
                    text: "text".to_owned(),
                    bold: true,
                    href: Some("url".to_owned()),
                    ..RichTextRun::default()
                }],
            ),
            leaf(
                "i",
                BlockKind::Image {
                    url: "https://img.example/x.png".to_owned(),
                },
                "caption",
            ),
        ];
        let html = page_to_html(&blocks);
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong><a href=\"url\">text</a></strong>"));
        assert!(html.contains("<img src=\"https://img.example/x.png\" alt=\"caption\">"));
    }

    #[test]
    fn consecutive_bullets_group_into_one_ul() {
        let blocks = vec![
            leaf("b1", BlockKind::BulletedListItem, "a"),
            leaf("b2", BlockKind::BulletedListItem, "b"),
            leaf("p", BlockKind::Paragraph, "stop"),
            leaf("b3", BlockKind::BulletedListItem, "c"),
        ];
        let html = page_to_html(&blocks);
        assert_eq!(html.matches("<ul>").count(), 2);
        assert_eq!(html.matches("</ul>").count(), 2);
        assert!(html.contains("<li>a</li>\n<li>b</li>"));
    }

    #[test]
    fn numbered_items_use_ol() {
        let blocks = vec![
            leaf("n1", BlockKind::NumberedListItem, "one"),
            leaf("n2", BlockKind::NumberedListItem, "two"),
        ];
        let html = page_to_html(&blocks);
        assert!(html.starts_with("<ol>\n"));
        assert!(html.ends_with("</ol>\n"));
    }

    #[test]
    fn nested_list_children_render_inside_li() {
        let item = with_children(
            leaf("n", BlockKind::NumberedListItem, "outer"),
            vec![leaf("b", BlockKind::BulletedListItem, "inner")],
        );
        let html = page_to_html(&[item]);
        assert_eq!(
            html,
            "<ol>\n<li>outer\n<ul>\n<li>inner</li>\n</ul>\n</li>\n</ol>\n"
        );
    }

    #[test]
    fn todo_checked_state_renders_checkbox() {
        let html = page_to_html(&[leaf("t", BlockKind::ToDo { checked: true }, "done")]);
        assert!(html.contains("<input type=\"checkbox\" checked disabled> done"));
        let html = page_to_html(&[leaf("t", BlockKind::ToDo { checked: false }, "open")]);
        assert!(html.contains("<input type=\"checkbox\" disabled> open"));
    }

    #[test]
    fn quote_wraps_children() {
        let quote = with_children(
            leaf("q", BlockKind::Quote, "outer"),
            vec![leaf("p", BlockKind::Paragraph, "inner")],
        );
        assert_eq!(
            page_to_html(&[quote]),
            "<blockquote>outer\n<p>inner</p>\n</blockquote>\n"
        );
    }

    #[test]
    fn code_content_is_escaped_not_styled() {
        let code = Block::leaf(
            "c",
            BlockKind::Code {
                language: "html".to_owned(),
            },
            vec![RichTextRun::plain("<b>&</b>")],
        );
        assert_eq!(
            page_to_html(&[code]),
            "<pre><code class=\"language-html\">&lt;b&gt;&amp;&lt;/b&gt;</code></pre>\n"
        );
    }

    #[test]
    fn uniform_table_renders_table_tags() {
        let row = |id: &str, a: &str, b: &str| {
            Block::leaf(
                id,
                BlockKind::TableRow {
                    cells: vec![vec![RichTextRun::plain(a)], vec![RichTextRun::plain(b)]],
                },
                vec![],
            )
        };
        let table = with_children(
            leaf("t", BlockKind::Table { has_column_header: true }, ""),
            vec![row("r1", "h1", "h2"), row("r2", "a", "b")],
        );
        let html = page_to_html(&[table]);
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>h1</th><th>h2</th>"));
        assert!(html.contains("<td>a</td><td>b</td>"));
    }

    #[test]
    fn ragged_table_degrades_to_list() {
        let row = |id: &str, cells: Vec<&str>| {
            Block::leaf(
                id,
                BlockKind::TableRow {
                    cells: cells.into_iter().map(|c| vec![RichTextRun::plain(c)]).collect(),
                },
                vec![],
            )
        };
        let table = with_children(
            leaf("t", BlockKind::Table { has_column_header: false }, ""),
            vec![row("r1", vec!["a", "b"]), row("r2", vec!["c", "d", "e"])],
        );
        let html = page_to_html(&[table]);
        assert!(!html.contains("<table>"), "ragged table must degrade");
        assert!(html.contains("<li>a</li>"));
        assert!(html.contains("<li>e</li>"));
    }

    #[test]
    fn unknown_block_renders_nothing_but_children_do() {
        let other = with_children(
            leaf("o", BlockKind::Other { original_type: "callout".to_owned() }, "hidden"),
            vec![leaf("p", BlockKind::Paragraph, "visible")],
        );
        let html = page_to_html(&[other]);
        assert!(!html.contains("hidden"));
        assert!(html.contains("<p>visible</p>"));
    }

    #[test]
    fn output_has_no_document_shell() {
        let html = page_to_html(&[leaf("p", BlockKind::Paragraph, "body")]);
        assert!(!html.contains("<html"));
        assert!(!html.contains("<body"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let blocks = vec![
            leaf("h", BlockKind::Heading2, "T"),
            leaf("b", BlockKind::BulletedListItem, "x"),
        ];
        assert_eq!(page_to_html(&blocks), page_to_html(&blocks));
    }
}
