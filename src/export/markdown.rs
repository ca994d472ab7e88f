//! Markdown exporter.
//!
//! Blocks and tables are emitted in reading order, separated by blank lines.
//! Pages are joined with a horizontal rule, and the whole document goes
//! through [`clean_markdown`] so it ends with exactly one newline.

use crate::pipeline::postprocess::clean_markdown;
use crate::result::{BlockRole, Page, PageItem, RecognitionResult, Table, TextBlock};

const PAGE_SEPARATOR: &str = "\n\n---\n\n";

pub fn to_markdown(result: &RecognitionResult) -> String {
    let pages: Vec<String> = result
        .pages
        .iter()
        .map(render_page)
        .filter(|p| !p.is_empty())
        .collect();
    clean_markdown(&pages.join(PAGE_SEPARATOR))
}

fn render_page(page: &Page) -> String {
    page.items()
        .into_iter()
        .filter_map(|item| match item {
            PageItem::Text(block) => render_block(block),
            PageItem::Table(table) => render_table(table),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_block(block: &TextBlock) -> Option<String> {
    let text = block.text.trim();
    if text.is_empty() {
        return None;
    }
    Some(match block.role {
        BlockRole::Heading => format!("# {}", single_line(text)),
        _ => text.lines().map(escape_line_start).collect::<Vec<_>>().join("\n"),
    })
}

/// Backslash-escape a leading marker that Markdown would read as structure
/// (heading, quote, list item or ordered list number).
fn escape_line_start(line: &str) -> String {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    match body.chars().next() {
        Some('#' | '>' | '-' | '+' | '*') => format!("{indent}\\{body}"),
        Some(c) if c.is_ascii_digit() => {
            let digits = body.bytes().take_while(u8::is_ascii_digit).count();
            let rest = &body[digits..];
            let is_marker = (rest.starts_with('.') || rest.starts_with(')'))
                && rest[1..].chars().next().map_or(true, char::is_whitespace);
            if digits <= 9 && is_marker {
                format!("{indent}{}\\{rest}", &body[..digits])
            } else {
                line.to_string()
            }
        }
        _ => line.to_string(),
    }
}

/// GFM table; the first grid row becomes the header.
fn render_table(table: &Table) -> Option<String> {
    let grid = table.grid();
    let cols = grid.first().map(Vec::len).unwrap_or(0);
    if cols == 0 {
        return None;
    }

    let mut lines = Vec::with_capacity(grid.len() + 1);
    for (i, row) in grid.iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
        if i == 0 {
            lines.push(format!("|{}", " --- |".repeat(cols)));
        }
    }
    Some(lines.join("\n"))
}

fn escape_cell(text: &str) -> String {
    single_line(text).replace('|', "\\|")
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
