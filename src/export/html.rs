//! HTML exporter: a standalone HTML5 document with one `<section>` per page.
//!
//! Every element carries its bounding box as `data-bbox="x1,y1,x2,y2"` so the
//! output can be overlaid on the source image.

use crate::result::{BlockRole, Page, PageItem, RecognitionResult, Table, TextBlock};
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;max-width:60rem;margin:2rem auto;line-height:1.6}\
section.page{border-bottom:1px solid #ccc;padding-bottom:1rem;margin-bottom:1rem}\
table{border-collapse:collapse}td{border:1px solid #999;padding:.25rem .5rem}\
p.page_header,p.page_footer{color:#666;font-size:.85em}p.figure{font-style:italic}";

pub fn to_html(result: &RecognitionResult) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>OCR result</title>\n");
    let _ = writeln!(out, "<style>{}</style>", STYLE);
    let _ = writeln!(
        out,
        "<meta name=\"generator\" content=\"{}\">",
        escape(&result.engine)
    );
    out.push_str("</head>\n<body>\n");
    for page in &result.pages {
        render_page(&mut out, page);
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn render_page(out: &mut String, page: &Page) {
    let _ = writeln!(
        out,
        "<section class=\"page\" data-page=\"{}\">",
        page.number
    );
    for item in page.items() {
        match item {
            PageItem::Text(block) => render_block(out, block),
            PageItem::Table(table) => render_table(out, table),
        }
    }
    out.push_str("</section>\n");
}

fn render_block(out: &mut String, block: &TextBlock) {
    let text = block.text.trim();
    if text.is_empty() {
        return;
    }
    let body = text
        .lines()
        .map(escape)
        .collect::<Vec<_>>()
        .join("<br>");
    let bbox = block.bbox.to_attr();
    match block.role {
        BlockRole::Heading => {
            let _ = writeln!(out, "<h2 data-bbox=\"{}\">{}</h2>", bbox, body);
        }
        BlockRole::Paragraph => {
            let _ = writeln!(out, "<p data-bbox=\"{}\">{}</p>", bbox, body);
        }
        role => {
            let _ = writeln!(
                out,
                "<p class=\"{}\" data-bbox=\"{}\">{}</p>",
                role.as_str(),
                bbox,
                body
            );
        }
    }
}

fn render_table(out: &mut String, table: &Table) {
    let _ = writeln!(out, "<table data-bbox=\"{}\">", table.bbox.to_attr());
    let mut cells: Vec<_> = table.cells.iter().collect();
    cells.sort_by_key(|c| (c.row, c.col));
    let rows = cells
        .iter()
        .map(|c| c.row + 1)
        .max()
        .unwrap_or(0)
        .max(table.n_rows);

    let mut remaining = cells.as_slice();
    for row in 0..rows {
        let split = remaining
            .iter()
            .position(|c| c.row != row)
            .unwrap_or(remaining.len());
        let (current, rest) = remaining.split_at(split);
        remaining = rest;

        out.push_str("<tr>");
        for cell in current {
            out.push_str("<td");
            if cell.row_span > 1 {
                let _ = write!(out, " rowspan=\"{}\"", cell.row_span);
            }
            if cell.col_span > 1 {
                let _ = write!(out, " colspan=\"{}\"", cell.col_span);
            }
            let _ = write!(
                out,
                " data-bbox=\"{}\">{}</td>",
                cell.bbox.to_attr(),
                escape(&cell.text)
            );
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
}

/// Escape text for element content and double-quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
