//! Mapping from yomitoku's JSON output to [`RecognitionResult`].
//!
//! yomitoku writes one JSON document per page. Each document holds
//! `paragraphs`, `tables`, `figures` and `words`; only the fields used here
//! are modelled and unknown ones are ignored, so newer engine versions that
//! add fields keep working.

use crate::result::{BlockRole, BoundingBox, Direction, Page, Table, TableCell, TextBlock};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    paragraphs: Vec<RawParagraph>,
    #[serde(default)]
    tables: Vec<RawTable>,
    #[serde(default)]
    figures: Vec<RawFigure>,
    #[serde(default)]
    words: Vec<RawWord>,
}

#[derive(Debug, Deserialize)]
struct RawParagraph {
    #[serde(rename = "box")]
    bbox: [f32; 4],
    #[serde(default)]
    contents: Option<String>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    order: Option<usize>,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(rename = "box")]
    bbox: [f32; 4],
    #[serde(default)]
    n_row: usize,
    #[serde(default)]
    n_col: usize,
    #[serde(default)]
    cells: Vec<RawCell>,
    #[serde(default)]
    order: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    row: usize,
    col: usize,
    #[serde(default = "one")]
    row_span: usize,
    #[serde(default = "one")]
    col_span: usize,
    #[serde(rename = "box", default)]
    bbox: Option<[f32; 4]>,
    #[serde(default)]
    contents: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFigure {
    #[serde(default)]
    order: Option<usize>,
    #[serde(default)]
    paragraphs: Vec<RawParagraph>,
}

#[derive(Debug, Deserialize)]
struct RawWord {
    #[serde(default)]
    points: Vec<[f32; 2]>,
    #[serde(default)]
    rec_score: Option<f32>,
}

fn one() -> usize {
    1
}

/// Parse one page document.
pub fn parse_page(json: &str, number: usize) -> Result<Page, serde_json::Error> {
    let raw: RawPage = serde_json::from_str(json)?;

    let words: Vec<((f32, f32), f32)> = raw
        .words
        .iter()
        .filter_map(|w| Some((centre(&w.points)?, w.rec_score?)))
        .collect();

    let mut blocks: Vec<TextBlock> = raw
        .paragraphs
        .iter()
        .enumerate()
        .map(|(i, p)| to_block(p, p.order.unwrap_or(i), role_of(p.role.as_deref()), &words))
        .collect();

    for figure in &raw.figures {
        let order = figure.order.unwrap_or(usize::MAX);
        blocks.extend(
            figure
                .paragraphs
                .iter()
                .map(|p| to_block(p, order, BlockRole::Figure, &words)),
        );
    }

    let tables = raw
        .tables
        .iter()
        .enumerate()
        .map(|(i, t)| to_table(t, t.order.unwrap_or(i)))
        .collect();

    Ok(Page {
        number,
        blocks,
        tables,
    })
}

static RE_PAGE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_p(\d+)\.json$").unwrap());

/// Page number encoded in an output file name (`…_p3.json` → 3).
pub fn page_number_from_path(path: &Path) -> Option<usize> {
    let name = path.file_name()?.to_str()?;
    RE_PAGE_SUFFIX
        .captures(name)
        .and_then(|caps| caps[1].parse().ok())
}

fn to_block(p: &RawParagraph, order: usize, role: BlockRole, words: &[((f32, f32), f32)]) -> TextBlock {
    let bbox = BoundingBox(p.bbox);
    let scores: Vec<f32> = words
        .iter()
        .filter(|((x, y), _)| bbox.contains_point(*x, *y))
        .map(|(_, s)| *s)
        .collect();
    let confidence = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f32>() / scores.len() as f32)
    };

    TextBlock {
        text: p.contents.clone().unwrap_or_default().trim_end().to_string(),
        bbox,
        order,
        role,
        direction: match p.direction.as_deref() {
            Some("vertical") => Direction::Vertical,
            _ => Direction::Horizontal,
        },
        confidence,
    }
}

fn to_table(t: &RawTable, order: usize) -> Table {
    // yomitoku numbers rows and columns from 1.
    let cells = t
        .cells
        .iter()
        .map(|c| TableCell {
            row: c.row.saturating_sub(1),
            col: c.col.saturating_sub(1),
            row_span: c.row_span.max(1),
            col_span: c.col_span.max(1),
            text: c.contents.clone().unwrap_or_default().trim().to_string(),
            bbox: c.bbox.map(BoundingBox).unwrap_or_default(),
        })
        .collect();

    Table {
        bbox: BoundingBox(t.bbox),
        order,
        n_rows: t.n_row,
        n_cols: t.n_col,
        cells,
    }
}

fn role_of(role: Option<&str>) -> BlockRole {
    match role {
        Some("section_headings") => BlockRole::Heading,
        Some("page_header") => BlockRole::PageHeader,
        Some("page_footer") => BlockRole::PageFooter,
        _ => BlockRole::Paragraph,
    }
}

fn centre(points: &[[f32; 2]]) -> Option<(f32, f32)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f32;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), [x, y]| (sx + x, sy + y));
    Some((sx / n, sy / n))
}
