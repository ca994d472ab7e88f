//! Structured recognition result returned by an [`crate::engine::OcrEngine`].
//!
//! The model is deliberately engine-neutral: pages of text blocks and tables,
//! each carrying its bounding box and position in reading order. Exporters in
//! [`crate::export`] only ever read these types.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in page pixel coordinates: `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox(pub [f32; 4]);

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self([x1, y1, x2, y2])
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let [x1, y1, x2, y2] = self.0;
        x >= x1 && x <= x2 && y >= y1 && y <= y2
    }

    /// `"x1,y1,x2,y2"` rounded to whole pixels.
    pub fn to_attr(&self) -> String {
        let [x1, y1, x2, y2] = self.0;
        format!(
            "{},{},{},{}",
            x1.round() as i64,
            y1.round() as i64,
            x2.round() as i64,
            y2.round() as i64
        )
    }
}

/// Layout role reported by the engine for a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockRole {
    /// Ordinary body text.
    #[default]
    Paragraph,
    /// Section heading.
    Heading,
    /// Running page header.
    PageHeader,
    /// Running page footer.
    PageFooter,
    /// Text found inside a figure.
    Figure,
}

impl BlockRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockRole::Paragraph => "paragraph",
            BlockRole::Heading => "heading",
            BlockRole::PageHeader => "page_header",
            BlockRole::PageFooter => "page_footer",
            BlockRole::Figure => "figure",
        }
    }
}

/// Writing direction of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
}

/// One recognised run of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub bbox: BoundingBox,
    /// Position in the page's reading order (shared with tables).
    pub order: usize,
    #[serde(default)]
    pub role: BlockRole,
    #[serde(default)]
    pub direction: Direction,
    /// Mean recognition score in `0.0..=1.0`, when the engine reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// One table cell. `row`/`col` are 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub row: usize,
    pub col: usize,
    #[serde(default = "one")]
    pub row_span: usize,
    #[serde(default = "one")]
    pub col_span: usize,
    pub text: String,
    #[serde(default)]
    pub bbox: BoundingBox,
}

fn one() -> usize {
    1
}

/// A detected table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub bbox: BoundingBox,
    pub order: usize,
    pub n_rows: usize,
    pub n_cols: usize,
    pub cells: Vec<TableCell>,
}

impl Table {
    /// Expand the cells into a dense `n_rows × n_cols` grid.
    ///
    /// Spanned cells repeat their text in every position they cover; cells
    /// the engine did not report are empty strings.
    pub fn grid(&self) -> Vec<Vec<String>> {
        let rows = self
            .cells
            .iter()
            .map(|c| c.row + c.row_span.max(1))
            .max()
            .unwrap_or(0)
            .max(self.n_rows);
        let cols = self
            .cells
            .iter()
            .map(|c| c.col + c.col_span.max(1))
            .max()
            .unwrap_or(0)
            .max(self.n_cols);
        let mut grid = vec![vec![String::new(); cols]; rows];
        for cell in &self.cells {
            for r in cell.row..cell.row + cell.row_span.max(1) {
                for c in cell.col..cell.col + cell.col_span.max(1) {
                    grid[r][c] = cell.text.clone();
                }
            }
        }
        grid
    }
}

/// Everything recognised on one page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Page {
    /// 1-indexed page number.
    pub number: usize,
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

/// A page element in reading order.
#[derive(Debug, Clone, Copy)]
pub enum PageItem<'a> {
    Text(&'a TextBlock),
    Table(&'a Table),
}

impl Page {
    /// Blocks and tables merged and sorted by reading order.
    ///
    /// Ties keep text before tables, then source order.
    pub fn items(&self) -> Vec<PageItem<'_>> {
        let mut items: Vec<(usize, u8, usize, PageItem<'_>)> = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.order, 0, i, PageItem::Text(b)))
            .chain(
                self.tables
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (t.order, 1, i, PageItem::Table(t))),
            )
            .collect();
        items.sort_by_key(|(order, kind, idx, _)| (*order, *kind, *idx));
        items.into_iter().map(|(_, _, _, item)| item).collect()
    }

    /// Text blocks only, in reading order.
    pub fn blocks_in_order(&self) -> Vec<&TextBlock> {
        let mut blocks: Vec<&TextBlock> = self.blocks.iter().collect();
        blocks.sort_by_key(|b| b.order);
        blocks
    }
}

/// Structured output of one OCR invocation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Name of the engine that produced the result.
    pub engine: String,
    pub pages: Vec<Page>,
}

impl RecognitionResult {
    /// All text blocks of all pages, in page then reading order.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &TextBlock)> {
        self.pages
            .iter()
            .flat_map(|p| p.blocks_in_order().into_iter().map(move |b| (p.number, b)))
    }

    pub fn has_tables(&self) -> bool {
        self.pages.iter().any(|p| !p.tables.is_empty())
    }

    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.blocks.len()).sum()
    }

    pub fn table_count(&self) -> usize {
        self.pages.iter().map(|p| p.tables.len()).sum()
    }

    /// Convenience constructor for a single page holding one block per line.
    pub fn from_lines<S: AsRef<str>>(engine: &str, lines: &[S]) -> Self {
        let blocks = lines
            .iter()
            .enumerate()
            .map(|(i, line)| TextBlock {
                text: line.as_ref().to_string(),
                bbox: BoundingBox::new(0.0, i as f32 * 20.0, 100.0, i as f32 * 20.0 + 16.0),
                order: i,
                role: BlockRole::Paragraph,
                direction: Direction::Horizontal,
                confidence: None,
            })
            .collect();
        Self {
            engine: engine.to_string(),
            pages: vec![Page {
                number: 1,
                blocks,
                tables: Vec::new(),
            }],
        }
    }
}
