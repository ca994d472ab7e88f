//! CSV exporter.
//!
//! A result with tables exports each table as its cell grid, tables in page
//! and reading order separated by an empty line. A result without tables
//! has nothing tabular to offer, so it falls back to one record per text
//! block under the header `page,order,role,text,confidence`.

use crate::result::{RecognitionResult, Table};
use tracing::{debug, warn};

const FALLBACK_HEADER: [&str; 5] = ["page", "order", "role", "text", "confidence"];

/// CSV body plus whether the fallback layout was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub body: String,
    pub fallback: bool,
}

pub fn to_csv(result: &RecognitionResult) -> CsvExport {
    if result.has_tables() {
        let mut tables: Vec<(usize, &Table)> = result
            .pages
            .iter()
            .flat_map(|p| p.tables.iter().map(move |t| (p.number, t)))
            .collect();
        tables.sort_by_key(|(page, t)| (*page, t.order));

        let body = tables
            .into_iter()
            .map(|(_, t)| write_rows(t.grid()))
            .collect::<Vec<_>>()
            .join("\n");
        CsvExport {
            body,
            fallback: false,
        }
    } else {
        debug!("No tables in result; exporting one CSV row per block");
        let header: Vec<String> = FALLBACK_HEADER.iter().map(|s| s.to_string()).collect();
        let rows: Vec<Vec<String>> = std::iter::once(header)
            .chain(result.blocks().map(|(page, block)| {
                vec![
                    page.to_string(),
                    block.order.to_string(),
                    block.role.as_str().to_string(),
                    block.text.clone(),
                    block
                        .confidence
                        .map(|c| format!("{:.3}", c))
                        .unwrap_or_default(),
                ]
            }))
            .collect();
        CsvExport {
            body: write_rows(rows),
            fallback: true,
        }
    }
}

fn write_rows(rows: Vec<Vec<String>>) -> String {
    let mut writer = ::csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in &rows {
        if let Err(e) = writer.write_record(row) {
            warn!("CSV export dropped a row: {}", e);
        }
    }
    match writer.into_inner() {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("CSV export failed to flush: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{BoundingBox, TableCell};

    fn grid_table(rows: &[&[&str]], order: usize) -> Table {
        let cells = rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter().enumerate().map(move |(c, text)| TableCell {
                    row: r,
                    col: c,
                    row_span: 1,
                    col_span: 1,
                    text: text.to_string(),
                    bbox: BoundingBox::default(),
                })
            })
            .collect();
        Table {
            bbox: BoundingBox::default(),
            order,
            n_rows: rows.len(),
            n_cols: rows.first().map(|r| r.len()).unwrap_or(0),
            cells,
        }
    }

    #[test]
    fn fallback_one_row_per_block() {
        let mut result = RecognitionResult::from_lines("t", &["Hello, World", "Second"]);
        result.pages[0].blocks[0].confidence = Some(0.98765);
        let csv = to_csv(&result);
        assert!(csv.fallback);
        assert_eq!(
            csv.body,
            "page,order,role,text,confidence\n1,0,paragraph,\"Hello, World\",0.988\n1,1,paragraph,Second,\n"
        );
    }

    #[test]
    fn tables_flatten_to_grids() {
        let mut result = RecognitionResult::from_lines("t", &["ignored"]);
        result.pages[0].tables.push(grid_table(&[&["b1"]], 2));
        result.pages[0]
            .tables
            .push(grid_table(&[&["Item", "Price"], &["Tea", "300"]], 1));
        let csv = to_csv(&result);
        assert!(!csv.fallback);
        assert_eq!(csv.body, "Item,Price\nTea,300\n\nb1\n");
    }

    #[test]
    fn empty_result_has_header_only() {
        let csv = to_csv(&RecognitionResult::default());
        assert!(csv.fallback);
        assert_eq!(csv.body, "page,order,role,text,confidence\n");
    }
}
