//! Exporters: pure functions from a [`RecognitionResult`] to display text.
//!
//! Every format is rendered locally from the stored result, so switching the
//! selected format never reaches the OCR engine again.
//!
//! | Format   | Module       | Extension | MIME type          |
//! |----------|--------------|-----------|--------------------|
//! | Markdown | [`markdown`] | `md`      | `text/markdown`    |
//! | JSON     | [`json`]     | `json`    | `application/json` |
//! | HTML     | [`html`]     | `html`    | `text/html`        |
//! | CSV      | [`csv`]      | `csv`     | `text/csv`         |

pub mod csv;
pub mod html;
pub mod json;
pub mod markdown;

use crate::result::RecognitionResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rendering mode selected in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// GitHub-flavoured Markdown. (default)
    #[default]
    Markdown,
    /// Pretty-printed structured dump.
    Json,
    /// Standalone HTML5 document.
    Html,
    /// Table grids, or one row per text block when there are no tables.
    Csv,
}

impl OutputFormat {
    /// All formats in display order.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Markdown,
        OutputFormat::Json,
        OutputFormat::Html,
        OutputFormat::Csv,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "Markdown",
            OutputFormat::Json => "JSON",
            OutputFormat::Html => "HTML",
            OutputFormat::Csv => "CSV",
        }
    }

    /// File extension without the dot. Also the form value posted by the UI.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
            OutputFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "text/markdown; charset=utf-8",
            OutputFormat::Json => "application/json; charset=utf-8",
            OutputFormat::Html => "text/html; charset=utf-8",
            OutputFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    /// Language tag for the result code view.
    pub fn language(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
            OutputFormat::Csv => "csv",
        }
    }

    /// Parse a form value or extension (`md`, `markdown`, `JSON`, …).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(OutputFormat::Markdown),
            "json" => Some(OutputFormat::Json),
            "html" | "htm" => Some(OutputFormat::Html),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| format!("unknown output format '{s}' (expected md, json, html or csv)"))
    }
}

/// Text produced by applying an [`OutputFormat`] to a [`RecognitionResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedArtifact {
    pub format: OutputFormat,
    pub body: String,
    /// `true` when CSV was requested for a result without tables and the
    /// one-row-per-block layout was used instead.
    pub fallback: bool,
}

impl RenderedArtifact {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn file_name(&self, stem: &str, date: NaiveDate) -> String {
        download_file_name(stem, self.format, date)
    }
}

/// Render `result` in `format`.
pub fn render(result: &RecognitionResult, format: OutputFormat) -> RenderedArtifact {
    let (body, fallback) = match format {
        OutputFormat::Markdown => (markdown::to_markdown(result), false),
        OutputFormat::Json => (json::to_json(result), false),
        OutputFormat::Html => (html::to_html(result), false),
        OutputFormat::Csv => {
            let csv = self::csv::to_csv(result);
            (csv.body, csv.fallback)
        }
    };
    RenderedArtifact {
        format,
        body,
        fallback,
    }
}

/// `<stem>_<YYYYMMDD>_ocr.<ext>`
pub fn download_file_name(stem: &str, format: OutputFormat, date: NaiveDate) -> String {
    let stem = if stem.trim().is_empty() { "document" } else { stem };
    format!("{}_{}_ocr.{}", stem, date.format("%Y%m%d"), format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::TextBlock;

    fn hello() -> RecognitionResult {
        RecognitionResult::from_lines("test", &["Hello World"])
    }

    #[test]
    fn hello_world_markdown() {
        let artifact = render(&hello(), OutputFormat::Markdown);
        assert_eq!(artifact.body, "Hello World\n");
        assert!(!artifact.fallback);
    }

    #[test]
    fn hello_world_json() {
        let artifact = render(&hello(), OutputFormat::Json);
        assert!(artifact.body.contains(r#""text": "Hello World""#));
    }

    #[test]
    fn json_parses_back_to_same_blocks() {
        let result = RecognitionResult::from_lines("test", &["one", "two", "three"]);
        let artifact = render(&result, OutputFormat::Json);
        let back: RecognitionResult = serde_json::from_str(&artifact.body).unwrap();
        let before: Vec<&TextBlock> = result.blocks().map(|(_, b)| b).collect();
        let after: Vec<&TextBlock> = back.blocks().map(|(_, b)| b).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn rendering_is_deterministic() {
        let result = RecognitionResult::from_lines("test", &["a", "b"]);
        for format in OutputFormat::ALL {
            assert_eq!(render(&result, format), render(&result, format));
        }
    }

    #[test]
    fn csv_without_tables_is_marked_fallback() {
        let artifact = render(&hello(), OutputFormat::Csv);
        assert!(artifact.fallback);
        assert!(artifact.body.starts_with("page,order,role,text,confidence\n"));
    }

    #[test]
    fn parses_form_values() {
        assert_eq!(OutputFormat::from_name("md"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::from_name("Markdown"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::from_name(" CSV "), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_name("pdf"), None);
        assert!("xml".parse::<OutputFormat>().is_err());
        for format in OutputFormat::ALL {
            assert_eq!(format.extension().parse::<OutputFormat>(), Ok(format));
        }
    }

    #[test]
    fn mime_types_carry_charset() {
        for format in OutputFormat::ALL {
            assert!(format.mime_type().ends_with("; charset=utf-8"));
        }
        assert!(OutputFormat::Json.mime_type().starts_with("application/json"));
    }

    #[test]
    fn download_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            download_file_name("receipt", OutputFormat::Csv, date),
            "receipt_20240309_ocr.csv"
        );
        assert_eq!(
            download_file_name("", OutputFormat::Markdown, date),
            "document_20240309_ocr.md"
        );
    }
}
