//! End-to-end tests against a real `yomitoku` installation.
//!
//! These run the actual OCR engine (model download on first use, several
//! seconds per page on CPU). They are gated behind the `E2E_ENABLED`
//! environment variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Documents under `./test_cases/` are used when present; tests that need one
//! skip themselves when it is missing. Set `YOMITOKU_DEVICE=cuda` to run the
//! engine on the GPU.

use std::path::PathBuf;
use std::sync::Arc;
use yomitoku_webui::{
    render, EngineConfig, InputDocument, NoopProgress, OcrEngine, OutputFormat,
    RecognitionProgress, WebUiError, YomitokuEngine,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn engine() -> YomitokuEngine {
    let mut config = EngineConfig::default();
    config.device = std::env::var("YOMITOKU_DEVICE").ok();
    YomitokuEngine::new(config)
}

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_enabled {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

/// Skip this test unless E2E_ENABLED is set *and* `path` exists.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        e2e_skip_unless_enabled!();
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn load(path: &PathBuf) -> InputDocument {
    let bytes = std::fs::read(path).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    InputDocument::from_upload(&name, bytes, usize::MAX).unwrap()
}

fn blank_png() -> InputDocument {
    use image::{DynamicImage, Rgb, RgbImage};
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, Rgb([255, 255, 255])));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    InputDocument::from_upload("blank.png", buf, usize::MAX).unwrap()
}

/// Assert the markdown passes basic quality checks.
fn assert_markdown_quality(md: &str, context: &str) {
    assert!(!md.trim().is_empty(), "[{context}] Markdown is empty");
    assert!(md.ends_with('\n'), "[{context}] Markdown must end with a newline");
    assert!(
        !md.ends_with("\n\n"),
        "[{context}] Markdown must end with exactly one newline"
    );
    assert!(
        !md.contains("\n\n\n"),
        "[{context}] Output has more than one consecutive blank line"
    );
    let invisible = ['\u{200B}', '\u{FEFF}', '\u{200C}', '\u{200D}', '\u{2060}'];
    for ch in invisible {
        assert!(
            !md.contains(ch),
            "[{context}] Output contains invisible char U+{:04X}",
            ch as u32
        );
    }
}

// ── Progress tracking ────────────────────────────────────────────────────────

#[derive(Default)]
struct StageLog(std::sync::Mutex<Vec<f32>>);

impl RecognitionProgress for StageLog {
    fn on_stage(&self, fraction: f32, _message: &str) {
        self.0.lock().unwrap().push(fraction);
    }
}

// ── Engine ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_engine_binary() {
    let engine = YomitokuEngine::new(EngineConfig {
        command: "yomitoku-definitely-not-installed".into(),
        ..EngineConfig::default()
    });
    let err = engine
        .recognize(&blank_png(), &NoopProgress)
        .await
        .unwrap_err();
    assert!(
        matches!(err, WebUiError::EngineNotFound { .. }),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_blank_page_has_no_text() {
    e2e_skip_unless_enabled!();

    let log = StageLog::default();
    let result = engine().recognize(&blank_png(), &log).await.unwrap();
    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.block_count(), 0);
    assert_eq!(*log.0.lock().unwrap(), vec![0.2, 0.8, 1.0]);

    let md = render(&result, OutputFormat::Markdown);
    assert_eq!(md.body, "\n");
    let csv = render(&result, OutputFormat::Csv);
    assert!(csv.fallback);
}

#[tokio::test]
async fn test_recognize_sample_image() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.png"));

    let result = engine().recognize(&load(&path), &NoopProgress).await.unwrap();
    println!(
        "sample.png: {} pages, {} blocks, {} tables",
        result.pages.len(),
        result.block_count(),
        result.table_count()
    );
    assert!(result.block_count() > 0, "no text recognised");

    let md = render(&result, OutputFormat::Markdown).body;
    assert_markdown_quality(&md, "sample.png");

    let json = render(&result, OutputFormat::Json).body;
    let back: yomitoku_webui::RecognitionResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);

    let html = render(&result, OutputFormat::Html).body;
    assert!(html.contains("data-bbox="));
}

#[tokio::test]
async fn test_recognize_multipage_pdf() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));

    let result = engine().recognize(&load(&path), &NoopProgress).await.unwrap();
    let numbers: Vec<usize> = result.pages.iter().map(|p| p.number).collect();
    let mut sorted = numbers.clone();
    sorted.sort_unstable();
    assert_eq!(numbers, sorted, "pages must come back in order");

    let md = render(&result, OutputFormat::Markdown).body;
    assert_markdown_quality(&md, "sample.pdf");
    if result.pages.len() > 1 {
        assert!(md.contains("\n---\n"), "pages should be separated by a rule");
    }
}

#[tokio::test]
async fn test_table_document_exports_grid_csv() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("table.png"));

    let result = engine().recognize(&load(&path), &NoopProgress).await.unwrap();
    assert!(result.has_tables(), "expected at least one table");

    let csv = render(&result, OutputFormat::Csv);
    assert!(!csv.fallback);
    assert!(!csv.body.trim().is_empty());

    let md = render(&result, OutputFormat::Markdown).body;
    assert!(md.contains("| --- |"), "table should render as GFM");
}

#[tokio::test]
async fn test_engine_shared_across_tasks() {
    e2e_skip_unless_enabled!();

    let engine: Arc<dyn OcrEngine> = Arc::new(engine());
    let handle = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.recognize(&blank_png(), &NoopProgress).await }
    });
    let result = handle.await.unwrap().unwrap();
    assert_eq!(result.engine, "yomitoku");
}
