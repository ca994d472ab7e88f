//! # yomitoku-webui
//!
//! A browser front end for the [yomitoku](https://github.com/kotaro-kinoshita/yomitoku)
//! document OCR engine.
//!
//! ## Why this crate?
//!
//! yomitoku is an excellent Japanese document recogniser, but it is a command
//! line tool: one file in, a directory of result files out. This crate wraps it
//! in a single-page web UI. Upload or paste a document, press *Run OCR*, and
//! read the result as Markdown, JSON, HTML or CSV, switching between them
//! without running the engine again.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload / paste
//!  │
//!  ├─ 1. Input     validate extension + signature      (pipeline::input)
//!  ├─ 2. Preview   decode, downscale, PNG data URI     (pipeline::preview)
//!  ├─ 3. Engine    yomitoku -f json in a temp dir      (engine)
//!  ├─ 4. Result    per-page JSON → RecognitionResult   (engine::schema)
//!  └─ 5. Export    Markdown / JSON / HTML / CSV        (export)
//! ```
//!
//! Steps 1–2 run when a file arrives, step 3–4 once per *Run OCR*, and step 5
//! every time the page is rendered from the stored result.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use yomitoku_webui::{serve, WebUiConfig, YomitokuEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WebUiConfig::builder().port(8501).build()?;
//!     let engine = YomitokuEngine::new(config.engine.clone());
//!     serve(config, Arc::new(engine)).await?;
//!     Ok(())
//! }
//! ```
//!
//! Rendering works without the server too:
//!
//! ```rust
//! use yomitoku_webui::{render, OutputFormat, RecognitionResult};
//!
//! let result = RecognitionResult::from_lines("example", &["Hello World"]);
//! assert_eq!(render(&result, OutputFormat::Markdown).body, "Hello World\n");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `yomitoku-webui` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod progress;
pub mod result;
pub mod server;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EngineConfig, WebUiConfig, WebUiConfigBuilder};
pub use engine::{OcrEngine, SharedEngine, YomitokuEngine};
pub use error::{ErrorKind, WebUiError};
pub use export::{render, OutputFormat, RenderedArtifact};
pub use pipeline::input::{InputDocument, InputFormat};
pub use pipeline::preview::Preview;
pub use progress::{NoopProgress, ProgressCallback, ProgressSnapshot, RecognitionProgress};
pub use result::{BlockRole, BoundingBox, Page, RecognitionResult, Table, TableCell, TextBlock};
pub use server::{router, serve, AppState, Server};
pub use session::{Notice, Session, SessionStore};
