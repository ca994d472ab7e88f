//! Error types for the yomitoku-webui library.
//!
//! Every failure the UI can hit is a [`WebUiError`]. Handlers never let one
//! escape as a crash: they classify it with [`WebUiError::kind`] and turn it
//! into an inline message, an error banner, or a JSON error body.
//!
//! * [`ErrorKind::InvalidFormat`]: the input was refused before any engine
//!   call. The session is left exactly as it was.
//! * [`ErrorKind::RecognitionFailure`]: the engine call failed. The session's
//!   previous result is cleared so a stale result is never shown next to a
//!   failed attempt.
//! * [`ErrorKind::Internal`]: the server itself misbehaved (temp dir, template,
//!   configuration).
//!
//! Export never fails: a CSV request on a result without tables falls back to
//! one row per text block, see [`crate::export`].

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification used by the HTTP layer to decide how to surface an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidFormat,
    RecognitionFailure,
    Internal,
}

/// All errors returned by the yomitoku-webui library.
#[derive(Debug, Error)]
pub enum WebUiError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// File extension is not one of the supported input formats.
    #[error("Unsupported file format '{name}'. Supported formats: {supported}")]
    UnsupportedFormat { name: String, supported: String },

    /// The extension is supported but the bytes are something else.
    #[error("'{name}' does not look like a {declared} file (content does not match its extension)")]
    ContentMismatch { name: String, declared: &'static str },

    /// Image bytes passed the magic check but could not be decoded.
    #[error("Failed to load image '{name}': {detail}")]
    UndecodableImage { name: String, detail: String },

    /// Zero-byte upload or empty clipboard payload.
    #[error("'{name}' is empty")]
    EmptyInput { name: String },

    /// Upload exceeds the configured size limit.
    #[error("'{name}' is {size} bytes; the limit is {limit} bytes.\nRaise it with --max-upload-mb.")]
    InputTooLarge { name: String, size: usize, limit: usize },

    /// The upload request body could not be read (too large or truncated).
    #[error("Upload could not be read: {0}")]
    UploadRejected(String),

    // ── Recognition errors ────────────────────────────────────────────────
    /// Execute was requested before any valid input was selected.
    #[error("No input document selected. Upload or paste an image first.")]
    NoInput,

    /// The engine binary could not be started.
    #[error("OCR engine '{command}' could not be started: {detail}\nIs it installed and on PATH? Override with --engine.")]
    EngineNotFound { command: String, detail: String },

    /// The engine exited with a non-zero status.
    #[error("OCR engine failed (exit status {status}). Please run it again.\n{stderr}")]
    EngineFailed { status: String, stderr: String },

    /// The engine exceeded the configured timeout and was killed.
    #[error("OCR engine timed out after {secs}s")]
    EngineTimeout { secs: u64 },

    /// The engine exited successfully but wrote no result file.
    #[error("OCR engine produced no output in '{dir}'")]
    NoOutput { dir: PathBuf },

    /// A result file exists but does not parse as engine JSON.
    #[error("OCR engine output '{path}' is malformed: {detail}")]
    MalformedOutput { path: PathBuf, detail: String },

    // ── Server errors ─────────────────────────────────────────────────────
    /// Page template failed to render.
    #[error("Failed to render page: {0}")]
    Template(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O on the engine's temporary workspace.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebUiError {
    /// Classify the error for the UI.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WebUiError::UnsupportedFormat { .. }
            | WebUiError::ContentMismatch { .. }
            | WebUiError::UndecodableImage { .. }
            | WebUiError::EmptyInput { .. }
            | WebUiError::InputTooLarge { .. }
            | WebUiError::UploadRejected(_) => ErrorKind::InvalidFormat,
            WebUiError::NoInput
            | WebUiError::EngineNotFound { .. }
            | WebUiError::EngineFailed { .. }
            | WebUiError::EngineTimeout { .. }
            | WebUiError::NoOutput { .. }
            | WebUiError::MalformedOutput { .. } => ErrorKind::RecognitionFailure,
            WebUiError::Template(_)
            | WebUiError::InvalidConfig(_)
            | WebUiError::Io { .. }
            | WebUiError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WebUiError::Io {
            path: path.into(),
            source,
        }
    }
}
