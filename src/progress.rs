//! Progress-callback trait for a single OCR invocation.
//!
//! An engine reports coarse stages through [`RecognitionProgress`] while it
//! runs. The web server implements the trait to publish a per-session
//! [`ProgressSnapshot`] that the page polls while the execute request is
//! still pending.
//!
//! # Example
//!
//! ```rust
//! use yomitoku_webui::RecognitionProgress;
//! use std::sync::Mutex;
//!
//! struct LastStage(Mutex<Option<String>>);
//!
//! impl RecognitionProgress for LastStage {
//!     fn on_stage(&self, _fraction: f32, message: &str) {
//!         *self.0.lock().unwrap() = Some(message.to_string());
//!     }
//! }
//!
//! let cb = LastStage(Mutex::new(None));
//! cb.on_stage(0.2, "Running OCR engine");
//! assert_eq!(cb.0.lock().unwrap().as_deref(), Some("Running OCR engine"));
//! ```

use serde::Serialize;
use std::sync::Arc;

/// Stage reported right after the engine process is started.
pub const STAGE_RUNNING: (f32, &str) = (0.2, "Running OCR engine");
/// Stage reported once the engine exited and its output is being read.
pub const STAGE_PROCESSING: (f32, &str) = (0.8, "Processing results");
/// Final stage of a successful run.
pub const STAGE_COMPLETE: (f32, &str) = (1.0, "Complete");

/// Called by an engine as a recognition progresses.
///
/// All methods default to no-ops so implementations override only what
/// they need. Implementations must be `Send + Sync`: the callback is shared
/// with the task awaiting the engine.
pub trait RecognitionProgress: Send + Sync {
    /// Called once before the engine is invoked.
    ///
    /// # Arguments
    /// * `input_name`: file name of the document being recognised
    fn on_start(&self, input_name: &str) {
        let _ = input_name;
    }

    /// Called at each stage boundary.
    ///
    /// # Arguments
    /// * `fraction`: rough completion in `0.0..=1.0`
    /// * `message` : short human-readable stage name
    fn on_stage(&self, fraction: f32, message: &str) {
        let _ = (fraction, message);
    }

    /// Called when the engine returned a result.
    ///
    /// # Arguments
    /// * `pages` : number of pages recognised
    /// * `blocks`: number of text blocks across all pages
    fn on_complete(&self, pages: usize, blocks: usize) {
        let _ = (pages, blocks);
    }

    /// Called when the invocation failed.
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl RecognitionProgress for NoopProgress {}

/// Convenience alias for a shared callback.
pub type ProgressCallback = Arc<dyn RecognitionProgress>;

/// Point-in-time view of a recognition, as served by `/api/progress`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub running: bool,
    pub fraction: f32,
    pub message: String,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            running: false,
            fraction: 0.0,
            message: String::new(),
        }
    }
}

impl ProgressSnapshot {
    /// Apply one callback event to the snapshot.
    pub fn started(&mut self, input_name: &str) {
        self.running = true;
        self.fraction = 0.0;
        self.message = format!("Starting OCR on {input_name}");
    }

    pub fn stage(&mut self, fraction: f32, message: &str) {
        self.fraction = fraction.clamp(0.0, 1.0);
        self.message = message.to_string();
    }

    pub fn finished(&mut self, message: impl Into<String>) {
        self.running = false;
        self.message = message.into();
    }
}
