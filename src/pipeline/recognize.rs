//! Recognition invoker: one engine call per user-triggered execution.
//!
//! This is the error boundary for the OCR step. It brackets the engine call
//! with progress events and logging and hands the outcome back unchanged;
//! there is no retry and no partial result. The caller decides what a
//! failure does to session state (see [`crate::session::Session::execute`]).

use crate::engine::OcrEngine;
use crate::error::WebUiError;
use crate::pipeline::input::InputDocument;
use crate::progress::RecognitionProgress;
use crate::result::RecognitionResult;
use std::time::Instant;
use tracing::{info, warn};

/// Run `engine` on `input` exactly once.
pub async fn recognize(
    engine: &dyn OcrEngine,
    input: &InputDocument,
    progress: &dyn RecognitionProgress,
) -> Result<RecognitionResult, WebUiError> {
    let start = Instant::now();
    info!("Starting recognition of '{}' with {}", input.name(), engine.name());
    progress.on_start(input.name());

    match engine.recognize(input, progress).await {
        Ok(result) => {
            progress.on_complete(result.pages.len(), result.block_count());
            info!(
                "Recognition of '{}' finished in {}ms",
                input.name(),
                start.elapsed().as_millis()
            );
            Ok(result)
        }
        Err(e) => {
            progress.on_error(&e.to_string());
            warn!(
                "Recognition of '{}' failed after {}ms: {}",
                input.name(),
                start.elapsed().as_millis(),
                e
            );
            Err(e)
        }
    }
}
