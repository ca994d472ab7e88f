//! The external OCR capability.
//!
//! [`OcrEngine`] is the only seam between this crate and the recogniser. The
//! shipped implementation, [`YomitokuEngine`], runs the `yomitoku` command
//! line tool and maps its JSON output into a
//! [`RecognitionResult`](crate::result::RecognitionResult). Tests substitute
//! their own implementation to count calls or script failures.
//!
//! ## Data Flow
//!
//! ```text
//! InputDocument ──▶ temp dir ──▶ yomitoku -f json ──▶ *_p<N>.json ──▶ RecognitionResult
//!                  (tempfile)    (tokio::process)      (schema)
//! ```

pub mod schema;
pub mod yomitoku;

use crate::error::WebUiError;
use crate::pipeline::input::InputDocument;
use crate::progress::RecognitionProgress;
use crate::result::RecognitionResult;
use async_trait::async_trait;
use std::sync::Arc;

pub use yomitoku::YomitokuEngine;

/// A document OCR capability.
///
/// One call per user-triggered execution. Implementations must not retry on
/// their own: a failure is terminal for that attempt.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short name shown in logs and recorded in the result.
    fn name(&self) -> &str;

    /// Recognise `input`, reporting coarse stages to `progress`.
    async fn recognize(
        &self,
        input: &InputDocument,
        progress: &dyn RecognitionProgress,
    ) -> Result<RecognitionResult, WebUiError>;
}

/// Shared engine handle stored in the server state.
pub type SharedEngine = Arc<dyn OcrEngine>;
