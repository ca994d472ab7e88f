//! Pipeline stages between an uploaded file and a recognition result.
//!
//! ## Data Flow
//!
//! ```text
//! upload / paste ──▶ input ──▶ preview          (on intake)
//!                      │
//!                      └──▶ recognize ──▶ RecognitionResult   (on execute)
//! ```
//!
//! 1. [`input`]    : validate extension and signature, build an `InputDocument`
//! 2. [`preview`]  : decode and downscale images into a PNG data URI
//! 3. [`recognize`]: the single engine call, bracketed by progress events
//! 4. [`postprocess`]: deterministic cleanup applied to the Markdown export

pub mod input;
pub mod postprocess;
pub mod preview;
pub mod recognize;
