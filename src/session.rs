//! Per-browser session state and the store that holds it.
//!
//! A [`Session`] is the whole UI state for one browser: the current input and
//! its preview, the last recognition result, the selected output format, and
//! a one-shot notice for the next page render. Handlers receive it explicitly,
//! so each operation is testable on a constructed value.
//!
//! ## Locking
//!
//! ```text
//! SessionStore ── std Mutex<HashMap<Uuid, Arc<SessionSlot>>>   (held briefly)
//!      │
//!      └─ SessionSlot ── tokio Mutex<Session>          (held across the OCR call)
//!                     └─ std Mutex<ProgressSnapshot>   (never held across .await)
//! ```
//!
//! `/api/progress` only touches the snapshot lock, so polling never waits on
//! a running recognition.

use crate::engine::OcrEngine;
use crate::error::{ErrorKind, WebUiError};
use crate::export::{render, OutputFormat, RenderedArtifact};
use crate::pipeline::input::InputDocument;
use crate::pipeline::preview::{build_preview, Preview};
use crate::pipeline::recognize::recognize;
use crate::progress::{ProgressSnapshot, RecognitionProgress, STAGE_COMPLETE};
use crate::result::RecognitionResult;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

// ── Notices ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Message shown once on the next page render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    /// Set for errors; decides between the inline message and the banner.
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            kind: None,
            message: message.into(),
        }
    }

    pub fn error(error: &WebUiError) -> Self {
        Self {
            level: NoticeLevel::Error,
            kind: Some(error.kind()),
            message: error.to_string(),
        }
    }
}

// ── Session ──────────────────────────────────────────────────────────────

/// Artifact ready to be served as an attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub mime_type: &'static str,
    pub body: String,
}

/// Summary of the current input for `/api/state`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSummary {
    pub name: String,
    pub format: String,
    pub size: usize,
}

/// JSON view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub input: Option<InputSummary>,
    pub format: OutputFormat,
    pub can_execute: bool,
    pub has_result: bool,
    pub pages: usize,
    pub blocks: usize,
    pub tables: usize,
    pub notice: Option<Notice>,
    pub artifact: Option<RenderedArtifact>,
}

/// UI state of one browser.
#[derive(Debug, Default)]
pub struct Session {
    input: Option<InputDocument>,
    preview: Option<Preview>,
    result: Option<RecognitionResult>,
    format: OutputFormat,
    notice: Option<Notice>,
}

impl Session {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Accept an uploaded file.
    ///
    /// On error nothing changes: the previous input, preview and result stay.
    pub fn upload(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        max_bytes: usize,
    ) -> Result<(), WebUiError> {
        let doc = InputDocument::from_upload(file_name, bytes, max_bytes)?;
        self.accept(doc)
    }

    /// Accept image data pasted from the clipboard.
    pub fn paste(&mut self, bytes: Vec<u8>, max_bytes: usize) -> Result<(), WebUiError> {
        let doc = InputDocument::from_paste(bytes, max_bytes)?;
        self.accept(doc)
    }

    fn accept(&mut self, doc: InputDocument) -> Result<(), WebUiError> {
        let preview = build_preview(&doc)?;
        info!("Session input is now '{}'", doc.name());
        self.input = Some(doc);
        self.preview = Some(preview);
        // The old result belongs to the old input.
        self.result = None;
        self.notice = None;
        Ok(())
    }

    pub fn select_format(&mut self, format: OutputFormat) {
        debug!("Output format -> {}", format);
        self.format = format;
    }

    pub fn can_execute(&self) -> bool {
        self.input.is_some()
    }

    /// Run the engine once on the current input.
    ///
    /// Success replaces the stored result and sets a success notice. Failure
    /// clears the stored result, so no stale output is shown next to the error.
    pub async fn execute(
        &mut self,
        engine: &dyn OcrEngine,
        progress: &dyn RecognitionProgress,
    ) -> Result<(), WebUiError> {
        let Some(input) = self.input.as_ref() else {
            self.result = None;
            return Err(WebUiError::NoInput);
        };

        match recognize(engine, input, progress).await {
            Ok(result) => {
                self.notice = Some(Notice::success(format!(
                    "Processing complete: {} page(s), {} text block(s), {} table(s)",
                    result.pages.len(),
                    result.block_count(),
                    result.table_count()
                )));
                self.result = Some(result);
                Ok(())
            }
            Err(e) => {
                self.result = None;
                Err(e)
            }
        }
    }

    /// Current result rendered in the selected format.
    pub fn artifact(&self) -> Option<RenderedArtifact> {
        self.result.as_ref().map(|r| render(r, self.format))
    }

    /// Current artifact named `<stem>_<YYYYMMDD>_ocr.<ext>`.
    pub fn download(&self, date: NaiveDate) -> Option<Download> {
        let artifact = self.artifact()?;
        let stem = self.input.as_ref().map(|i| i.stem()).unwrap_or("document");
        Some(Download {
            file_name: artifact.file_name(stem, date),
            mime_type: artifact.mime_type(),
            body: artifact.body,
        })
    }

    pub fn record_error(&mut self, error: &WebUiError) {
        self.notice = Some(Notice::error(error));
    }

    /// Take the pending notice; it is shown once.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn input(&self) -> Option<&InputDocument> {
        self.input.as_ref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn result(&self) -> Option<&RecognitionResult> {
        self.result.as_ref()
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            input: self.input.as_ref().map(|i| InputSummary {
                name: i.name().to_string(),
                format: i.format().to_string(),
                size: i.len(),
            }),
            format: self.format,
            can_execute: self.can_execute(),
            has_result: self.result.is_some(),
            pages: self.result.as_ref().map(|r| r.pages.len()).unwrap_or(0),
            blocks: self.result.as_ref().map(|r| r.block_count()).unwrap_or(0),
            tables: self.result.as_ref().map(|r| r.table_count()).unwrap_or(0),
            notice: self.notice.clone(),
            artifact: self.artifact(),
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────────

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One browser's session plus its progress snapshot.
#[derive(Debug)]
pub struct SessionSlot {
    pub session: tokio::sync::Mutex<Session>,
    progress: Mutex<ProgressSnapshot>,
    last_seen: Mutex<Instant>,
}

impl SessionSlot {
    fn new(format: OutputFormat) -> Self {
        Self {
            session: tokio::sync::Mutex::new(Session::new(format)),
            progress: Mutex::new(ProgressSnapshot::default()),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn progress(&self) -> ProgressSnapshot {
        lock(&self.progress).clone()
    }

    fn touch(&self) {
        *lock(&self.last_seen) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*lock(&self.last_seen))
    }
}

impl RecognitionProgress for SessionSlot {
    fn on_start(&self, input_name: &str) {
        lock(&self.progress).started(input_name);
    }

    fn on_stage(&self, fraction: f32, message: &str) {
        lock(&self.progress).stage(fraction, message);
    }

    fn on_complete(&self, _pages: usize, _blocks: usize) {
        let mut p = lock(&self.progress);
        p.stage(STAGE_COMPLETE.0, STAGE_COMPLETE.1);
        p.finished(STAGE_COMPLETE.1);
    }

    fn on_error(&self, error: &str) {
        lock(&self.progress).finished(format!("Failed: {error}"));
    }
}

/// All live sessions, keyed by the session cookie.
#[derive(Debug)]
pub struct SessionStore {
    slots: Mutex<HashMap<Uuid, Arc<SessionSlot>>>,
    ttl: Duration,
    default_format: OutputFormat,
}

impl SessionStore {
    pub fn new(ttl: Duration, default_format: OutputFormat) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
            default_format,
        }
    }

    /// Look up the session for `id`, creating a fresh one when the id is
    /// missing or unknown. Returns the id the caller should set as cookie.
    pub fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, Arc<SessionSlot>) {
        let mut slots = lock(&self.slots);
        self.prune(&mut slots);

        if let Some(slot) = id.and_then(|id| slots.get(&id).map(|s| (id, Arc::clone(s)))) {
            slot.1.touch();
            return slot;
        }

        let id = Uuid::new_v4();
        let slot = Arc::new(SessionSlot::new(self.default_format));
        slots.insert(id, Arc::clone(&slot));
        debug!("Created session {} ({} live)", id, slots.len());
        (id, slot)
    }

    /// Existing session only; never creates one.
    pub fn get(&self, id: Uuid) -> Option<Arc<SessionSlot>> {
        let slots = lock(&self.slots);
        let slot = slots.get(&id).map(Arc::clone)?;
        slot.touch();
        Some(slot)
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions idle longer than the TTL that no request is using.
    fn prune(&self, slots: &mut HashMap<Uuid, Arc<SessionSlot>>) {
        let now = Instant::now();
        let before = slots.len();
        slots.retain(|_, slot| Arc::strong_count(slot) > 1 || slot.idle_for(now) <= self.ttl);
        let dropped = before - slots.len();
        if dropped > 0 {
            warn!("Pruned {} idle session(s)", dropped);
        }
    }
}
