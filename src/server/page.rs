//! Server-side rendering of the single page.

use super::state::AppState;
use crate::error::WebUiError;
use crate::export::OutputFormat;
use crate::pipeline::input::{supported_list, SUPPORTED_FORMATS};
use crate::pipeline::preview::human_size;
use crate::session::{Notice, Session};
use chrono::Local;
use serde::Serialize;
use tera::{Context, Tera};

const INDEX_TEMPLATE: &str = include_str!("templates/index.html.tera");

#[derive(Serialize)]
struct FormatOption {
    value: &'static str,
    label: &'static str,
    selected: bool,
}

#[derive(Serialize)]
struct InputView {
    name: String,
    label: &'static str,
    size: String,
}

#[derive(Serialize)]
struct ResultView {
    body: String,
    label: &'static str,
    language: &'static str,
    fallback: bool,
    download_name: String,
}

pub fn render_index(
    session: &Session,
    notice: Option<&Notice>,
    state: &AppState,
) -> Result<String, WebUiError> {
    let mut context = Context::new();

    let formats: Vec<FormatOption> = OutputFormat::ALL
        .iter()
        .map(|f| FormatOption {
            value: f.extension(),
            label: f.label(),
            selected: *f == session.format(),
        })
        .collect();
    context.insert("formats", &formats);

    let accept = SUPPORTED_FORMATS
        .iter()
        .map(|f| format!(".{}", f.extension()))
        .chain(std::iter::once(".tif".to_string()))
        .collect::<Vec<_>>()
        .join(",");
    context.insert("accept", &accept);
    context.insert("supported", &supported_list());
    context.insert("max_upload", &human_size(state.config.max_upload_bytes));
    context.insert("engine", state.engine.name());

    let input = session.input().map(|i| InputView {
        name: i.name().to_string(),
        label: i.format().label(),
        size: human_size(i.len()),
    });
    context.insert("input", &input);
    context.insert("preview", &session.preview());
    context.insert("can_execute", &session.can_execute());
    context.insert("notice", &notice);

    let stem = session.input().map(|i| i.stem()).unwrap_or("document");
    let today = Local::now().date_naive();
    let result = session.artifact().map(|a| ResultView {
        download_name: a.file_name(stem, today),
        label: a.format.label(),
        language: a.format.language(),
        fallback: a.fallback,
        body: a.body,
    });
    context.insert("result", &result);

    Tera::one_off(INDEX_TEMPLATE, &context, true).map_err(|e| WebUiError::Template(error_chain(&e)))
}

fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
