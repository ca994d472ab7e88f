use super::page::render_index;
use super::state::AppState;
use crate::error::{ErrorKind, WebUiError};
use crate::export::OutputFormat;
use crate::session::SessionSlot;
use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "yomitoku_session";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: ErrorKind,
}

fn error_response(status: StatusCode, jar: CookieJar, err: &WebUiError) -> Response {
    (
        status,
        jar,
        Json(ErrorBody {
            error: err.to_string(),
            kind: err.kind(),
        }),
    )
        .into_response()
}

/// Resolve (or start) the caller's session and refresh its cookie.
fn session_for(state: &AppState, jar: CookieJar) -> (CookieJar, Arc<SessionSlot>) {
    let id = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok());
    let (id, slot) = state.sessions.get_or_create(id);
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), slot)
}

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, slot) = session_for(&state, jar);
    let mut session = slot.session.lock().await;
    let notice = session.take_notice();
    match render_index(&session, notice.as_ref(), &state) {
        Ok(html) => (jar, Html(html)).into_response(),
        Err(e) => {
            error!("{}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                jar,
                format!("{e}"),
            )
                .into_response()
        }
    }
}

pub async fn upload(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> (CookieJar, Redirect) {
    let (jar, slot) = session_for(&state, jar);
    let file = read_file_field(&mut multipart).await;

    let mut session = slot.session.lock().await;
    let outcome = file.and_then(|(name, bytes)| {
        info!("Upload '{}' ({} bytes)", name, bytes.len());
        session.upload(&name, bytes, state.config.max_upload_bytes)
    });
    if let Err(e) = outcome {
        warn!("Upload rejected: {}", e);
        session.record_error(&e);
    }
    (jar, Redirect::to("/"))
}

/// First multipart field named `file`.
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), WebUiError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| WebUiError::UploadRejected(e.body_text()))?;
        let Some(field) = field else {
            return Err(WebUiError::UploadRejected("no file was selected".into()));
        };
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| WebUiError::UploadRejected(e.body_text()))?;
        return Ok((name, bytes.to_vec()));
    }
}

/// Raw clipboard image. The body is read here, bounded by the upload limit,
/// so an oversize paste gets the same JSON error as any other rejection.
pub async fn paste(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let (jar, slot) = session_for(&state, jar);
    let limit = state.config.max_upload_bytes;
    let outcome = match read_paste(&headers, body, limit).await {
        Ok(bytes) => slot.session.lock().await.paste(bytes, limit),
        Err(e) => Err(e),
    };
    match outcome {
        Ok(()) => (StatusCode::NO_CONTENT, jar).into_response(),
        Err(e) => {
            warn!("Paste rejected: {}", e);
            error_response(StatusCode::UNPROCESSABLE_ENTITY, jar, &e)
        }
    }
}

async fn read_paste(headers: &HeaderMap, body: Body, limit: usize) -> Result<Vec<u8>, WebUiError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Some(size) = declared.filter(|&size| size > limit) {
        return Err(WebUiError::InputTooLarge {
            name: "pasted image".into(),
            size,
            limit,
        });
    }
    // One byte of slack lets `from_paste` report the size itself.
    let bytes = axum::body::to_bytes(body, limit.saturating_add(1))
        .await
        .map_err(|e| WebUiError::UploadRejected(e.to_string()))?;
    Ok(bytes.to_vec())
}

#[derive(Debug, Deserialize)]
pub struct FormatForm {
    format: String,
}

pub async fn select_format(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<FormatForm>,
) -> Response {
    let (jar, slot) = session_for(&state, jar);
    let Some(format) = OutputFormat::from_name(&form.format) else {
        let err = WebUiError::UnsupportedFormat {
            name: form.format,
            supported: "md, json, html, csv".into(),
        };
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, jar, &err);
    };
    slot.session.lock().await.select_format(format);
    (jar, Redirect::to("/")).into_response()
}

pub async fn execute(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let (jar, slot) = session_for(&state, jar);
    let mut session = slot.session.lock().await;
    if let Err(e) = session.execute(state.engine.as_ref(), slot.as_ref()).await {
        session.record_error(&e);
    }
    (jar, Redirect::to("/"))
}

pub async fn download(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, slot) = session_for(&state, jar);
    let session = slot.session.lock().await;
    let Some(file) = session.download(Local::now().date_naive()) else {
        return error_response(
            StatusCode::NOT_FOUND,
            jar,
            &WebUiError::Internal("no result to download; run OCR first".into()),
        );
    };
    info!("Download '{}' ({} bytes)", file.file_name, file.body.len());
    (
        jar,
        [
            (CONTENT_TYPE, file.mime_type.to_string()),
            (CONTENT_DISPOSITION, content_disposition(&file.file_name)),
        ],
        file.body,
    )
        .into_response()
}

/// `attachment` header with an ASCII fallback and an RFC 5987 UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

pub async fn session_state(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, slot) = session_for(&state, jar);
    let snapshot = slot.session.lock().await.snapshot();
    (jar, Json(snapshot))
}

pub async fn progress(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, slot) = session_for(&state, jar);
    (jar, Json(slot.progress()))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_file_name_passes_through() {
        assert_eq!(
            content_disposition("scan_20250101_ocr.md"),
            "attachment; filename=\"scan_20250101_ocr.md\"; filename*=UTF-8''scan_20250101_ocr.md"
        );
    }

    #[test]
    fn non_ascii_file_name_is_encoded() {
        let header = content_disposition("請求書_20250101_ocr.csv");
        assert!(header.starts_with("attachment; filename=\"____20250101_ocr.csv\""));
        assert!(header.contains("filename*=UTF-8''%E8%AB%8B"));
        assert!(header.is_ascii());
    }

    #[test]
    fn reserved_characters_are_percent_encoded() {
        let header = content_disposition("a b;\"c\".md");
        assert_eq!(
            header,
            "attachment; filename=\"a b;_c_.md\"; filename*=UTF-8''a%20b%3B%22c%22.md"
        );
    }
}
