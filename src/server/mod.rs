//! HTTP front end.
//!
//! One page (`GET /`) rendered server-side from the caller's [`Session`],
//! plus form endpoints that mutate the session and redirect back to it, and
//! two small JSON endpoints polled by the page's script.
//!
//! | Route            | Effect                                               |
//! |------------------|------------------------------------------------------|
//! | `GET /`          | render the page                                      |
//! | `POST /upload`   | multipart `file` → new input, 303 to `/`             |
//! | `POST /paste`    | raw clipboard image → new input, 204 or 422          |
//! | `POST /format`   | form `format` → selected output format, 303 to `/`   |
//! | `POST /execute`  | run the engine once, 303 to `/`                      |
//! | `GET /download`  | current artifact as an attachment, 404 without one   |
//! | `GET /api/state` | session snapshot                                     |
//! | `GET /api/progress` | `{running, fraction, message}`                    |
//! | `GET /health`    | `{"status":"ok"}`                                    |
//!
//! [`Session`]: crate::session::Session

mod handlers;
mod page;
mod state;

pub use handlers::SESSION_COOKIE;
pub use state::AppState;

use crate::config::WebUiConfig;
use crate::engine::SharedEngine;
use crate::error::WebUiError;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Multipart framing on top of the file itself.
const BODY_OVERHEAD: usize = 64 * 1024;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes.saturating_add(BODY_OVERHEAD);
    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/paste", post(handlers::paste))
        .route("/format", post(handlers::select_format))
        .route("/execute", post(handlers::execute))
        .route("/download", get(handlers::download))
        .route("/api/state", get(handlers::session_state))
        .route("/api/progress", get(handlers::progress))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A bound listener, ready to serve.
pub struct Server {
    listener: TcpListener,
    state: AppState,
}

impl Server {
    /// Bind the configured address.
    pub async fn bind(config: WebUiConfig, engine: SharedEngine) -> Result<Self, WebUiError> {
        let addr = config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| WebUiError::io(addr.to_string(), e))?;
        Ok(Self {
            listener,
            state: AppState::new(config, engine),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, WebUiError> {
        self.listener
            .local_addr()
            .map_err(|e| WebUiError::io("listener", e))
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> Result<(), WebUiError> {
        let addr = self.local_addr()?;
        info!(
            "Serving on http://{} (engine: {})",
            addr,
            self.state.engine.name()
        );
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| WebUiError::io(addr.to_string(), e))
    }
}

/// Bind and serve in one step.
pub async fn serve(config: WebUiConfig, engine: SharedEngine) -> Result<(), WebUiError> {
    Server::bind(config, engine).await?.run().await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            warn!("Cannot listen for Ctrl-C ({}); serving until killed", e);
            std::future::pending::<()>().await
        }
    }
}
