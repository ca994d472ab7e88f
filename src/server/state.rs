use crate::config::WebUiConfig;
use crate::engine::SharedEngine;
use crate::session::SessionStore;
use std::sync::Arc;
use std::time::Duration;

/// Shared handler state: configuration, the OCR engine and all sessions.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WebUiConfig>,
    pub engine: SharedEngine,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: WebUiConfig, engine: SharedEngine) -> Self {
        let sessions = SessionStore::new(
            Duration::from_secs(config.session_ttl_secs),
            config.default_format,
        );
        Self {
            config: Arc::new(config),
            engine,
            sessions: Arc::new(sessions),
        }
    }
}
