//! Configuration for the web UI and the OCR engine it drives.
//!
//! All server behaviour is controlled through [`WebUiConfig`], built via its
//! [`WebUiConfigBuilder`]. The engine knobs live in the nested
//! [`EngineConfig`] so an engine can be constructed on its own in tests.

use crate::error::WebUiError;
use crate::export::OutputFormat;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Default listen port (the port the original Streamlit app used).
pub const DEFAULT_PORT: u16 = 8501;

/// Default upload limit in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 200;

/// Configuration for the web server.
///
/// # Example
/// ```rust
/// use yomitoku_webui::WebUiConfig;
///
/// let config = WebUiConfig::builder()
///     .port(9000)
///     .open_browser(false)
///     .engine_device("cpu")
///     .build()
///     .unwrap();
/// assert_eq!(config.port, 9000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebUiConfig {
    /// Interface to bind. Default: `127.0.0.1`.
    pub host: String,

    /// TCP port. Default: [`DEFAULT_PORT`].
    pub port: u16,

    /// Open the default browser once the server is listening. Default: true.
    pub open_browser: bool,

    /// Largest accepted upload or paste, in bytes. Default: 200 MB.
    pub max_upload_bytes: usize,

    /// Sessions idle for longer than this are dropped. Default: 3600.
    pub session_ttl_secs: u64,

    /// Format selected for a fresh session. Default: Markdown.
    pub default_format: OutputFormat,

    /// OCR engine invocation.
    pub engine: EngineConfig,
}

impl Default for WebUiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            open_browser: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            session_ttl_secs: 3600,
            default_format: OutputFormat::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl WebUiConfig {
    /// Create a new builder for `WebUiConfig`.
    pub fn builder() -> WebUiConfigBuilder {
        WebUiConfigBuilder {
            config: Self::default(),
        }
    }

    /// Parse `host:port` into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, WebUiError> {
        let host = match self.host.as_str() {
            "localhost" => "127.0.0.1",
            h => h,
        };
        let raw = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        };
        raw.parse()
            .map_err(|e| WebUiError::InvalidConfig(format!("bad listen address '{raw}': {e}")))
    }

    /// URL a browser should open to reach the UI.
    pub fn browser_url(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" => "localhost",
            h => h,
        };
        format!("http://{}:{}/", host, self.port)
    }
}

/// How the external OCR engine is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Executable name or path. Default: `yomitoku`.
    pub command: String,

    /// Value for `-d` (e.g. `cpu`, `cuda`, `mps`). None leaves the engine default.
    pub device: Option<String>,

    /// Pass `--figure_letter` so text inside figures is recognised. Default: true.
    pub figure_letter: bool,

    /// Extra arguments appended verbatim after the built-in ones.
    pub extra_args: Vec<String>,

    /// Kill the engine after this many seconds. None waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: "yomitoku".to_string(),
            device: None,
            figure_letter: true,
            extra_args: Vec::new(),
            timeout_secs: None,
        }
    }
}

/// Builder for [`WebUiConfig`].
#[derive(Debug)]
pub struct WebUiConfigBuilder {
    config: WebUiConfig,
}

impl WebUiConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn open_browser(mut self, v: bool) -> Self {
        self.config.open_browser = v;
        self
    }

    pub fn max_upload_mb(mut self, mb: usize) -> Self {
        self.config.max_upload_bytes = mb.max(1).saturating_mul(1024 * 1024);
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn session_ttl_secs(mut self, secs: u64) -> Self {
        self.config.session_ttl_secs = secs.max(60);
        self
    }

    pub fn default_format(mut self, format: OutputFormat) -> Self {
        self.config.default_format = format;
        self
    }

    pub fn engine_command(mut self, command: impl Into<String>) -> Self {
        self.config.engine.command = command.into();
        self
    }

    pub fn engine_device(mut self, device: impl Into<String>) -> Self {
        self.config.engine.device = Some(device.into());
        self
    }

    pub fn figure_letter(mut self, v: bool) -> Self {
        self.config.engine.figure_letter = v;
        self
    }

    pub fn engine_arg(mut self, arg: impl Into<String>) -> Self {
        self.config.engine.extra_args.push(arg.into());
        self
    }

    pub fn engine_timeout_secs(mut self, secs: u64) -> Self {
        self.config.engine.timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WebUiConfig, WebUiError> {
        let c = &self.config;
        if c.host.trim().is_empty() {
            return Err(WebUiError::InvalidConfig("host must not be empty".into()));
        }
        if c.engine.command.trim().is_empty() {
            return Err(WebUiError::InvalidConfig(
                "engine command must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(WebUiError::InvalidConfig(
                "upload limit must be ≥ 1 byte".into(),
            ));
        }
        if c.engine.timeout_secs == Some(0) {
            return Err(WebUiError::InvalidConfig(
                "engine timeout must be ≥ 1s (omit it to wait indefinitely)".into(),
            ));
        }
        c.socket_addr()?;
        Ok(self.config)
    }
}
