//! CLI binary for yomitoku-webui.
//!
//! A thin shim over the library crate that maps CLI flags to `WebUiConfig`,
//! starts the server and opens the browser.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use yomitoku_webui::{OutputFormat, Server, WebUiConfig, YomitokuEngine};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start on http://localhost:8501 and open the browser
  yomitoku-webui

  # Listen on all interfaces without opening a browser
  yomitoku-webui --host 0.0.0.0 --port 8080 --no-browser

  # Run the engine on the GPU and give up after five minutes
  yomitoku-webui --device cuda --engine-timeout 300

  # Pass extra flags through to yomitoku
  yomitoku-webui --engine-arg --lite --engine-arg --ignore_line_break

SUPPORTED INPUT:   png, jpg, jpeg, pdf, tiff, bmp
OUTPUT FORMATS:    md, json, html, csv

ENVIRONMENT VARIABLES:
  YOMITOKU_WEBUI_HOST, YOMITOKU_WEBUI_PORT, ...  Fallbacks for every flag
  RUST_LOG                                       Override the log filter

SETUP:
  1. Install the engine:  pip install yomitoku
  2. Start the UI:        yomitoku-webui
"#;

#[derive(Parser, Debug)]
#[command(
    name = "yomitoku-webui",
    version,
    about = "Browser front end for the yomitoku OCR engine",
    long_about = "Serve a single-page web UI that accepts an uploaded or pasted document, \
runs the installed yomitoku OCR engine on it, and shows the result as Markdown, JSON, HTML \
or CSV for preview and download.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "YOMITOKU_WEBUI_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "YOMITOKU_WEBUI_PORT", default_value_t = yomitoku_webui::config::DEFAULT_PORT)]
    port: u16,

    /// Do not open the default browser on start.
    #[arg(long, env = "YOMITOKU_WEBUI_NO_BROWSER")]
    no_browser: bool,

    /// OCR engine executable.
    #[arg(long, env = "YOMITOKU_WEBUI_ENGINE", default_value = "yomitoku")]
    engine: String,

    /// Device passed to the engine as `-d` (cpu, cuda, mps).
    #[arg(long, env = "YOMITOKU_WEBUI_DEVICE")]
    device: Option<String>,

    /// Extra argument appended to the engine command line. Repeatable.
    #[arg(long = "engine-arg", env = "YOMITOKU_WEBUI_ENGINE_ARGS", value_delimiter = ' ', allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Kill the engine after this many seconds. No limit when unset.
    #[arg(long, env = "YOMITOKU_WEBUI_ENGINE_TIMEOUT")]
    engine_timeout: Option<u64>,

    /// Do not pass `--figure_letter` to the engine.
    #[arg(long, env = "YOMITOKU_WEBUI_NO_FIGURE_LETTER")]
    no_figure_letter: bool,

    /// Output format selected for new sessions.
    #[arg(long, env = "YOMITOKU_WEBUI_FORMAT", value_enum, default_value = "md")]
    format: FormatArg,

    /// Largest accepted upload, in megabytes.
    #[arg(long, env = "YOMITOKU_WEBUI_MAX_UPLOAD_MB", default_value_t = yomitoku_webui::config::DEFAULT_MAX_UPLOAD_MB)]
    max_upload_mb: usize,

    /// Seconds of inactivity after which a browser session is dropped.
    #[arg(long, env = "YOMITOKU_WEBUI_SESSION_TTL", default_value_t = 3600)]
    session_ttl: u64,

    /// Debug logging.
    #[arg(short, long, env = "YOMITOKU_WEBUI_VERBOSE")]
    verbose: bool,

    /// Errors only.
    #[arg(short, long, env = "YOMITOKU_WEBUI_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Md,
    Json,
    Html,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Md => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let engine = YomitokuEngine::new(config.engine.clone());
    let url = config.browser_url();
    let open_browser = config.open_browser;

    let server = Server::bind(config, Arc::new(engine))
        .await
        .with_context(|| format!("Failed to listen on {}:{}", cli.host, cli.port))?;

    if !cli.quiet {
        eprintln!("{} {}", green("◆"), bold("YomiToku OCR web UI"));
        eprintln!("   {}  {}", dim("URL:   "), bold(&url));
        eprintln!("   {}  {}", dim("Engine:"), cli.engine);
        eprintln!("   {}", dim("Press Ctrl-C to stop."));
    }

    if open_browser {
        open_in_browser(&url);
    }

    server.run().await.context("Server failed")?;
    Ok(())
}

fn build_config(cli: &Cli) -> Result<WebUiConfig> {
    let mut builder = WebUiConfig::builder()
        .host(cli.host.clone())
        .port(cli.port)
        .open_browser(!cli.no_browser)
        .max_upload_mb(cli.max_upload_mb)
        .session_ttl_secs(cli.session_ttl)
        .default_format(cli.format.into())
        .engine_command(cli.engine.clone())
        .figure_letter(!cli.no_figure_letter);

    if let Some(ref device) = cli.device {
        builder = builder.engine_device(device.clone());
    }
    if let Some(secs) = cli.engine_timeout {
        builder = builder.engine_timeout_secs(secs);
    }
    for arg in cli.engine_args.iter().filter(|a| !a.is_empty()) {
        builder = builder.engine_arg(arg.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Best effort: a missing opener only costs a log line.
fn open_in_browser(url: &str) {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    command
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    match command.spawn() {
        Ok(_) => debug!("Opened {} in the default browser", url),
        Err(e) => warn!("Could not open a browser ({}); visit {} manually", e, url),
    }
}
