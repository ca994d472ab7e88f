//! [`OcrEngine`] backed by the `yomitoku` command line tool.
//!
//! ## Why a temp directory?
//!
//! yomitoku reads its input from a path and writes results into an output
//! directory. Each invocation gets its own [`TempDir`] holding both, so
//! concurrent sessions never see each other's files and everything is
//! removed when the directory is dropped, whether the run succeeded or not.
//!
//! The engine is always asked for JSON: every display format is rendered
//! locally from the structured result, so switching formats never reruns OCR.

use super::schema::{page_number_from_path, parse_page};
use super::OcrEngine;
use crate::config::EngineConfig;
use crate::error::WebUiError;
use crate::pipeline::input::InputDocument;
use crate::progress::{RecognitionProgress, STAGE_COMPLETE, STAGE_PROCESSING, STAGE_RUNNING};
use crate::result::RecognitionResult;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Longest stderr excerpt kept in an error message.
const STDERR_EXCERPT: usize = 2000;

/// Runs `yomitoku <input> -f json -o <dir>` once per recognition.
#[derive(Debug, Clone)]
pub struct YomitokuEngine {
    config: EngineConfig,
}

impl YomitokuEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full argument list for one run.
    pub fn build_args(&self, input: &Path, output_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            input.as_os_str().to_owned(),
            "-f".into(),
            "json".into(),
            "-o".into(),
            output_dir.as_os_str().to_owned(),
        ];
        if self.config.figure_letter {
            args.push("--figure_letter".into());
        }
        if let Some(ref device) = self.config.device {
            args.push("-d".into());
            args.push(device.into());
        }
        args.extend(self.config.extra_args.iter().map(OsString::from));
        args
    }

    async fn run_process(&self, args: Vec<OsString>) -> Result<(), WebUiError> {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| WebUiError::EngineNotFound {
            command: self.config.command.clone(),
            detail: e.to_string(),
        })?;

        let wait = child.wait_with_output();
        let output = match self.config.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), wait)
                .await
                .map_err(|_| WebUiError::EngineTimeout { secs })?,
            None => wait.await,
        }
        .map_err(|e| WebUiError::Internal(format!("waiting for OCR engine: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let status = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "terminated by signal".to_string());
            return Err(WebUiError::EngineFailed {
                status,
                stderr: stderr_excerpt(&stderr),
            });
        }

        debug!(
            "OCR engine stdout: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }
}

impl Default for YomitokuEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[async_trait]
impl OcrEngine for YomitokuEngine {
    fn name(&self) -> &str {
        "yomitoku"
    }

    async fn recognize(
        &self,
        input: &InputDocument,
        progress: &dyn RecognitionProgress,
    ) -> Result<RecognitionResult, WebUiError> {
        let start = Instant::now();
        let work = TempDir::new().map_err(|e| WebUiError::io(std::env::temp_dir(), e))?;
        let input_path = work
            .path()
            .join(format!("input.{}", input.format().extension()));
        let output_dir = work.path().join("output");

        tokio::fs::write(&input_path, input.bytes())
            .await
            .map_err(|e| WebUiError::io(&input_path, e))?;
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| WebUiError::io(&output_dir, e))?;

        let args = self.build_args(&input_path, &output_dir);
        info!(
            "Running {} on '{}' ({} bytes)",
            self.config.command,
            input.name(),
            input.len()
        );
        progress.on_stage(STAGE_RUNNING.0, STAGE_RUNNING.1);

        self.run_process(args).await.inspect_err(|e| {
            warn!("OCR engine failed on '{}': {}", input.name(), e);
        })?;

        progress.on_stage(STAGE_PROCESSING.0, STAGE_PROCESSING.1);
        let result = read_output(self.name(), &output_dir).await?;

        progress.on_stage(STAGE_COMPLETE.0, STAGE_COMPLETE.1);
        info!(
            "Recognised '{}': {} pages, {} blocks, {} tables in {}ms",
            input.name(),
            result.pages.len(),
            result.block_count(),
            result.table_count(),
            start.elapsed().as_millis()
        );
        Ok(result)
    }
}

/// Collect and parse every `*.json` file the engine wrote.
pub async fn read_output(engine: &str, dir: &Path) -> Result<RecognitionResult, WebUiError> {
    let mut files = json_files(dir).await?;
    if files.is_empty() {
        return Err(WebUiError::NoOutput {
            dir: dir.to_path_buf(),
        });
    }
    files.sort_by(|a, b| {
        page_number_from_path(a)
            .cmp(&page_number_from_path(b))
            .then_with(|| a.cmp(b))
    });

    let mut pages = Vec::with_capacity(files.len());
    for (i, path) in files.iter().enumerate() {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| WebUiError::io(path, e))?;
        let number = page_number_from_path(path).unwrap_or(i + 1);
        let page = parse_page(&json, number).map_err(|e| WebUiError::MalformedOutput {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        pages.push(page);
    }

    Ok(RecognitionResult {
        engine: engine.to_string(),
        pages,
    })
}

async fn json_files(dir: &Path) -> Result<Vec<PathBuf>, WebUiError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| WebUiError::io(dir, e))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| WebUiError::io(dir, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }
    Ok(files)
}

fn stderr_excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return "Unknown error occurred".to_string();
    }
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= STDERR_EXCERPT {
        trimmed.to_string()
    } else {
        // Tracebacks put the actual error last.
        let tail: String = chars[chars.len() - STDERR_EXCERPT..].iter().collect();
        format!("\u{2026}{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgress;

    fn png_input() -> InputDocument {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&[0u8; 8]);
        InputDocument::from_upload("scan.png", bytes, usize::MAX).unwrap()
    }

    #[test]
    fn args_include_json_format_and_flags() {
        let engine = YomitokuEngine::new(EngineConfig {
            device: Some("cpu".into()),
            extra_args: vec!["--lite".into()],
            ..EngineConfig::default()
        });
        let args = engine.build_args(Path::new("/w/input.png"), Path::new("/w/output"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "/w/input.png",
                "-f",
                "json",
                "-o",
                "/w/output",
                "--figure_letter",
                "-d",
                "cpu",
                "--lite"
            ]
        );
    }

    #[test]
    fn args_without_figure_letter() {
        let engine = YomitokuEngine::new(EngineConfig {
            figure_letter: false,
            ..EngineConfig::default()
        });
        let args = engine.build_args(Path::new("in.png"), Path::new("out"));
        assert!(!args.iter().any(|a| a == "--figure_letter"));
    }

    #[test]
    fn stderr_excerpt_keeps_tail() {
        assert_eq!(stderr_excerpt("  \n"), "Unknown error occurred");
        let long = format!("{}END", "x".repeat(STDERR_EXCERPT * 2));
        let excerpt = stderr_excerpt(&long);
        assert!(excerpt.ends_with("END"));
        assert!(excerpt.starts_with('\u{2026}'));
    }

    #[tokio::test]
    async fn missing_binary_is_engine_not_found() {
        let engine = YomitokuEngine::new(EngineConfig {
            command: "definitely-not-a-real-ocr-binary".into(),
            ..EngineConfig::default()
        });
        let err = engine.recognize(&png_input(), &NoopProgress).await.unwrap_err();
        assert!(matches!(err, WebUiError::EngineNotFound { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn read_output_orders_pages() {
        let dir = tempfile::tempdir().unwrap();
        let page = |text: &str| {
            format!(r#"{{"paragraphs": [{{"box": [0,0,10,10], "contents": "{text}", "order": 0}}]}}"#)
        };
        std::fs::write(dir.path().join("doc_p2.json"), page("second")).unwrap();
        std::fs::write(dir.path().join("doc_p10.json"), page("tenth")).unwrap();
        std::fs::write(dir.path().join("doc_p1.json"), page("first")).unwrap();
        std::fs::write(dir.path().join("doc_p1.png"), b"not json").unwrap();

        let result = read_output("yomitoku", dir.path()).await.unwrap();
        let numbers: Vec<usize> = result.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
        assert_eq!(result.pages[0].blocks[0].text, "first");
        assert_eq!(result.engine, "yomitoku");
    }

    #[tokio::test]
    async fn read_output_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_output("yomitoku", dir.path()).await.unwrap_err();
        assert!(matches!(err, WebUiError::NoOutput { .. }));
    }

    #[tokio::test]
    async fn read_output_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc_p1.json"), "{ truncated").unwrap();
        let err = read_output("yomitoku", dir.path()).await.unwrap_err();
        assert!(matches!(err, WebUiError::MalformedOutput { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_process_reports_stderr() {
        // `sh -c` ignores the trailing yomitoku arguments as positional params.
        let engine = YomitokuEngine::new(EngineConfig {
            command: "sh".into(),
            figure_letter: false,
            ..EngineConfig::default()
        });
        let err = engine
            .run_process(vec![
                "-c".into(),
                "echo 'model load failed' >&2; exit 3".into(),
            ])
            .await
            .unwrap_err();
        match err {
            WebUiError::EngineFailed { status, stderr } => {
                assert_eq!(status, "3");
                assert!(stderr.contains("model load failed"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_process_times_out() {
        let engine = YomitokuEngine::new(EngineConfig {
            command: "sh".into(),
            timeout_secs: Some(1),
            ..EngineConfig::default()
        });
        let err = engine
            .run_process(vec!["-c".into(), "sleep 5".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, WebUiError::EngineTimeout { secs: 1 }));
    }
}
