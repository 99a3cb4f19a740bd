// crates/core/src/transcriber/runner.rs
//! Spawns the transcriber binary and supervises it to completion.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex_lite::Regex;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio_util::sync::CancellationToken;

use super::args::{build_args, TranscribeParams};

/// Keep only this much combined stdout/stderr per run. Failure detail lives
/// at the end of a transcriber log, so the tail is what survives.
const OUTPUT_CAP: usize = 64 * 1024;

/// Callback invoked for every progress percentage the child reports.
pub type ProgressFn = Box<dyn Fn(f32) + Send>;

/// How a transcriber run ended.
#[derive(Debug)]
pub struct TranscribeOutcome {
    /// Exit code, `None` when the child died from a signal.
    pub exit_code: Option<i32>,
    /// The run was stopped through the cancellation token.
    pub killed: bool,
    /// Combined stdout/stderr, capped to the trailing [`OUTPUT_CAP`] bytes.
    pub output: String,
}

impl TranscribeOutcome {
    pub fn success(&self) -> bool {
        !self.killed && self.exit_code == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum TranscriberError {
    #[error("failed to spawn transcriber {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to capture transcriber {0}")]
    Pipe(&'static str),
    #[error("transcriber io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can turn an audio file into a transcript artifact.
///
/// The production implementation is [`Transcriber`]; tests substitute
/// scripted backends.
#[async_trait]
pub trait TranscribeBackend: Send + Sync {
    /// Run a transcription to completion or until `kill` fires.
    ///
    /// `on_progress` is called with each percentage parsed from the child's
    /// stdout. The artifact is written to `result_path` by the child itself.
    async fn run(
        &self,
        audio_path: &Path,
        result_path: &Path,
        params: &TranscribeParams,
        kill: CancellationToken,
        on_progress: ProgressFn,
    ) -> Result<TranscribeOutcome, TranscriberError>;
}

/// Runs the external transcriber binary.
pub struct Transcriber {
    binary: PathBuf,
}

impl Transcriber {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl TranscribeBackend for Transcriber {
    async fn run(
        &self,
        audio_path: &Path,
        result_path: &Path,
        params: &TranscribeParams,
        kill: CancellationToken,
        on_progress: ProgressFn,
    ) -> Result<TranscribeOutcome, TranscriberError> {
        let args = build_args(audio_path, result_path, params);
        tracing::info!(
            binary = %self.binary.display(),
            audio = %audio_path.display(),
            model = %params.model,
            "transcriber: spawning"
        );

        let mut child = TokioCommand::new(&self.binary)
            .args(&args)
            // Null stdin so the child never blocks waiting for input
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!(binary = %self.binary.display(), error = %e, "transcriber: failed to spawn");
                TranscriberError::Spawn {
                    binary: self.binary.display().to_string(),
                    source: e,
                }
            })?;

        let stdout = child.stdout.take().ok_or(TranscriberError::Pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(TranscriberError::Pipe("stderr"))?;

        // Drain stderr in the background so a chatty child cannot stall on a
        // full pipe while we read stdout.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                push_capped(&mut buf, &line);
            }
            buf
        });

        let mut output = String::new();
        let mut killed = false;
        let mut lines = BufReader::new(stdout).lines();

        loop {
            tokio::select! {
                _ = kill.cancelled(), if !killed => {
                    killed = true;
                    if let Err(e) = child.start_kill() {
                        tracing::warn!(error = %e, "transcriber: kill signal failed");
                    }
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        match parse_progress_line(&line) {
                            Some(pct) => on_progress(pct),
                            None => tracing::debug!(line = %line, "transcriber: stdout"),
                        }
                        push_capped(&mut output, &line);
                    }
                    Ok(None) => break,
                    Err(e) => return Err(TranscriberError::Io(e)),
                },
            }
        }

        // Stdout is closed; reap the child so it never lingers as a zombie.
        let status = child.wait().await?;
        let stderr_text = stderr_task.await.unwrap_or_default();
        if !stderr_text.is_empty() {
            push_capped(&mut output, stderr_text.trim_end());
        }

        let exit_code = status.code();
        if killed {
            tracing::info!(exit_code = ?exit_code, "transcriber: stopped on request");
        } else if !status.success() {
            tracing::warn!(exit_code = ?exit_code, "transcriber: non-zero exit");
        }

        Ok(TranscribeOutcome {
            exit_code,
            killed,
            output,
        })
    }
}

static PROGRESS_RE: OnceLock<Regex> = OnceLock::new();

/// Parse a `Progress: 42.5%` stdout line. Returns the percentage when the
/// line matches, `None` for any other output.
pub fn parse_progress_line(line: &str) -> Option<f32> {
    let re = PROGRESS_RE.get_or_init(|| {
        Regex::new(r"^Progress:\s*([0-9]+(?:\.[0-9]+)?)%").expect("progress regex is valid")
    });
    let caps = re.captures(line.trim())?;
    caps.get(1)?.as_str().parse().ok()
}

/// Append a line, keeping the buffer within [`OUTPUT_CAP`] by trimming from
/// the front at a char boundary.
fn push_capped(buf: &mut String, line: &str) {
    buf.push_str(line);
    buf.push('\n');
    if buf.len() > OUTPUT_CAP {
        let mut cut = buf.len() - OUTPUT_CAP;
        while !buf.is_char_boundary(cut) {
            cut += 1;
        }
        buf.drain(..cut);
    }
}
