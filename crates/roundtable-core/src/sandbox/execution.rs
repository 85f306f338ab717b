//! Code execution inside a working directory, bounded by a timeout.

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sha2::Digest as _;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

use super::code_block::{CodeBlock, ScriptLanguage};
use super::error::{SandboxError, SandboxResult};
use super::workdir::WorkDir;

/// Configuration for sandboxed code execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfig {
    /// Maximum wall-clock time for one code block (seconds).
    pub timeout_secs: u64,
    /// Captured stdout/stderr beyond this many bytes is cut off.
    pub max_output_bytes: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_output_bytes: 64 * 1024,
        }
    }
}

/// How a code block's process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExecutionStatus {
    Exited { code: i32 },
    /// The timeout fired and the process was killed; output is not available.
    TimedOut { limit_secs: u64 },
    /// Terminated by a signal.
    Killed,
}

/// The result of running one code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// File the code was saved to, relative to the working directory.
    pub filename: String,
    pub language: ScriptLanguage,
    pub stdout: String,
    pub stderr: String,
    pub status: ExecutionStatus,
    pub duration_ms: u64,
    /// Whether stdout or stderr was cut at `max_output_bytes`.
    pub truncated: bool,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, ExecutionStatus::Exited { code: 0 })
    }

    /// Numeric exit status; `-1` when the process did not exit normally.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            ExecutionStatus::Exited { code } => code,
            _ => -1,
        }
    }
}

/// Runs code blocks in a [`WorkDir`].
#[derive(Debug, Clone)]
pub struct CodeExecutor {
    workdir: WorkDir,
    config: ExecutionConfig,
}

impl CodeExecutor {
    pub fn new(workdir: WorkDir, config: ExecutionConfig) -> SandboxResult<Self> {
        if config.timeout_secs == 0 {
            return Err(SandboxError::InvalidConfig(
                "timeout_secs must be positive".into(),
            ));
        }
        Ok(Self { workdir, config })
    }

    pub fn workdir(&self) -> &WorkDir {
        &self.workdir
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Save `block` into the working directory and run it.
    ///
    /// A block without a filename hint is saved as `tmp_code_<digest>.<ext>`.
    /// The process runs with the working directory as its cwd; on timeout it
    /// is killed and a [`ExecutionStatus::TimedOut`] outcome is returned.
    pub async fn execute(&self, block: &CodeBlock) -> SandboxResult<ExecutionOutcome> {
        let language = ScriptLanguage::for_block(block)?;
        let filename = match &block.filename {
            Some(name) => name.clone(),
            None => {
                let digest = hex::encode(sha2::Sha256::digest(block.code.as_bytes()));
                format!("tmp_code_{}.{}", &digest[..16], language.extension())
            }
        };
        let path = self.workdir.write_file(&filename, &block.code).await?;

        let program = language.interpreter();
        let start = Instant::now();
        let mut child = Command::new(program)
            .arg(&path)
            .current_dir(self.workdir.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SandboxError::Spawn {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let cap = self.config.max_output_bytes.saturating_add(1);
        let stdout = Capture::spawn(child.stdout.take(), cap);
        let stderr = Capture::spawn(child.stderr.take(), cap);

        let limit = Duration::from_secs(self.config.timeout_secs);
        let exit = match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => Some(status?),
            Err(_elapsed) => {
                debug!(file = %filename, limit_secs = self.config.timeout_secs, "code execution timed out");
                child.kill().await?;
                None
            }
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let (stdout, cut_out) = truncate_output(
            &String::from_utf8_lossy(&stdout.finish().await),
            self.config.max_output_bytes,
        );
        let (stderr, cut_err) = truncate_output(
            &String::from_utf8_lossy(&stderr.finish().await),
            self.config.max_output_bytes,
        );

        let Some(exit) = exit else {
            // Whatever was printed before the kill is kept.
            return Ok(ExecutionOutcome {
                filename,
                language,
                stdout,
                stderr,
                status: ExecutionStatus::TimedOut {
                    limit_secs: self.config.timeout_secs,
                },
                duration_ms,
                truncated: true,
            });
        };
        let status = match exit.code() {
            Some(code) => ExecutionStatus::Exited { code },
            None => ExecutionStatus::Killed,
        };

        Ok(ExecutionOutcome {
            filename,
            language,
            stdout,
            stderr,
            status,
            duration_ms,
            truncated: cut_out || cut_err,
        })
    }
}

/// How long to keep draining a pipe once the process is gone. Grandchildren
/// that inherited the pipe can hold it open past the kill.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Background reader for one child pipe, keeping at most `cap` bytes.
struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl Capture {
    fn spawn<R>(pipe: Option<R>, cap: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let task = tokio::spawn(async move {
            let Some(mut pipe) = pipe else { return };
            let mut chunk = [0u8; 4096];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let mut buf = sink.lock().unwrap_or_else(|e| e.into_inner());
                        let room = cap.saturating_sub(buf.len());
                        buf.extend_from_slice(&chunk[..n.min(room)]);
                    }
                }
            }
        });
        Self { buf, task }
    }

    async fn finish(self) -> Vec<u8> {
        let mut task = self.task;
        if tokio::time::timeout(DRAIN_GRACE, &mut task).await.is_err() {
            task.abort();
        }
        let mut buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *buf)
    }
}

/// Marker appended to output cut at the byte limit.
pub const TRUNCATION_MARKER: &str = "\n[output truncated]";

/// Cut `text` to at most `max_bytes` (on a char boundary).
///
/// Returns the possibly shortened text and whether anything was removed.
pub fn truncate_output(text: &str, max_bytes: usize) -> (String, bool) {
    if text.len() <= max_bytes {
        return (text.to_string(), false);
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = text[..end].to_string();
    out.push_str(TRUNCATION_MARKER);
    (out, true)
}
