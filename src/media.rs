use crate::config::ToolConfig;
use crate::error::{ChapterError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Captured output of one tool invocation
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Both streams, stdout first. Filters such as `metadata=print:file=-`
    /// write to stdout while silencedetect logs to stderr.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        text.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }
}

/// Runs ffmpeg and ffprobe as bounded child processes
#[derive(Debug, Clone)]
pub struct ToolRunner {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    timeout: Option<Duration>,
}

impl ToolRunner {
    pub fn new(config: &ToolConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
            timeout: (config.timeout_seconds > 0)
                .then(|| Duration::from_secs(config.timeout_seconds)),
        }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe
    }

    /// Verify that both tools can be executed
    pub async fn ensure_available(&self) -> Result<()> {
        Self::check_tool(&self.ffmpeg).await?;
        Self::check_tool(&self.ffprobe).await?;
        info!("🔧 Media tools available: {}, {}", self.ffmpeg.display(), self.ffprobe.display());
        Ok(())
    }

    async fn check_tool(program: &Path) -> Result<()> {
        let tool = program.display().to_string();
        let status = Command::new(program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| ChapterError::ToolMissing {
                tool: tool.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(ChapterError::ToolMissing {
                tool,
                reason: format!("`-version` exited with {}", status),
            });
        }

        Ok(())
    }

    pub async fn run_ffmpeg<I, S>(&self, args: I) -> Result<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.run(&self.ffmpeg, args).await
    }

    pub async fn run_ffprobe<I, S>(&self, args: I) -> Result<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.run(&self.ffprobe, args).await
    }

    async fn run<I, S>(&self, program: &Path, args: I) -> Result<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let tool = program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| program.display().to_string());

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running {:?}", cmd.as_std());

        // The child is killed when this future is dropped, either by the
        // timeout below or by the caller cancelling the run.
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, cmd.output()).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(ChapterError::Timeout {
                        tool,
                        seconds: limit.as_secs(),
                    })
                }
            },
            None => cmd.output().await,
        }
        .map_err(|e| ChapterError::ToolFailed {
            tool: tool.clone(),
            message: e.to_string(),
        })?;

        let captured = ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            return Err(ChapterError::ToolFailed {
                tool,
                message: format!("{}: {}", output.status, stderr_tail(&captured.stderr)),
            });
        }

        Ok(captured)
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new(&ToolConfig::default())
    }
}

/// Last non-empty stderr line, which is where ffmpeg reports the failure
fn stderr_tail(stderr: &str) -> &str {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no error output")
}
