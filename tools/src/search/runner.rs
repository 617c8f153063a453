use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::process::Command;

use crate::SearchError;
use crate::process::{ProcessError, stream_lines};

pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Launches ripgrep with the JSON printer and streams its events.
#[derive(Debug, Clone)]
pub struct RipgrepRunner {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for RipgrepRunner {
    fn default() -> Self {
        Self::new("rg", DEFAULT_SEARCH_TIMEOUT)
    }
}

impl RipgrepRunner {
    /// `binary` is a program name looked up on `PATH`, or a path to an executable.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Command line for one search. `--no-config` keeps a user's `RIPGREPRC`
    /// from changing the output format.
    #[must_use]
    pub fn args(query: &str, root: &Path, max_results: u32, context_lines: u32) -> Vec<String> {
        vec![
            "--no-config".to_string(),
            "--json".to_string(),
            "--line-number".to_string(),
            "--color".to_string(),
            "never".to_string(),
            "--max-count".to_string(),
            max_results.to_string(),
            "--context".to_string(),
            context_lines.to_string(),
            "--".to_string(),
            query.to_string(),
            root.to_string_lossy().into_owned(),
        ]
    }

    /// Run one search, handing every stdout line to `on_line`.
    ///
    /// Exit code 0 (matches) and 1 (no matches) are success. Anything else,
    /// including death by signal, is [`SearchError::ToolFailed`] with the captured
    /// stderr.
    pub async fn run<F>(
        &self,
        query: &str,
        root: &Path,
        max_results: u32,
        context_lines: u32,
        on_line: F,
    ) -> Result<(), SearchError>
    where
        F: FnMut(&str),
    {
        let resolved = which::which(&self.binary).map_err(|_| SearchError::ToolUnavailable {
            binary: self.binary.display().to_string(),
        })?;

        let mut cmd = Command::new(&resolved);
        cmd.args(Self::args(query, root, max_results, context_lines));

        let deadline = Instant::now() + self.timeout;
        let exit = stream_lines(cmd, deadline, on_line)
            .await
            .map_err(|err| match err {
                ProcessError::Spawn { program, source } => SearchError::Spawn { program, source },
                ProcessError::Io(err) => SearchError::Io(err),
                ProcessError::TimedOut => SearchError::TimedOut {
                    after: self.timeout,
                },
            })?;

        match exit.code() {
            Some(0 | 1) => Ok(()),
            code => {
                tracing::error!(?code, stderr = %exit.stderr.trim(), "ripgrep failed");
                Err(SearchError::ToolFailed {
                    code,
                    stderr: exit.stderr,
                })
            }
        }
    }
}
