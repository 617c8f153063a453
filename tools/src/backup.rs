//! Running the n8n workflow backup script.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use host_agent_types::BackupReport;
use tokio::process::Command;

use crate::BackupError;
use crate::process::{ProcessError, stream_lines};

pub const DEFAULT_BACKUP_TIMEOUT: Duration = Duration::from_secs(300);

const SUCCESS_MESSAGE: &str = "N8N workflows backed up successfully";

#[derive(Debug, Clone)]
pub struct BackupRunner {
    script_path: PathBuf,
    timeout: Duration,
}

impl BackupRunner {
    #[must_use]
    pub fn new(script_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            script_path: script_path.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// Run `bash <script>` and report its stdout. The timestamp is taken when the
    /// script starts.
    pub async fn run(&self) -> Result<BackupReport, BackupError> {
        let is_file = tokio::fs::metadata(&self.script_path)
            .await
            .is_ok_and(|meta| meta.is_file());
        if !is_file {
            tracing::error!(script = %self.script_path.display(), "Backup script does not exist");
            return Err(BackupError::ScriptNotFound {
                path: self.script_path.clone(),
            });
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        tracing::info!(script = %self.script_path.display(), "Running backup script");

        let mut cmd = Command::new("bash");
        cmd.arg(&self.script_path);

        let mut stdout = Vec::new();
        let deadline = Instant::now() + self.timeout;
        let exit = stream_lines(cmd, deadline, |line| stdout.push(line.to_string()))
            .await
            .map_err(|err| match err {
                ProcessError::Spawn { source, .. } => BackupError::Spawn(source),
                ProcessError::Io(err) => BackupError::Io(err),
                ProcessError::TimedOut => BackupError::TimedOut {
                    after: self.timeout,
                },
            });
        let exit = match exit {
            Ok(exit) => exit,
            Err(err) => {
                tracing::error!(error = %err, "Backup script did not complete");
                return Err(err);
            }
        };
        let output = stdout.join("\n").trim().to_string();

        if exit.code() != Some(0) {
            let err = BackupError::Failed {
                code: exit.code(),
                stdout: output,
                stderr: exit.stderr,
            };
            tracing::error!(error = %err, "Backup script failed");
            return Err(err);
        }

        tracing::info!(output = %output, "Backup completed successfully");
        Ok(BackupReport {
            status: "success".to_string(),
            timestamp,
            message: SUCCESS_MESSAGE.to_string(),
            output,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn successful_script_reports_trimmed_output() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("backup.sh");
        fs::write(&script, "echo '  exported 3 workflows  '\n").unwrap();

        let report = BackupRunner::new(&script, Duration::from_secs(10))
            .run()
            .await
            .unwrap();
        assert_eq!(report.status, "success");
        assert_eq!(report.message, SUCCESS_MESSAGE);
        assert_eq!(report.output, "exported 3 workflows");
        assert_eq!(report.timestamp.len(), "2024-01-01 00:00:00".len());
    }

    #[tokio::test]
    async fn blank_lines_inside_output_are_kept() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("backup.sh");
        fs::write(&script, "echo\necho first\necho\necho second\necho\n").unwrap();

        let report = BackupRunner::new(&script, Duration::from_secs(10))
            .run()
            .await
            .unwrap();
        assert_eq!(report.output, "first\n\nsecond");
    }

    #[tokio::test]
    async fn failing_script_carries_code_and_streams() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("backup.sh");
        fs::write(&script, "echo started\necho 'no space' >&2\nexit 4\n").unwrap();

        let err = BackupRunner::new(&script, Duration::from_secs(10))
            .run()
            .await
            .unwrap_err();
        match err {
            BackupError::Failed {
                code,
                stdout,
                stderr,
            } => {
                assert_eq!(code, Some(4));
                assert_eq!(stdout, "started");
                assert_eq!(stderr.trim(), "no space");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_script_is_reported() {
        let dir = tempdir().unwrap();
        let err = BackupRunner::new(dir.path().join("nope.sh"), DEFAULT_BACKUP_TIMEOUT)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::ScriptNotFound { .. }));
    }

    #[tokio::test]
    async fn slow_script_times_out() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("backup.sh");
        fs::write(&script, "sleep 30\n").unwrap();

        let err = BackupRunner::new(&script, Duration::from_millis(200))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::TimedOut { .. }));
    }
}
