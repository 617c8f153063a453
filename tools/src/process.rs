//! Shared subprocess management utilities.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;

/// Upper bound on captured stderr per child.
const MAX_STDERR_BYTES: u64 = 64 * 1024;

/// RAII guard that kills a child process (and its process group on Unix) on drop.
///
/// Wrap a spawned `tokio::process::Child` immediately after `spawn()` to ensure
/// cleanup if the owning future is cancelled, e.g. when an HTTP caller disconnects
/// mid-search. Call `disarm()` after the process exits normally to prevent the kill.
pub struct ChildGuard {
    child: Child,
    armed: bool,
}

impl ChildGuard {
    #[must_use]
    pub fn new(child: Child) -> Self {
        Self { child, armed: true }
    }

    pub fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        #[cfg(unix)]
        {
            if let Some(pid) = self.child.id() {
                unsafe {
                    if libc::killpg(pid as i32, libc::SIGKILL) == -1 {
                        let _ = self.child.start_kill();
                    }
                }
            }
            let _ = self.child.try_wait();
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.start_kill();
            let _ = self.child.try_wait();
        }
    }
}

/// Put the child in its own session so the guard can kill the whole group.
#[cfg(unix)]
pub fn set_new_session(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    unsafe {
        cmd.as_std_mut().pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            // Linux-only: ensure the child dies if the agent dies.
            #[cfg(target_os = "linux")]
            if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL) == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to read child output: {0}")]
    Io(#[from] io::Error),
    #[error("child exceeded its deadline")]
    TimedOut,
}

/// How a line-streamed child finished.
#[derive(Debug)]
pub struct StreamedExit {
    pub status: ExitStatus,
    pub stderr: String,
}

impl StreamedExit {
    /// Exit code, if the child was not killed by a signal.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Spawn `cmd`, hand every stdout line to `on_line`, and wait for exit.
///
/// stderr is drained concurrently (bounded) so a chatty child cannot block on a
/// full pipe. If `deadline` passes first the child is killed and
/// [`ProcessError::TimedOut`] is returned. Dropping the returned future kills the
/// child as well.
pub async fn stream_lines<F>(
    mut cmd: Command,
    deadline: Instant,
    mut on_line: F,
) -> Result<StreamedExit, ProcessError>
where
    F: FnMut(&str),
{
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    set_new_session(&mut cmd);

    let child = cmd
        .spawn()
        .map_err(|source| ProcessError::Spawn { program, source })?;
    let mut guard = ChildGuard::new(child);

    let stdout = guard
        .child_mut()
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("failed to capture stdout"))?;
    let stderr = guard
        .child_mut()
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("failed to capture stderr"))?;

    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::with_capacity(1024);
        let _ = stderr.take(MAX_STDERR_BYTES).read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).into_owned()
    });

    let mut stdout_reader = BufReader::new(stdout).lines();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        // Returning drops the armed guard, which kills the whole process group.
        if remaining.is_zero() {
            return Err(ProcessError::TimedOut);
        }
        let Ok(line) = timeout(remaining, stdout_reader.next_line()).await else {
            return Err(ProcessError::TimedOut);
        };
        let Some(line) = line? else {
            break;
        };
        on_line(&line);
    }

    let remaining = deadline.saturating_duration_since(Instant::now());
    let Ok(status) = timeout(remaining, guard.child_mut().wait()).await else {
        return Err(ProcessError::TimedOut);
    };
    let status = status?;
    guard.disarm();

    // A grandchild may still hold stderr open; do not wait past the deadline for it.
    let remaining = deadline.saturating_duration_since(Instant::now());
    let stderr = match timeout(remaining, stderr_task).await {
        Ok(Ok(stderr)) => stderr,
        Ok(Err(e)) => format!("[stderr task failed: {e}]"),
        Err(_) => String::new(),
    };
    Ok(StreamedExit { status, stderr })
}
