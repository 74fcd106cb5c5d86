//! Host process execution.

use async_trait::async_trait;
use flightsquad_core::{CommandOutput, CommandRunner, CommandSpec, Result, SquadError};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

/// How long pipe readers may keep draining after a child is stopped at its
/// deadline. Grandchildren that inherited the pipes can hold them open.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

type Captured = Arc<Mutex<Vec<u8>>>;

/// Runs commands as child processes of the current host.
///
/// Output is captured in full. A timed-out child is killed when its future
/// is dropped. With `run_for_secs` set, the child is killed at the end of
/// the window and whatever it printed so far is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let start = Instant::now();

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.work_dir {
            command.current_dir(dir);
        }

        debug!(label = %spec.label, command = %spec.display(), "spawning command");

        let mut child = command.spawn().map_err(|e| SquadError::CommandFailed {
            label: spec.label.clone(),
            reason: e.to_string(),
        })?;

        let (stdout_buf, stdout_task) = capture(child.stdout.take());
        let (stderr_buf, stderr_task) = capture(child.stderr.take());

        let mut deadline_reached = false;
        let status = if spec.run_for_secs > 0 {
            let window = Duration::from_secs(spec.run_for_secs);
            match tokio::time::timeout(window, child.wait()).await {
                Ok(status) => Some(status?),
                Err(_) => {
                    debug!(
                        label = %spec.label,
                        run_for_secs = spec.run_for_secs,
                        "run window ended, stopping command"
                    );
                    deadline_reached = true;
                    child.kill().await?;
                    None
                }
            }
        } else if spec.timeout_secs > 0 {
            let limit = Duration::from_secs(spec.timeout_secs);
            match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => Some(status?),
                Err(_) => {
                    abort(stdout_task);
                    abort(stderr_task);
                    return Err(SquadError::Timeout {
                        label: spec.label.clone(),
                        timeout_secs: spec.timeout_secs,
                    });
                }
            }
        } else {
            Some(child.wait().await?)
        };

        let stdout = drain(stdout_buf, stdout_task, deadline_reached).await;
        let stderr = drain(stderr_buf, stderr_task, deadline_reached).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = status.and_then(|s| s.code()).unwrap_or(-1);

        debug!(
            label = %spec.label,
            exit_code,
            duration_ms,
            deadline_reached,
            "command finished"
        );

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
            duration_ms,
            deadline_reached,
        })
    }
}

/// Copy a child pipe into a shared buffer on a background task.
fn capture<R>(pipe: Option<R>) -> (Captured, Option<JoinHandle<()>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buf = Captured::default();
    let task = pipe.map(|mut pipe| {
        let sink = Arc::clone(&buf);
        tokio::spawn(async move {
            let mut chunk = [0u8; 4096];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => sink
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .extend_from_slice(&chunk[..n]),
                }
            }
        })
    });
    (buf, task)
}

/// Wait for a reader to hit EOF and take what it collected.
///
/// After a deadline stop the wait is bounded by [`DRAIN_GRACE`].
async fn drain(buf: Captured, task: Option<JoinHandle<()>>, bounded: bool) -> String {
    if let Some(mut task) = task {
        if bounded {
            if tokio::time::timeout(DRAIN_GRACE, &mut task).await.is_err() {
                task.abort();
            }
        } else if let Err(e) = task.await {
            debug!(error = %e, "output reader ended abnormally");
        }
    }
    let bytes = std::mem::take(&mut *buf.lock().unwrap_or_else(|e| e.into_inner()));
    String::from_utf8_lossy(&bytes).into_owned()
}

fn abort(task: Option<JoinHandle<()>>) {
    if let Some(task) = task {
        task.abort();
    }
}
