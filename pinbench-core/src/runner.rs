//! Process Runner
//!
//! Runs one external command under a hard wall-clock timeout. The child's exit
//! and the deadline race in a `tokio::select!`; whichever completes first
//! decides the outcome and the other side is torn down (timer dropped, or the
//! child killed and reaped).

use crate::command::EngineCommand;
use crate::error::RunnerError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Stand-in for stderr when a run was killed on timeout
pub const TIMEOUT_MARKER: &str = "<Timeout>";

/// Captured result of one external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// Standard output, decoded lossily as UTF-8 (empty on timeout)
    pub stdout: String,
    /// Standard error (`TIMEOUT_MARKER` on timeout)
    pub stderr: String,
    /// Whether the deadline fired before the process exited
    pub timed_out: bool,
    /// OS process id of the child
    pub pid: Option<u32>,
}

impl ExecutionOutput {
    fn timeout(pid: Option<u32>) -> Self {
        Self {
            stdout: String::new(),
            stderr: TIMEOUT_MARKER.to_string(),
            timed_out: true,
            pid,
        }
    }
}

/// Executes external commands one at a time with a timeout
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
    echo_output: bool,
}

impl ProcessRunner {
    /// Create a runner that kills children after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            echo_output: false,
        }
    }

    /// Log captured output at debug level after each run.
    pub fn with_output_echo(mut self, echo: bool) -> Self {
        self.echo_output = echo;
        self
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `command` to completion or until the timeout fires.
    pub async fn run(&self, command: &EngineCommand) -> Result<ExecutionOutput, RunnerError> {
        if command.program.is_empty() {
            return Err(RunnerError::EmptyCommand);
        }

        info!("    running cmd: {command}");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: command.program.clone(),
            source,
        })?;
        let pid = child.id();

        // Drain both pipes concurrently so a chatty child never blocks on a full buffer
        let stdout_task = child.stdout.take().map(spawn_reader);
        let stderr_task = child.stderr.take().map(spawn_reader);

        let status = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::time::sleep(self.timeout) => None,
        };

        let Some(status) = status else {
            // kill() also waits, so the child is reaped here
            if let Err(e) = child.kill().await {
                warn!("Failed to kill timed out process {pid:?}: {e}");
            }
            abort_reader(stdout_task);
            abort_reader(stderr_task);
            warn!(
                "<<< Process timeout (after {} seconds) >>>",
                self.timeout.as_secs()
            );
            return Ok(ExecutionOutput::timeout(pid));
        };

        let status = status.map_err(RunnerError::Wait)?;
        let stdout = collect_reader(stdout_task).await;
        let stderr = collect_reader(stderr_task).await;
        debug!("    process exited with {status}");

        if self.echo_output {
            debug!("> std_out:\n{stdout}");
            debug!("> std_err:\n{stderr}");
        }

        Ok(ExecutionOutput {
            stdout,
            stderr,
            timed_out: false,
            pid,
        })
    }
}

fn spawn_reader<R>(mut pipe: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!("pipe read ended early: {e}");
        }
        buf
    })
}

fn abort_reader(task: Option<JoinHandle<Vec<u8>>>) {
    if let Some(task) = task {
        task.abort();
    }
}

async fn collect_reader(task: Option<JoinHandle<Vec<u8>>>) -> String {
    match task {
        Some(task) => match task.await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("output reader task failed: {e}");
                String::new()
            }
        },
        None => String::new(),
    }
}
