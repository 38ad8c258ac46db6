use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time;

use crate::errors::ExecutionError;

const READ_CHUNK: usize = 8 * 1024;

/// How long output readers may keep draining after the child is gone.
/// Background processes that inherited the pipes can hold them open.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

#[cfg(unix)]
const DEFAULT_SHELL: &str = "/bin/sh";
#[cfg(windows)]
const DEFAULT_SHELL: &str = "cmd";

/// Outcome of one command run. All failures are carried as values.
#[derive(Debug)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub error: Option<ExecutionError>,
    pub timed_out: bool,
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn duration_ms(&self) -> i64 {
        self.duration.as_millis() as i64
    }

    /// True when the command exited zero before the deadline.
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.error.is_none()
    }
}

type SharedBuffer = Arc<Mutex<Vec<u8>>>;

/// Runs command text through the platform shell.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    shell: String,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl CommandRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    fn shell_command(&self, command_text: &str) -> Command {
        let mut command = Command::new(&self.shell);
        if cfg!(windows) {
            command.args(["/C", command_text]);
        } else {
            command.args(["-c", command_text]);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        command
    }

    /// Run `command_text`, killing it once `timeout` elapses.
    ///
    /// Output captured before a kill is kept in the result.
    pub async fn run(&self, command_text: &str, timeout: Duration) -> ExecutionResult {
        let start = Instant::now();
        let mut child = match self.shell_command(command_text).spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!("Failed to spawn `{}`: {}", command_text, err);
                return ExecutionResult {
                    stdout: String::new(),
                    stderr: String::new(),
                    error: Some(ExecutionError::Spawn(err)),
                    timed_out: false,
                    duration: start.elapsed(),
                };
            }
        };

        let stdout = SharedBuffer::default();
        let stderr = SharedBuffer::default();
        let readers = [
            child
                .stdout
                .take()
                .map(|pipe| spawn_output_reader(pipe, Arc::clone(&stdout))),
            child
                .stderr
                .take()
                .map(|pipe| spawn_output_reader(pipe, Arc::clone(&stderr))),
        ];

        let waited = time::timeout(timeout, child.wait()).await;
        let (error, timed_out) = match waited {
            Ok(Ok(status)) => (exit_error(status), false),
            Ok(Err(err)) => (Some(ExecutionError::Wait(err)), false),
            Err(_) => {
                warn!(
                    "Command exceeded timeout of {} seconds! Killing process.",
                    timeout.as_secs()
                );
                kill_child_process(&mut child).await;
                (None, true)
            }
        };
        let duration = start.elapsed();

        drain_readers(readers).await;

        let result = ExecutionResult {
            stdout: String::from_utf8_lossy(&stdout.lock()).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.lock()).into_owned(),
            error,
            timed_out,
            duration,
        };
        debug!(
            "Command finished in {} ms (timed out: {}, error: {:?})",
            result.duration_ms(),
            result.timed_out,
            result.error
        );
        result
    }
}

fn exit_error(status: ExitStatus) -> Option<ExecutionError> {
    if status.success() {
        return None;
    }
    Some(match status.code() {
        Some(code) => ExecutionError::ExitCode(code),
        None => ExecutionError::Signaled,
    })
}

fn spawn_output_reader<R>(mut reader: R, buffer: SharedBuffer) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(read) => buffer.lock().extend_from_slice(&chunk[..read]),
                Err(err) => {
                    warn!("Error reading command output: {}", err);
                    break;
                }
            }
        }
    })
}

async fn drain_readers(readers: [Option<JoinHandle<()>>; 2]) {
    for mut reader in readers.into_iter().flatten() {
        if time::timeout(DRAIN_GRACE, &mut reader).await.is_err() {
            debug!("Output pipe still open after command exit; abandoning reader");
            reader.abort();
        }
    }
}

async fn kill_child_process(child: &mut Child) {
    #[cfg(unix)]
    crate::unix::kill_process_group(child);
    #[cfg(windows)]
    crate::windows::kill_process_tree(child);

    if let Err(err) = child.kill().await {
        warn!("Failed to kill child process: {}", err);
    }
}
