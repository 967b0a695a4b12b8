//! tns child process management
//!
//! Commands are run through the platform shell so the command line built
//! by [`CommandBuilder`](super::CommandBuilder) is used verbatim. Output is
//! read line by line and published, together with the final exit status,
//! on a single ordered event channel.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, watch};

use crate::common::{Error, Result};

/// Something the child process did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// A stdout line, without its line terminator
    Stdout(String),
    /// A stderr line, without its line terminator
    Stderr(String),
    /// The process exited and both streams were drained; always the last event
    Exited(Option<i32>),
}

/// Handle to a running tns process
///
/// Dropping the handle kills the process.
pub struct TnsProcess {
    pid: Option<u32>,
    command: String,
    events: Option<mpsc::UnboundedReceiver<ProcessEvent>>,
    exit: watch::Receiver<Option<Option<i32>>>,
    kill_tx: Option<oneshot::Sender<()>>,
}

/// Spawns tns commands bound to a project directory
pub struct ProcessRunner;

impl ProcessRunner {
    /// Start `command` with `cwd` as working directory
    pub fn spawn(command: &str, cwd: &Path) -> Result<TnsProcess> {
        tracing::debug!(%command, cwd = %cwd.display(), "Spawning tns process");

        let mut child = shell_command(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ProcessStartFailed(format!("{}: {}", command, e)))?;

        let pid = child.id();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::ProcessStartFailed("Failed to get tns stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::ProcessStartFailed("Failed to get tns stderr".to_string()))?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = watch::channel(None);
        let (kill_tx, kill_rx) = oneshot::channel();

        let stdout_task = tokio::spawn(pump_lines(stdout, event_tx.clone(), ProcessEvent::Stdout));
        let stderr_task = tokio::spawn(pump_lines(stderr, event_tx.clone(), ProcessEvent::Stderr));

        tokio::spawn(async move {
            let code = supervise(child, kill_rx).await;

            // Exit is reported only after every line has been published
            let _ = stdout_task.await;
            let _ = stderr_task.await;

            tracing::debug!(?pid, ?code, "tns process exited");
            let _ = event_tx.send(ProcessEvent::Exited(code));
            let _ = exit_tx.send(Some(code));
        });

        Ok(TnsProcess {
            pid,
            command: command.to_string(),
            events: Some(event_rx),
            exit: exit_rx,
            kill_tx: Some(kill_tx),
        })
    }
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

async fn pump_lines<R>(
    stream: R,
    tx: mpsc::UnboundedSender<ProcessEvent>,
    wrap: fn(String) -> ProcessEvent,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                // Keep draining after the receiver is gone so the child never blocks on a full pipe
                let _ = tx.send(wrap(decode_line(&buf)));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read tns output");
                break;
            }
        }
    }
}

/// Strip the line terminator; bytes that are not UTF-8 become U+FFFD
fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

async fn supervise(mut child: Child, kill_rx: oneshot::Receiver<()>) -> Option<i32> {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = kill_rx => {
            tracing::debug!(pid = ?child.id(), "Killing tns process");
            let _ = child.start_kill();
            child.wait().await
        }
    };

    match status {
        Ok(status) => status.code(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to wait for tns process");
            None
        }
    }
}

impl TnsProcess {
    /// OS process id, if the process was still alive when spawned
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Command line this process was started with
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Take the event receiver (can only be called once)
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ProcessEvent>> {
        self.events.take()
    }

    /// Whether the process has exited and its output has been drained
    pub fn has_exited(&self) -> bool {
        self.exit.borrow().is_some()
    }

    /// Wait for the process to exit and return its exit code
    pub async fn wait(&mut self) -> Option<i32> {
        match self.exit.wait_for(|state| state.is_some()).await {
            Ok(state) => {
                let code = *state;
                code.flatten()
            }
            Err(_) => None,
        }
    }

    /// Ask the process to terminate
    ///
    /// The `Exited` event still arrives afterwards.
    pub fn kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl std::fmt::Debug for TnsProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TnsProcess")
            .field("pid", &self.pid)
            .field("command", &self.command)
            .field("exited", &self.has_exited())
            .finish()
    }
}

/// Run a command to completion and return its stdout
///
/// Fails when the process cannot start or exits unsuccessfully.
pub async fn run_to_completion(command: &str) -> Result<String> {
    let output = shell_command(command)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| Error::ProcessStartFailed(format!("{}: {}", command, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Internal(format!(
            "'{}' failed: {}",
            command,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
