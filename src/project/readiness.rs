//! Readiness detection over tns output
//!
//! A launch is ready once a stdout line matches the platform's marker.
//! Until then every line is forwarded to the output channel and tested;
//! afterwards a relay task keeps forwarding without testing, so a later
//! line that happens to match can never resolve the operation twice.

use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::common::{Error, Result};
use crate::tns::{OutputChannel, ProcessEvent, ProcessRunner, TnsProcess};

/// Line printed by the Android runtime once its inspector is listening
pub const ANDROID_DEBUGGER_STARTED: &str = "# NativeScript Debugger started #";

static SOCKET_LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"socket-file-location: (.*\.sock)").expect("must compile"));

static DEBUG_PORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"debug port: (\d{5})\b").expect("must compile"));

/// Extract the inspector socket path announced by `tns debug ios`
pub fn parse_socket_location(line: &str) -> Option<PathBuf> {
    SOCKET_LOCATION_RE
        .captures(line)
        .map(|caps| PathBuf::from(caps[1].trim()))
}

/// Whether a line is the Android debugger started marker
pub fn is_android_debugger_started(line: &str) -> bool {
    line.contains(ANDROID_DEBUGGER_STARTED)
}

/// Extract the forwarded port printed by `tns debug android --get-port`
///
/// Five digits that do not fit a port number are not a match.
pub fn parse_debug_port(line: &str) -> Option<u16> {
    DEBUG_PORT_RE
        .captures(line)
        .and_then(|caps| caps[1].parse().ok())
}

/// Consume process events until `matcher` accepts a stdout line
///
/// Stderr lines are forwarded as errors and never decide the outcome.
/// Exiting first fails with the exit code.
pub async fn wait_until_ready<T, F>(
    events: &mut mpsc::UnboundedReceiver<ProcessEvent>,
    output: &OutputChannel,
    mut matcher: F,
) -> Result<T>
where
    F: FnMut(&str) -> Option<T>,
{
    while let Some(event) = events.recv().await {
        match event {
            ProcessEvent::Stdout(line) => {
                let found = matcher(&line);
                tracing::trace!(%line, "tns stdout");
                output.log(line);
                if let Some(found) = found {
                    return Ok(found);
                }
            }
            ProcessEvent::Stderr(line) => {
                tracing::trace!(%line, "tns stderr");
                output.error(line);
            }
            ProcessEvent::Exited(code) => {
                tracing::debug!(?code, "tns exited before the readiness marker");
                return Err(Error::ProcessExitedBeforeReady(code));
            }
        }
    }

    Err(Error::ProcessExitedBeforeReady(None))
}

/// Forward the remaining events until the process exits
pub fn relay(
    mut events: mpsc::UnboundedReceiver<ProcessEvent>,
    output: OutputChannel,
) -> JoinHandle<Option<i32>> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ProcessEvent::Stdout(line) => {
                    tracing::trace!(%line, "tns stdout");
                    output.log(line);
                }
                ProcessEvent::Stderr(line) => {
                    tracing::trace!(%line, "tns stderr");
                    output.error(line);
                }
                ProcessEvent::Exited(code) => {
                    tracing::debug!(?code, "tns exited");
                    return code;
                }
            }
        }
        None
    })
}

/// Spawn `command` and wait, at most `timeout`, for its readiness marker
///
/// On success the process is returned alive with a relay task attached.
/// On timeout the process is killed; its remaining output is still
/// forwarded so the user can see why it hung.
pub async fn launch_until_ready<T, F>(
    command: &str,
    cwd: &Path,
    output: &OutputChannel,
    timeout: Duration,
    matcher: F,
) -> Result<(TnsProcess, T)>
where
    F: FnMut(&str) -> Option<T>,
{
    let mut process = ProcessRunner::spawn(command, cwd)?;
    let mut events = process
        .take_events()
        .ok_or_else(|| Error::Internal("tns process events already taken".to_string()))?;

    match tokio::time::timeout(timeout, wait_until_ready(&mut events, output, matcher)).await {
        Ok(Ok(found)) => {
            relay(events, output.clone());
            Ok((process, found))
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            tracing::warn!(%command, timeout_secs = timeout.as_secs(), "tns never became ready");
            process.kill();
            relay(events, output.clone());
            Err(Error::ReadyTimeout(timeout.as_secs()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tns::OutputEvent;

    fn simulated() -> (
        mpsc::UnboundedSender<ProcessEvent>,
        mpsc::UnboundedReceiver<ProcessEvent>,
    ) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_parse_socket_location() {
        assert_eq!(
            parse_socket_location("... socket-file-location: /tmp/x.sock ..."),
            Some(PathBuf::from("/tmp/x.sock"))
        );
        assert_eq!(parse_socket_location("socket-file-location: /tmp/x"), None);
        assert_eq!(parse_socket_location("Project successfully built"), None);
    }

    #[test]
    fn test_parse_debug_port() {
        assert_eq!(parse_debug_port("debug port: 40001"), Some(40001));
        assert_eq!(parse_debug_port("device emulator-5554 debug port: 41000 ok"), Some(41000));
        assert_eq!(parse_debug_port("debug port: 99999"), None);
        assert_eq!(parse_debug_port("debug port: 123456"), None);
        assert_eq!(parse_debug_port("listening on 40001"), None);
    }

    #[test]
    fn test_android_marker() {
        assert!(is_android_debugger_started(
            "JS: # NativeScript Debugger started #"
        ));
        assert!(!is_android_debugger_started("NativeScript Debugger"));
    }

    #[tokio::test]
    async fn test_ios_socket_resolves() {
        let (tx, mut rx) = simulated();
        let output = OutputChannel::new(16);
        let mut sub = output.subscribe();

        tx.send(ProcessEvent::Stdout("Building project...".into())).unwrap();
        tx.send(ProcessEvent::Stderr("warning: no provisioning".into())).unwrap();
        tx.send(ProcessEvent::Stdout("... socket-file-location: /tmp/x.sock ...".into()))
            .unwrap();

        let path = wait_until_ready(&mut rx, &output, parse_socket_location)
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/x.sock"));

        assert_eq!(sub.recv().await.unwrap(), OutputEvent::Log("Building project...".into()));
        assert_eq!(
            sub.recv().await.unwrap(),
            OutputEvent::Error("warning: no provisioning".into())
        );
        assert_eq!(
            sub.recv().await.unwrap().text(),
            "... socket-file-location: /tmp/x.sock ..."
        );
    }

    #[tokio::test]
    async fn test_exit_before_ready_rejects_with_code() {
        let (tx, mut rx) = simulated();
        let output = OutputChannel::new(16);

        tx.send(ProcessEvent::Stderr("Unable to find device".into())).unwrap();
        tx.send(ProcessEvent::Exited(Some(127))).unwrap();

        let err = wait_until_ready(&mut rx, &output, parse_socket_location)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProcessExitedBeforeReady(Some(127))));
        assert!(err.to_string().contains("127"));
    }

    #[tokio::test]
    async fn test_only_first_match_counts() {
        let (tx, mut rx) = simulated();
        let output = OutputChannel::new(16);
        let mut sub = output.subscribe();

        tx.send(ProcessEvent::Stdout("debug port: 40001".into())).unwrap();
        tx.send(ProcessEvent::Stdout("debug port: 40002".into())).unwrap();
        tx.send(ProcessEvent::Exited(Some(0))).unwrap();

        let port = wait_until_ready(&mut rx, &output, parse_debug_port).await.unwrap();
        assert_eq!(port, 40001);

        // The rest is forwarded but never matched again
        let code = relay(rx, output.clone()).await.unwrap();
        assert_eq!(code, Some(0));
        assert_eq!(sub.recv().await.unwrap().text(), "debug port: 40001");
        assert_eq!(sub.recv().await.unwrap().text(), "debug port: 40002");
    }

    #[tokio::test]
    async fn test_closed_channel_is_an_early_exit() {
        let (tx, mut rx) = simulated();
        drop(tx);
        let output = OutputChannel::new(4);

        let err = wait_until_ready(&mut rx, &output, parse_debug_port)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProcessExitedBeforeReady(None)));
    }

    #[tokio::test]
    async fn test_silent_process_times_out() {
        let (_tx, mut rx) = simulated();
        let output = OutputChannel::new(4);

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            wait_until_ready(&mut rx, &output, parse_debug_port),
        )
        .await;
        assert!(result.is_err());
    }
}
