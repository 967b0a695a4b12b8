//! Android project
//!
//! Debugging takes two tns invocations: `tns debug android --debug-brk`
//! starts the app and prints a marker once the runtime's inspector is up,
//! then `tns debug android --get-port` reports the local port forwarded to
//! it. Attaching skips the first step.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::common::{Error, Platform, Result};
use crate::tns::{OutputChannel, TnsProcess};

use super::readiness::{self, is_android_debugger_started, parse_debug_port};
use super::{
    with_launch_flags, DebugEndpoint, DebugOptions, DebugRequest, LaunchOptions, Project,
    ProjectCore, ProjectSettings,
};

/// Host the forwarded debug port listens on
pub const DEBUG_HOST: &str = "localhost";

pub struct AndroidProject {
    core: ProjectCore,
}

impl AndroidProject {
    pub fn new(project_root: impl Into<PathBuf>, settings: ProjectSettings) -> Self {
        Self {
            core: ProjectCore::new(Platform::Android, project_root, settings),
        }
    }

    /// Command line for `run`
    pub fn run_command(&self, opts: &LaunchOptions) -> String {
        let builder = self
            .core
            .command("run")
            .try_append_param("--emulator", opts.emulator);
        with_launch_flags(builder, opts).build()
    }

    /// Command line that starts the app under the debugger
    pub fn debug_command(&self, opts: &LaunchOptions) -> String {
        let builder = self
            .core
            .command("debug")
            .append_param("--debug-brk")
            .try_append_param("--emulator", opts.emulator)
            .append_param("--no-client");
        with_launch_flags(builder, opts).build()
    }

    /// Command line that asks for the forwarded debug port
    pub fn port_command(&self, opts: &LaunchOptions) -> String {
        self.core
            .command("debug")
            .append_param("--get-port")
            .try_append_param("--emulator", opts.emulator)
            .append_params(opts.tns_args.iter().cloned())
            .build()
    }

    /// Ask tns for the port forwarded to the app's inspector
    ///
    /// Resolves on the first `debug port: NNNNN` line. The query process is
    /// left to finish on its own.
    pub async fn debug_port(&self, opts: &LaunchOptions) -> Result<u16> {
        let command = self.port_command(opts);
        tracing::debug!(%command, "Querying Android debug port");

        let (mut process, port) = readiness::launch_until_ready(
            &command,
            self.core.root(),
            self.core.output(),
            self.core.settings().ready_timeout,
            parse_debug_port,
        )
        .await?;

        tokio::spawn(async move {
            process.wait().await;
        });

        tracing::debug!(port, "Android debug port found");
        Ok(port)
    }

    pub fn endpoint(&self) -> Option<&DebugEndpoint> {
        self.core.endpoint()
    }
}

#[async_trait]
impl Project for AndroidProject {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    fn project_root(&self) -> &Path {
        self.core.root()
    }

    fn output(&self) -> &OutputChannel {
        self.core.output()
    }

    async fn run(&mut self, opts: &LaunchOptions) -> Result<TnsProcess> {
        let command = self.run_command(opts);
        self.core.spawn(&command)
    }

    async fn debug(&mut self, opts: &DebugOptions) -> Result<DebugEndpoint> {
        match opts.request {
            DebugRequest::Attach => {
                tracing::info!("Attaching to a running Android app");
                self.core.ensure_idle()?;
            }
            DebugRequest::Launch => {
                let command = self.debug_command(&opts.launch);
                self.core
                    .launch_until_ready(&command, |line| {
                        is_android_debugger_started(line).then_some(())
                    })
                    .await?;

                // Give adb's port forward a moment to bind
                tokio::time::sleep(self.core.settings().android_bridge_delay).await;
            }
        }

        let port = match self.debug_port(&opts.launch).await {
            Ok(port) => port,
            Err(e) => {
                if let Error::ProcessExitedBeforeReady(code) = &e {
                    tracing::warn!(?code, "tns did not report a debug port");
                }
                self.core.abandon();
                return Err(e);
            }
        };

        Ok(self.core.resolve(DebugEndpoint::Tcp {
            host: DEBUG_HOST.to_string(),
            port,
        }))
    }

    fn debug_process(&mut self) -> Option<&mut TnsProcess> {
        self.core.process_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> AndroidProject {
        AndroidProject::new("/work/app", ProjectSettings::default())
    }

    #[test]
    fn test_run_command() {
        let cmd = project().run_command(&LaunchOptions::default());
        assert_eq!(cmd, "tns run android");
    }

    #[test]
    fn test_debug_command() {
        let cmd = project().debug_command(&LaunchOptions {
            emulator: true,
            sync_all_files: true,
            tns_args: vec![],
        });
        assert_eq!(
            cmd,
            "tns debug android --debug-brk --emulator --no-client --syncAllFiles"
        );
    }

    #[test]
    fn test_port_command() {
        let cmd = project().port_command(&LaunchOptions {
            emulator: false,
            sync_all_files: true,
            tns_args: vec!["--device".into(), "emulator-5554".into()],
        });
        assert_eq!(cmd, "tns debug android --get-port --device emulator-5554");
    }
}
