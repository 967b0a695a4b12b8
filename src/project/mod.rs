//! Platform projects driving `tns run` and `tns debug`
//!
//! Each platform decides how its commands are built and which output line
//! means the debugger is reachable. The shared skeleton (one live process
//! per project, output relaying, readiness deadline) lives in
//! [`ProjectCore`] and [`readiness`].

pub mod android;
pub mod ios;
pub mod readiness;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::common::{config::Config, Error, HostOs, Platform, Result};
use crate::tns::{CommandBuilder, OutputChannel, ProcessRunner, TnsProcess};

pub use android::AndroidProject;
pub use ios::IosProject;

/// Whether a debug request starts the app or connects to a running one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugRequest {
    #[default]
    Launch,
    Attach,
}

/// Options shared by run and debug requests
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Target an emulator/simulator instead of a device
    pub emulator: bool,
    /// Pass `--syncAllFiles` so changes under node_modules are synced too
    pub sync_all_files: bool,
    /// Extra arguments appended verbatim to the tns command line
    pub tns_args: Vec<String>,
}

/// Options for a debug request
#[derive(Debug, Clone, Default)]
pub struct DebugOptions {
    pub request: DebugRequest,
    pub launch: LaunchOptions,
}

/// Where the debugger front end should connect
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DebugEndpoint {
    /// Inspector socket published by the iOS runtime
    Socket { path: PathBuf },
    /// Port forwarded from the Android device
    Tcp { host: String, port: u16 },
}

impl fmt::Display for DebugEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebugEndpoint::Socket { path } => write!(f, "{}", path.display()),
            DebugEndpoint::Tcp { host, port } => write!(f, "{}:{}", host, port),
        }
    }
}

/// Settings a project needs from the configuration
#[derive(Debug, Clone)]
pub struct ProjectSettings {
    /// tns program to invoke
    pub program: String,
    /// Deadline for readiness markers
    pub ready_timeout: Duration,
    /// Pause after the Android debugger marker
    pub android_bridge_delay: Duration,
    /// Output channel capacity
    pub channel_capacity: usize,
}

impl ProjectSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.toolchain_program(),
            ready_timeout: config.timeouts.ready(),
            android_bridge_delay: config.timeouts.android_bridge_delay(),
            channel_capacity: config.output.channel_capacity,
        }
    }
}

impl Default for ProjectSettings {
    fn default() -> Self {
        let config = Config::default();
        Self {
            program: config.toolchain.path.clone(),
            ready_timeout: config.timeouts.ready(),
            android_bridge_delay: config.timeouts.android_bridge_delay(),
            channel_capacity: config.output.channel_capacity,
        }
    }
}

/// A NativeScript app that can be run or debugged on one platform
#[async_trait]
pub trait Project: Send {
    fn platform(&self) -> Platform;

    fn project_root(&self) -> &Path;

    /// Channel carrying the output of every process this project starts
    fn output(&self) -> &OutputChannel;

    /// Start the app without a debugger
    ///
    /// Resolves as soon as the process is spawned; the caller owns the
    /// returned handle and its events.
    async fn run(&mut self, opts: &LaunchOptions) -> Result<TnsProcess>;

    /// Start or attach a debug session and resolve its endpoint
    async fn debug(&mut self, opts: &DebugOptions) -> Result<DebugEndpoint>;

    /// Process backing the current debug session, if one was launched
    fn debug_process(&mut self) -> Option<&mut TnsProcess>;
}

/// Create the project for a platform
pub fn create_project(
    platform: Platform,
    project_root: impl Into<PathBuf>,
    settings: ProjectSettings,
) -> Box<dyn Project> {
    match platform {
        Platform::Android => Box::new(AndroidProject::new(project_root, settings)),
        Platform::Ios => Box::new(IosProject::new(project_root, settings)),
    }
}

/// State and behaviour shared by the platform projects
#[derive(Debug)]
pub struct ProjectCore {
    platform: Platform,
    root: PathBuf,
    settings: ProjectSettings,
    host: HostOs,
    output: OutputChannel,
    process: Option<TnsProcess>,
    endpoint: Option<DebugEndpoint>,
}

impl ProjectCore {
    pub fn new(platform: Platform, root: impl Into<PathBuf>, settings: ProjectSettings) -> Self {
        let output = OutputChannel::new(settings.channel_capacity);
        Self {
            platform,
            root: root.into(),
            settings,
            host: HostOs::current(),
            output,
            process: None,
            endpoint: None,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn output(&self) -> &OutputChannel {
        &self.output
    }

    pub fn host(&self) -> HostOs {
        self.host
    }

    pub fn set_host(&mut self, host: HostOs) {
        self.host = host;
    }

    /// Endpoint resolved by the last successful debug request
    pub fn endpoint(&self) -> Option<&DebugEndpoint> {
        self.endpoint.as_ref()
    }

    pub fn process_mut(&mut self) -> Option<&mut TnsProcess> {
        self.process.as_mut()
    }

    /// Start a command line with the configured tns program
    pub fn command(&self, subcommand: &str) -> CommandBuilder {
        CommandBuilder::with_program(self.settings.program.clone())
            .append_param(subcommand)
            .append_param(self.platform.as_str())
    }

    /// Fail before spawning anything when the host cannot build this platform
    pub fn ensure_host_supported(&self) -> Result<()> {
        if self.host.supports(self.platform) {
            Ok(())
        } else {
            Err(Error::platform_unsupported(self.platform, self.host))
        }
    }

    /// Fail when the previous debug process is still alive
    pub fn ensure_idle(&mut self) -> Result<()> {
        match &self.process {
            Some(process) if !process.has_exited() => Err(Error::SessionAlreadyActive),
            _ => {
                self.process = None;
                self.endpoint = None;
                Ok(())
            }
        }
    }

    /// Kill and forget the session process after a failed debug request
    pub fn abandon(&mut self) {
        if let Some(mut process) = self.process.take() {
            tracing::debug!(command = %process.command(), "Stopping abandoned tns process");
            process.kill();
        }
        self.endpoint = None;
    }

    pub fn spawn(&self, command: &str) -> Result<TnsProcess> {
        tracing::info!(platform = %self.platform, %command, "Starting tns");
        ProcessRunner::spawn(command, &self.root)
    }

    /// Launch the session process and wait for its readiness marker
    pub async fn launch_until_ready<T, F>(&mut self, command: &str, matcher: F) -> Result<T>
    where
        F: FnMut(&str) -> Option<T> + Send,
        T: Send,
    {
        self.ensure_idle()?;
        tracing::info!(platform = %self.platform, %command, "Launching debug session");

        let (process, found) = readiness::launch_until_ready(
            command,
            &self.root,
            &self.output,
            self.settings.ready_timeout,
            matcher,
        )
        .await?;

        self.process = Some(process);
        Ok(found)
    }

    /// Record the endpoint of the current session
    pub fn resolve(&mut self, endpoint: DebugEndpoint) -> DebugEndpoint {
        tracing::info!(platform = %self.platform, %endpoint, "Debugger endpoint ready");
        self.endpoint = Some(endpoint.clone());
        endpoint
    }
}

/// Append the flags every run/debug command shares
pub(crate) fn with_launch_flags(builder: CommandBuilder, opts: &LaunchOptions) -> CommandBuilder {
    builder
        .try_append_param("--syncAllFiles", opts.sync_all_files)
        .append_params(opts.tns_args.iter().cloned())
}
