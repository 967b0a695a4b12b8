//! iOS project
//!
//! `tns debug ios --no-client` prints the path of the inspector socket it
//! created; that socket is the debug endpoint. Only macOS hosts can build
//! for iOS, so every operation is gated on the host first.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::common::{HostOs, Platform, Result};
use crate::tns::{OutputChannel, TnsProcess};

use super::readiness::parse_socket_location;
use super::{
    with_launch_flags, DebugEndpoint, DebugOptions, DebugRequest, LaunchOptions, Project,
    ProjectCore, ProjectSettings,
};

pub struct IosProject {
    core: ProjectCore,
}

impl IosProject {
    pub fn new(project_root: impl Into<PathBuf>, settings: ProjectSettings) -> Self {
        Self {
            core: ProjectCore::new(Platform::Ios, project_root, settings),
        }
    }

    /// Pretend to run on another host
    pub fn with_host(mut self, host: HostOs) -> Self {
        self.core.set_host(host);
        self
    }

    /// Command line for `run`
    pub fn run_command(&self, opts: &LaunchOptions) -> String {
        let builder = self
            .core
            .command("run")
            .try_append_param("--emulator", opts.emulator);
        with_launch_flags(builder, opts).build()
    }

    /// Command line for `debug`
    pub fn debug_command(&self, opts: &DebugOptions) -> String {
        let attach = opts.request == DebugRequest::Attach;
        let builder = self
            .core
            .command("debug")
            .try_append_param("--emulator", opts.launch.emulator)
            .try_append_param("--start", attach)
            .try_append_param("--debug-brk", !attach)
            .append_param("--no-client");
        with_launch_flags(builder, &opts.launch).build()
    }

    pub fn endpoint(&self) -> Option<&DebugEndpoint> {
        self.core.endpoint()
    }
}

#[async_trait]
impl Project for IosProject {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    fn project_root(&self) -> &Path {
        self.core.root()
    }

    fn output(&self) -> &OutputChannel {
        self.core.output()
    }

    async fn run(&mut self, opts: &LaunchOptions) -> Result<TnsProcess> {
        self.core.ensure_host_supported()?;
        let command = self.run_command(opts);
        self.core.spawn(&command)
    }

    async fn debug(&mut self, opts: &DebugOptions) -> Result<DebugEndpoint> {
        self.core.ensure_host_supported()?;
        let command = self.debug_command(opts);

        let path = self
            .core
            .launch_until_ready(&command, parse_socket_location)
            .await?;

        Ok(self.core.resolve(DebugEndpoint::Socket { path }))
    }

    fn debug_process(&mut self) -> Option<&mut TnsProcess> {
        self.core.process_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;

    fn project() -> IosProject {
        IosProject::new("/work/app", ProjectSettings::default()).with_host(HostOs::MacOS)
    }

    #[test]
    fn test_run_command() {
        let cmd = project().run_command(&LaunchOptions {
            emulator: true,
            ..Default::default()
        });
        assert_eq!(cmd, "tns run ios --emulator");
    }

    #[test]
    fn test_launch_debug_command() {
        let cmd = project().debug_command(&DebugOptions::default());
        assert_eq!(cmd, "tns debug ios --debug-brk --no-client");
    }

    #[test]
    fn test_attach_debug_command() {
        let cmd = project().debug_command(&DebugOptions {
            request: DebugRequest::Attach,
            launch: LaunchOptions {
                emulator: true,
                sync_all_files: false,
                tns_args: vec!["--device".into(), "iPhone-7".into()],
            },
        });
        assert_eq!(
            cmd,
            "tns debug ios --emulator --start --no-client --device iPhone-7"
        );
    }

    #[tokio::test]
    async fn test_debug_refused_off_macos() {
        let mut project =
            IosProject::new("/work/app", ProjectSettings::default()).with_host(HostOs::Linux);

        let err = project.debug(&DebugOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::PlatformUnsupported { .. }));
        assert!(project.debug_process().is_none());

        let err = project.run(&LaunchOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::PlatformUnsupported { .. }));
    }
}
