//! NativeScript CLI plumbing
//!
//! Builds tns command lines, runs them as child processes, relays their
//! output and checks that the installed CLI is recent enough.

pub mod command;
pub mod output;
pub mod process;
pub mod version;

pub use command::CommandBuilder;
pub use output::{OutputChannel, OutputEvent};
pub use process::{ProcessEvent, ProcessRunner, TnsProcess};
pub use version::{CliCompatibility, CliVersionInfo, Version};
