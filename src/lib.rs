//! tns-debug - debug bridge for NativeScript apps
//!
//! This library wraps the NativeScript CLI: it builds and runs `tns`
//! commands, watches their output for the moment a debugger can connect,
//! and maps device script URLs back to files of the local project.

pub mod cli;
pub mod commands;
pub mod common;
pub mod mapping;
pub mod project;
pub mod tns;

// Re-export commonly used types for tests
pub use common::{Error, HostOs, Platform, Result};
pub use project::{create_project, DebugEndpoint, DebugOptions, LaunchOptions, Project};
