//! Error types for tns-debug
//!
//! Messages are meant to be shown to the user as-is, so each one says what
//! went wrong and, where possible, how to fix it.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tns-debug
#[derive(Error, Debug)]
pub enum Error {
    // === Toolchain Errors ===
    #[error("NativeScript CLI not found. Install it with 'npm install -g nativescript' or set toolchain.path in the config file")]
    ToolchainMissing,

    #[error("NativeScript CLI {installed} is too old, version {required} or newer is required. Update it with 'npm install -g nativescript'")]
    ToolchainTooOld { installed: String, required: String },

    #[error("Cannot debug {platform} apps on {host}: the iOS toolchain only runs on macOS")]
    PlatformUnsupported { platform: String, host: String },

    // === Process Errors ===
    #[error("Failed to start the NativeScript CLI: {0}")]
    ProcessStartFailed(String),

    #[error("The NativeScript CLI exited with {} before the debugger was ready", describe_exit(.0))]
    ProcessExitedBeforeReady(Option<i32>),

    #[error("Timed out after {0} seconds waiting for the debugger to become ready")]
    ReadyTimeout(u64),

    #[error("A tns process is already running for this project. Stop it before starting another one")]
    SessionAlreadyActive,

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by a signal)".to_string(),
    }
}

impl Error {
    /// Create a "too old" error from the two versions
    pub fn toolchain_too_old(installed: impl ToString, required: impl ToString) -> Self {
        Self::ToolchainTooOld {
            installed: installed.to_string(),
            required: required.to_string(),
        }
    }

    /// Create a platform unsupported error
    pub fn platform_unsupported(platform: impl ToString, host: impl ToString) -> Self {
        Self::PlatformUnsupported {
            platform: platform.to_string(),
            host: host.to_string(),
        }
    }

    /// Stable machine-readable code for JSON output
    pub fn code(&self) -> &'static str {
        match self {
            Error::ToolchainMissing => "TOOLCHAIN_MISSING",
            Error::ToolchainTooOld { .. } => "TOOLCHAIN_TOO_OLD",
            Error::PlatformUnsupported { .. } => "PLATFORM_UNSUPPORTED",
            Error::ProcessStartFailed(_) => "PROCESS_START_FAILED",
            Error::ProcessExitedBeforeReady(_) => "PROCESS_EXITED_BEFORE_READY",
            Error::ReadyTimeout(_) => "TIMEOUT",
            Error::SessionAlreadyActive => "SESSION_ALREADY_ACTIVE",
            Error::Config(_) | Error::ConfigParse(_) => "CONFIG",
            _ => "INTERNAL_ERROR",
        }
    }
}

/// Serializable error for `--json` output
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
}

impl From<&Error> for ErrorReport {
    fn from(e: &Error) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}
