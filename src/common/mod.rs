//! Common utilities shared by the CLI and the session layer

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;
pub mod platform;

pub use error::{Error, Result};
pub use platform::{HostOs, Platform};
