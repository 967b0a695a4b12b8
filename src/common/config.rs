//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;
use crate::tns::version::{Version, MIN_CLI_VERSION};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// NativeScript CLI settings
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Output channel settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// NativeScript CLI settings
#[derive(Debug, Deserialize)]
pub struct ToolchainConfig {
    /// CLI executable, either a bare name looked up in PATH or a full path
    #[serde(default = "default_toolchain_path")]
    pub path: String,

    /// Minimum CLI version accepted before starting a session
    #[serde(default)]
    pub min_version: Option<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            path: default_toolchain_path(),
            min_version: None,
        }
    }
}

fn default_toolchain_path() -> String {
    "tns".to_string()
}

/// Timeout settings
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// How long to wait for a readiness marker in tns output
    #[serde(default = "default_ready")]
    pub ready_secs: u64,

    /// Delay after the Android debugger marker so the port forward can bind
    #[serde(default = "default_bridge_delay")]
    pub android_bridge_delay_ms: u64,

    /// Timeout for `tns --version`
    #[serde(default = "default_version_query")]
    pub version_query_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            ready_secs: default_ready(),
            android_bridge_delay_ms: default_bridge_delay(),
            version_query_secs: default_version_query(),
        }
    }
}

fn default_ready() -> u64 {
    180
}
fn default_bridge_delay() -> u64 {
    500
}
fn default_version_query() -> u64 {
    30
}

impl Timeouts {
    pub fn ready(&self) -> Duration {
        Duration::from_secs(self.ready_secs)
    }

    pub fn android_bridge_delay(&self) -> Duration {
        Duration::from_millis(self.android_bridge_delay_ms)
    }

    pub fn version_query(&self) -> Duration {
        Duration::from_secs(self.version_query_secs)
    }
}

/// Output channel configuration
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Events buffered per subscriber before slow subscribers start lagging
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    1024
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Resolve the CLI program to invoke
    ///
    /// A bare name is looked up in PATH; when that fails the name is used
    /// as-is and the shell gets the final say.
    pub fn toolchain_program(&self) -> String {
        let configured = Path::new(&self.toolchain.path);
        if configured.components().count() > 1 {
            return self.toolchain.path.clone();
        }
        which::which(configured)
            .map(|p: PathBuf| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| self.toolchain.path.clone())
    }

    /// Minimum CLI version, falling back to the packaged one
    pub fn min_cli_version(&self) -> Result<Version> {
        match &self.toolchain.min_version {
            Some(text) => Version::parse(text).ok_or_else(|| {
                super::Error::Config(format!("Invalid toolchain.min_version '{}'", text))
            }),
            None => Ok(MIN_CLI_VERSION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.toolchain.path, "tns");
        assert_eq!(config.timeouts.ready_secs, 180);
        assert_eq!(config.timeouts.android_bridge_delay(), Duration::from_millis(500));
        assert_eq!(config.min_cli_version().unwrap(), MIN_CLI_VERSION);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[toolchain]\npath = \"/opt/ns/bin/tns\"\nmin_version = \"3.0\"\n\n[timeouts]\nready_secs = 5\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.toolchain_program(), "/opt/ns/bin/tns");
        assert_eq!(config.min_cli_version().unwrap(), Version::new(3, 0, 0));
        assert_eq!(config.timeouts.ready_secs, 5);
        assert_eq!(config.timeouts.android_bridge_delay_ms, 500);
        assert_eq!(config.output.channel_capacity, 1024);
    }

    #[test]
    fn test_invalid_min_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[toolchain]\nmin_version = \"latest\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.min_cli_version().is_err());
    }

    #[test]
    fn test_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timeouts\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(super::super::Error::ConfigParse(_))
        ));
    }
}
