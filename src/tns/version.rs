//! NativeScript CLI version parsing and compatibility checks

use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::common::{Error, Result};

use super::command::CommandBuilder;
use super::process;

/// Oldest CLI this tool knows how to drive
pub const MIN_CLI_VERSION: Version = Version::new(2, 5, 0);

/// A `major.minor.patch` version triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a dotted version such as `3.1` or `2.5.0-rc.1`
    ///
    /// Missing components are padded with zeros and each segment only
    /// contributes its leading digits. Returns `None` for empty input or a
    /// segment that does not start with a digit.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut parts = [0u32; 3];
        for (slot, segment) in parts.iter_mut().zip(text.split('.')) {
            let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
            *slot = digits.parse().ok()?;
        }

        Some(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Compare major, then minor, then patch, stopping at the first difference
pub fn compare_by_subminor(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
}

/// Whether the installed CLI can be driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CliCompatibility {
    NotInstalled,
    TooOld,
    Compatible,
}

impl CliCompatibility {
    pub fn evaluate(installed: Option<&Version>, minimum: &Version) -> Self {
        match installed {
            None => CliCompatibility::NotInstalled,
            Some(v) if compare_by_subminor(v, minimum) == Ordering::Less => {
                CliCompatibility::TooOld
            }
            Some(_) => CliCompatibility::Compatible,
        }
    }
}

/// Result of probing the installed CLI
#[derive(Debug, Clone, serde::Serialize)]
pub struct CliVersionInfo {
    pub installed: Option<Version>,
    pub minimum: Version,
    pub compatibility: CliCompatibility,
}

static CLI_VERSION: OnceCell<CliVersionInfo> = OnceCell::const_new();

impl CliVersionInfo {
    pub fn new(installed: Option<Version>, minimum: Version) -> Self {
        Self {
            compatibility: CliCompatibility::evaluate(installed.as_ref(), &minimum),
            installed,
            minimum,
        }
    }

    /// Probe the CLI once per process and reuse the answer afterwards
    pub async fn cached(program: &str, minimum: Version, timeout: Duration) -> &'static Self {
        CLI_VERSION
            .get_or_init(|| Self::detect(program, minimum, timeout))
            .await
    }

    /// Run `<program> --version` and evaluate the result (uncached)
    pub async fn detect(program: &str, minimum: Version, timeout: Duration) -> Self {
        let command = CommandBuilder::with_program(program)
            .append_param("--version")
            .build();

        let installed = match tokio::time::timeout(timeout, process::run_to_completion(&command))
            .await
        {
            Ok(Ok(stdout)) => {
                let parsed = Version::parse(&stdout);
                if parsed.is_none() {
                    tracing::warn!(output = %stdout.trim(), "Unparsable tns --version output");
                }
                parsed
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "tns --version failed");
                None
            }
            Err(_) => {
                tracing::warn!(timeout_secs = timeout.as_secs(), "tns --version timed out");
                None
            }
        };

        tracing::info!(
            installed = %installed.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string()),
            minimum = %minimum,
            "Detected NativeScript CLI"
        );

        Self::new(installed, minimum)
    }

    /// Remediation message for the user, `None` when compatible
    pub fn error_message(&self) -> Option<String> {
        self.check().err().map(|e| e.to_string())
    }

    /// Turn an incompatible state into an error
    pub fn check(&self) -> Result<()> {
        match (self.compatibility, self.installed) {
            (CliCompatibility::Compatible, _) => Ok(()),
            (CliCompatibility::TooOld, Some(installed)) => {
                Err(Error::toolchain_too_old(installed, self.minimum))
            }
            _ => Err(Error::ToolchainMissing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        Version::parse(text).unwrap()
    }

    #[test]
    fn test_parse_pads_missing_components() {
        assert_eq!(v("3"), Version::new(3, 0, 0));
        assert_eq!(v("3.1"), Version::new(3, 1, 0));
        assert_eq!(v("3.1.2"), Version::new(3, 1, 2));
        assert_eq!(v(" 2.5.0\n"), Version::new(2, 5, 0));
    }

    #[test]
    fn test_parse_prerelease_and_extra_segments() {
        assert_eq!(v("2.5.0-rc"), Version::new(2, 5, 0));
        assert_eq!(v("1.2.3.4"), Version::new(1, 2, 3));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Version::parse(""), None);
        assert_eq!(Version::parse("command not found"), None);
        assert_eq!(Version::parse("1.x"), None);
    }

    #[test]
    fn test_stringify_round_trip() {
        for text in ["7", "2.5", "10.0.3", "0.0.0"] {
            let parsed = v(text);
            assert_eq!(v(&parsed.to_string()), parsed);
        }
    }

    #[test]
    fn test_compare_is_reflexive() {
        for text in ["0", "1.2", "3.4.5"] {
            let a = v(text);
            assert_eq!(compare_by_subminor(&a, &a), Ordering::Equal);
        }
    }

    #[test]
    fn test_compare_order_properties() {
        let versions: Vec<Version> = [0u32, 1, 2]
            .iter()
            .flat_map(|&major| {
                [0u32, 3].into_iter().flat_map(move |minor| {
                    [0u32, 9].into_iter().map(move |patch| Version::new(major, minor, patch))
                })
            })
            .collect();

        for a in &versions {
            for b in &versions {
                assert_eq!(compare_by_subminor(a, b), compare_by_subminor(b, a).reverse());
                assert_eq!(compare_by_subminor(a, b), a.cmp(b));
                for c in &versions {
                    if compare_by_subminor(a, b).is_lt() && compare_by_subminor(b, c).is_lt() {
                        assert!(compare_by_subminor(a, c).is_lt());
                    }
                }
            }
        }
    }

    #[test]
    fn test_compare_short_circuits_on_major() {
        assert_eq!(compare_by_subminor(&v("3.0.0"), &v("2.9.9")), Ordering::Greater);
        assert_eq!(compare_by_subminor(&v("2.4.9"), &v("2.5.0")), Ordering::Less);
    }

    #[test]
    fn test_compatibility_states() {
        let min = v("2.5.0");
        assert_eq!(
            CliCompatibility::evaluate(None, &min),
            CliCompatibility::NotInstalled
        );
        assert_eq!(
            CliCompatibility::evaluate(Some(&v("2.4.1")), &min),
            CliCompatibility::TooOld
        );
        assert_eq!(
            CliCompatibility::evaluate(Some(&v("2.5")), &min),
            CliCompatibility::Compatible
        );
        assert_eq!(
            CliCompatibility::evaluate(Some(&v("3.0.1")), &min),
            CliCompatibility::Compatible
        );
    }

    #[test]
    fn test_error_messages() {
        let missing = CliVersionInfo::new(None, MIN_CLI_VERSION);
        assert!(matches!(missing.check(), Err(Error::ToolchainMissing)));

        let old = CliVersionInfo::new(Some(v("2.0.0")), MIN_CLI_VERSION);
        let msg = old.error_message().unwrap();
        assert!(msg.contains("2.0.0") && msg.contains("2.5.0"), "{msg}");

        let ok = CliVersionInfo::new(Some(v("4.2.0")), MIN_CLI_VERSION);
        assert!(ok.error_message().is_none());
    }

    #[tokio::test]
    async fn test_detect_missing_program() {
        let info = CliVersionInfo::detect(
            "tns-debug-definitely-not-installed",
            MIN_CLI_VERSION,
            Duration::from_secs(10),
        )
        .await;
        assert_eq!(info.installed, None);
        assert_eq!(info.compatibility, CliCompatibility::NotInstalled);
    }
}
