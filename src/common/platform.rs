//! Target platforms and host operating system detection

use std::fmt;

/// Mobile platform a session targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// Name as used on the tns command line and in platform-specific file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system the tool runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    MacOS,
    Windows,
    Other,
}

impl HostOs {
    /// Get the current host
    pub fn current() -> Self {
        #[cfg(target_os = "linux")]
        return HostOs::Linux;

        #[cfg(target_os = "macos")]
        return HostOs::MacOS;

        #[cfg(target_os = "windows")]
        return HostOs::Windows;

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        return HostOs::Other;
    }

    /// Whether the host can build and debug a platform
    pub fn supports(&self, platform: Platform) -> bool {
        match platform {
            Platform::Android => true,
            Platform::Ios => *self == HostOs::MacOS,
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOs::Linux => write!(f, "linux"),
            HostOs::MacOS => write!(f, "macos"),
            HostOs::Windows => write!(f, "windows"),
            HostOs::Other => write!(f, "an unsupported OS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_names() {
        assert_eq!(Platform::Android.to_string(), "android");
        assert_eq!(Platform::Ios.as_str(), "ios");
    }

    #[test]
    fn test_ios_needs_macos() {
        assert!(HostOs::MacOS.supports(Platform::Ios));
        assert!(!HostOs::Linux.supports(Platform::Ios));
        assert!(!HostOs::Windows.supports(Platform::Ios));
        assert!(HostOs::Windows.supports(Platform::Android));
    }
}
