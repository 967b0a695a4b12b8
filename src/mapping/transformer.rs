//! Device script URL to local file mapping
//!
//! The runtime reports scripts by their location inside the app sandbox
//! on the device (or simulator). Breakpoints only bind when those URLs are
//! turned back into files of the local project.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::Platform;

/// Prefix some debugger front ends put in front of script URLs
const INTERNAL_URL_PREFIX: &str = "mdha:";

/// Directory tns bundles third-party modules into on the device
const BUNDLED_MODULES_DIR: &str = "tns_modules";

/// Where bundled modules live locally, relative to the app directory
const LOCAL_MODULES_DIR: &str = "../node_modules";

static ANDROID_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/data/(?:data|user/\d+)/[^/]+/files/(.*)$").expect("must compile")
});

static IOS_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:file:)?/*(.*)$").expect("must compile"));

/// Existence checks used while mapping
pub trait FileProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileProbe for RealFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// A fixed set of files, handy for snapshots in tests
impl FileProbe for HashSet<PathBuf> {
    fn exists(&self, path: &Path) -> bool {
        self.contains(path)
    }
}

/// Maps device script URLs to local paths for one target platform
#[derive(Debug, Clone)]
pub struct PathTransformer<P = RealFs> {
    platform: Platform,
    probe: P,
}

impl PathTransformer<RealFs> {
    pub fn new(platform: Platform) -> Self {
        Self::with_probe(platform, RealFs)
    }
}

impl<P: FileProbe> PathTransformer<P> {
    pub fn with_probe(platform: Platform, probe: P) -> Self {
        Self { platform, probe }
    }

    pub fn target_platform(&self) -> Platform {
        self.platform
    }

    pub fn set_target_platform(&mut self, platform: Platform) {
        self.platform = platform;
    }

    /// Map a script URL reported by the device to a local file
    ///
    /// Returns `None` only for an empty URL. When nothing local matches the
    /// original URL comes back unchanged, which keeps the session usable
    /// without a breakpoint binding for that script.
    pub fn target_url_to_client_path(&self, project_root: &Path, script_url: &str) -> Option<String> {
        if script_url.is_empty() {
            return None;
        }

        let url = script_url
            .strip_prefix(INTERNAL_URL_PREFIX)
            .unwrap_or(script_url);

        if Path::new(url).is_absolute() && self.probe.exists(Path::new(url)) {
            return Some(url.to_string());
        }

        let relative = self
            .sandbox_relative(url)
            .replace(BUNDLED_MODULES_DIR, LOCAL_MODULES_DIR);
        // Always resolved under the project root, even for root-relative URLs
        let relative = relative.trim_start_matches(['/', '\\']);
        let absolute = normalize(&project_root.join(relative));

        if self.probe.exists(&absolute) {
            return Some(absolute.to_string_lossy().into_owned());
        }

        if let Some(variant) = self.platform_variant(&absolute) {
            if self.probe.exists(&variant) {
                return Some(variant.to_string_lossy().into_owned());
            }
        }

        tracing::trace!(%script_url, "No local file for script");
        Some(script_url.to_string())
    }

    /// Path of the script relative to the app sandbox, or the URL itself
    fn sandbox_relative<'a>(&self, url: &'a str) -> &'a str {
        let pattern = match self.platform {
            Platform::Android => &*ANDROID_FILE_RE,
            Platform::Ios => &*IOS_FILE_RE,
        };

        pattern
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or(url)
    }

    /// `foo.js` -> `foo.<platform>.js`
    fn platform_variant(&self, path: &Path) -> Option<PathBuf> {
        let ext = path.extension()?.to_str()?;
        Some(path.with_extension(format!("{}.{}", self.platform, ext)))
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
