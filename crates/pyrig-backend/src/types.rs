use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::BackendError;

/// A CPython release series (`3.13`) or an exact release (`3.13.1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl PythonVersion {
    #[must_use]
    pub fn series(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: None,
        }
    }

    #[must_use]
    pub fn exact(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch: Some(patch),
        }
    }

    /// The `major.minor` part, as used in Debian package names.
    #[must_use]
    pub fn series_name(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// Interpreter package name, for example `python3.13`.
    #[must_use]
    pub fn package_name(&self) -> String {
        format!("python{}", self.series_name())
    }

    /// Companion package such as `python3.13-venv`.
    #[must_use]
    pub fn companion_package(&self, suffix: &str) -> String {
        format!("{}-{suffix}", self.package_name())
    }

    #[must_use]
    pub fn same_series(&self, other: &Self) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl Ord for PythonVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
    }
}

impl PartialOrd for PythonVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{patch}", self.major, self.minor),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("Expected X.Y or X.Y.Z format, got: {input}")]
    InvalidFormat { input: String },
    #[error("Invalid version component in {input}: {value}")]
    InvalidComponent { input: String, value: String },
}

impl FromStr for PythonVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("python").unwrap_or(s);

        let parts: Vec<&str> = s.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(VersionParseError::InvalidFormat {
                input: s.to_string(),
            });
        }

        let component = |value: &str| {
            value
                .parse::<u32>()
                .map_err(|_| VersionParseError::InvalidComponent {
                    input: s.to_string(),
                    value: value.to_string(),
                })
        };

        Ok(Self {
            major: component(parts[0])?,
            minor: component(parts[1])?,
            patch: parts.get(2).map(|p| component(p)).transpose()?,
        })
    }
}

/// What the package index says about a candidate package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
    /// The probe's output could not be interpreted.
    Unknown,
}

/// Mandatory packages abort the run on failure; optional ones are skipped
/// with a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSet {
    pub core: Vec<String>,
    pub optional: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub status: String,
}

impl InstalledPackage {
    /// Alpha, beta or release-candidate build (`~a1`, `~b2`, `~rc3`).
    /// Backports (`~bpo`) and rebuilds (`~build`) are final releases.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        let version = self.version.to_ascii_lowercase();
        version.split('~').skip(1).any(|suffix| {
            ["rc", "a", "b"].iter().any(|tag| {
                suffix
                    .strip_prefix(tag)
                    .and_then(|rest| rest.chars().next())
                    .is_some_and(|c| c.is_ascii_digit())
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShimStyle {
    /// `python`/`pip` link straight to the binaries.
    Symlink,
    /// `python`/`pip` are scripts that run `preamble` before exec'ing the
    /// target, so a version manager's hook is initialised first.
    Wrapper { preamble: Vec<String> },
}

/// A block a provider needs in the user's shell profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInit {
    /// Text whose presence means the block is already installed.
    pub marker: &'static str,
    pub label: &'static str,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRuntime {
    pub version: PythonVersion,
    pub interpreter: PathBuf,
    pub pip: PathBuf,
    pub style: ShimStyle,
}

/// Result of one orchestrated step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    SkippedWarning(String),
    Fatal(BackendError),
}

impl StepOutcome {
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, StepOutcome::Fatal(_))
    }
}

impl From<Result<(), BackendError>> for StepOutcome {
    fn from(result: Result<(), BackendError>) -> Self {
        match result {
            Ok(()) => StepOutcome::Success,
            Err(error) => StepOutcome::Fatal(error),
        }
    }
}
