use std::path::{Path, PathBuf};

use crate::paths::HostPathsError;

const PROC_VERSION: &str = "/proc/version";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostKind {
    Native,
    Wsl { distro: Option<String> },
}

impl HostKind {
    /// Classify the running kernel from the contents of `/proc/version`.
    #[must_use]
    pub fn from_proc_version(content: &str, distro: Option<String>) -> Self {
        let lower = content.to_ascii_lowercase();
        if lower.contains("microsoft") || lower.contains("wsl") {
            HostKind::Wsl { distro }
        } else {
            HostKind::Native
        }
    }

    #[must_use]
    pub fn detect() -> Self {
        let distro = std::env::var("WSL_DISTRO_NAME").ok();
        match std::fs::read_to_string(PROC_VERSION) {
            Ok(content) => Self::from_proc_version(&content, distro),
            Err(_) => HostKind::Native,
        }
    }

    #[must_use]
    pub fn is_wsl(&self) -> bool {
        matches!(self, HostKind::Wsl { .. })
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            HostKind::Native => "Linux".to_string(),
            HostKind::Wsl { distro: Some(distro) } => format!("WSL: {distro}"),
            HostKind::Wsl { distro: None } => "WSL".to_string(),
        }
    }
}

/// Snapshot of the process environment the run depends on. Steps receive this
/// explicitly rather than reading ambient variables.
#[derive(Debug, Clone)]
pub struct HostEnvironment {
    pub kind: HostKind,
    pub home: PathBuf,
    pub path: String,
    pub shell: Option<String>,
    pub user: Option<String>,
}

impl HostEnvironment {
    /// Capture the current process environment.
    ///
    /// # Errors
    /// Returns an error when the home directory cannot be determined.
    pub fn capture() -> Result<Self, HostPathsError> {
        let home = dirs::home_dir().ok_or(HostPathsError::HomeDirUnavailable)?;
        Ok(Self {
            kind: HostKind::detect(),
            home,
            path: std::env::var("PATH").unwrap_or_default(),
            shell: std::env::var("SHELL").ok(),
            user: std::env::var("USER").ok(),
        })
    }

    pub fn path_entries(&self) -> impl Iterator<Item = &Path> {
        self.path
            .split(':')
            .filter(|entry| !entry.is_empty())
            .map(Path::new)
    }

    #[must_use]
    pub fn path_contains(&self, dir: &Path) -> bool {
        self.path_entries().any(|entry| entry == dir)
    }

    /// `PATH` with `dir` in front, unless it is already listed.
    #[must_use]
    pub fn path_with(&self, dir: &Path) -> String {
        if self.path_contains(dir) {
            self.path.clone()
        } else if self.path.is_empty() {
            dir.display().to_string()
        } else {
            format!("{}:{}", dir.display(), self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with_path(path: &str) -> HostEnvironment {
        HostEnvironment {
            kind: HostKind::Native,
            home: PathBuf::from("/home/dev"),
            path: path.to_string(),
            shell: Some("/bin/bash".to_string()),
            user: Some("dev".to_string()),
        }
    }

    #[test]
    fn proc_version_with_microsoft_is_wsl() {
        let content = "Linux version 5.15.153.1-microsoft-standard-WSL2 (root@1) (gcc)";

        let kind = HostKind::from_proc_version(content, Some("Ubuntu-22.04".to_string()));

        assert!(kind.is_wsl());
        assert_eq!(kind.display_name(), "WSL: Ubuntu-22.04");
    }

    #[test]
    fn plain_kernel_is_native() {
        let content = "Linux version 6.8.0-45-generic (buildd@lcy02-amd64-075)";

        assert_eq!(HostKind::from_proc_version(content, None), HostKind::Native);
    }

    #[test]
    fn path_contains_matches_whole_entries_only() {
        let env = env_with_path("/usr/bin:/home/dev/.local/bin-old:/bin");

        assert!(env.path_contains(Path::new("/usr/bin")));
        assert!(!env.path_contains(Path::new("/home/dev/.local/bin")));
    }

    #[test]
    fn path_with_prepends_missing_dir_once() {
        let env = env_with_path("/usr/bin:/bin");
        let local_bin = Path::new("/home/dev/.local/bin");

        let path = env.path_with(local_bin);
        assert_eq!(path, "/home/dev/.local/bin:/usr/bin:/bin");

        let env = env_with_path(&path);
        assert_eq!(env.path_with(local_bin), path);
    }
}
