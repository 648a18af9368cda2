use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HostPathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
    #[error("Could not determine config directory")]
    ConfigDirUnavailable,
    #[error("Could not determine data directory")]
    DataDirUnavailable,
}

pub struct HostPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl HostPaths {
    /// Resolve the XDG locations pyrig reads and writes.
    ///
    /// # Errors
    /// Returns an error when the config or data base directory cannot be
    /// determined.
    pub fn new() -> Result<Self, HostPathsError> {
        Ok(Self {
            config_dir: dirs::config_dir()
                .ok_or(HostPathsError::ConfigDirUnavailable)?
                .join("pyrig"),
            data_dir: dirs::data_dir()
                .ok_or(HostPathsError::DataDirUnavailable)?
                .join("pyrig"),
        })
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("pyrig.log")
    }

    #[must_use]
    pub fn lock_file(&self) -> PathBuf {
        self.data_dir.join("pyrig.lock")
    }

    /// Create the config and data directories.
    ///
    /// # Errors
    /// Returns an error if any directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::HostPaths;

    fn test_paths(root: &std::path::Path) -> HostPaths {
        HostPaths {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    #[test]
    fn file_paths_use_expected_filenames() {
        let root = tempfile::tempdir().expect("create temp dir");
        let paths = test_paths(root.path());

        assert!(
            paths
                .settings_file()
                .ends_with(std::path::Path::new("config").join("settings.json"))
        );
        assert!(
            paths
                .log_file()
                .ends_with(std::path::Path::new("data").join("pyrig.log"))
        );
        assert!(
            paths
                .lock_file()
                .ends_with(std::path::Path::new("data").join("pyrig.lock"))
        );
    }

    #[test]
    fn ensure_dirs_creates_config_and_data() {
        let root = tempfile::tempdir().expect("create temp dir");
        let paths = test_paths(root.path());

        paths.ensure_dirs().expect("directories should be created");

        assert!(paths.config_dir.is_dir());
        assert!(paths.data_dir.is_dir());
    }
}
