use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use pyrig_apt::{DEFAULT_CHANNEL, DEFAULT_DOCKER_INSTALLER_URL, DEFAULT_GET_PIP_URL, DockerConfig, PpaConfig};
use pyrig_backend::{PackageSet, PythonVersion, VersionParseError};
use pyrig_core::DownloadPolicy;
use pyrig_platform::HostPaths;
use pyrig_pyenv::{DEFAULT_PYENV_INSTALLER_URL, PyenvConfig, default_build_packages};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid entry in preferred_versions: {0}")]
    Version(#[from] VersionParseError),

    #[error("preferred_versions must name at least one Python version")]
    NoPreferredVersions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_preferred_versions")]
    pub preferred_versions: Vec<String>,

    #[serde(default = "default_ppa")]
    pub ppa: String,

    #[serde(default = "default_core_packages")]
    pub core_packages: Vec<String>,

    #[serde(default = "default_optional_packages")]
    pub optional_packages: Vec<String>,

    #[serde(default = "default_build_packages")]
    pub pyenv_build_packages: Vec<String>,

    #[serde(default)]
    pub pyenv_root: Option<PathBuf>,

    #[serde(default)]
    pub local_bin_dir: Option<PathBuf>,

    #[serde(default)]
    pub profile_path: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub use_sudo: bool,

    #[serde(default = "default_get_pip_url")]
    pub get_pip_url: String,

    #[serde(default)]
    pub get_pip_sha256: Option<String>,

    #[serde(default = "default_pyenv_installer_url")]
    pub pyenv_installer_url: String,

    #[serde(default)]
    pub pyenv_installer_sha256: Option<String>,

    #[serde(default = "default_docker_installer_url")]
    pub docker_installer_url: String,

    #[serde(default)]
    pub docker_installer_sha256: Option<String>,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_retry_delays")]
    pub download_retry_delays_secs: Vec<u64>,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_true() -> bool {
    true
}

fn default_preferred_versions() -> Vec<String> {
    vec!["3.13".to_string(), "3.12".to_string(), "3.11".to_string()]
}

fn default_ppa() -> String {
    DEFAULT_CHANNEL.to_string()
}

fn default_core_packages() -> Vec<String> {
    ["software-properties-common", "build-essential", "curl", "ca-certificates"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_optional_packages() -> Vec<String> {
    [
        "libssl-dev",
        "libffi-dev",
        "zlib1g-dev",
        "libbz2-dev",
        "libreadline-dev",
        "libsqlite3-dev",
        "liblzma-dev",
        "libgdbm-dev",
        "tk-dev",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_get_pip_url() -> String {
    DEFAULT_GET_PIP_URL.to_string()
}

fn default_pyenv_installer_url() -> String {
    DEFAULT_PYENV_INSTALLER_URL.to_string()
}

fn default_docker_installer_url() -> String {
    DEFAULT_DOCKER_INSTALLER_URL.to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_retry_delays() -> Vec<u64> {
    vec![0]
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preferred_versions: default_preferred_versions(),
            ppa: default_ppa(),
            core_packages: default_core_packages(),
            optional_packages: default_optional_packages(),
            pyenv_build_packages: default_build_packages(),
            pyenv_root: None,
            local_bin_dir: None,
            profile_path: None,
            use_sudo: true,
            get_pip_url: default_get_pip_url(),
            get_pip_sha256: None,
            pyenv_installer_url: default_pyenv_installer_url(),
            pyenv_installer_sha256: None,
            docker_installer_url: default_docker_installer_url(),
            docker_installer_sha256: None,
            http_timeout_secs: default_http_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            download_retry_delays_secs: default_retry_delays(),
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl Settings {
    /// Load `explicit`, or the default settings file when none is given. A
    /// missing default file means default settings.
    pub fn load(explicit: Option<&Path>, paths: &HostPaths) -> Result<Self, SettingsError> {
        let default_path = paths.settings_file();
        let settings_path = explicit.unwrap_or(&default_path);

        if explicit.is_none() && !settings_path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(settings_path).map_err(|source| SettingsError::Read {
                path: settings_path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: settings_path.to_path_buf(),
            source,
        })
    }

    pub fn preferred(&self) -> Result<Vec<PythonVersion>, SettingsError> {
        if self.preferred_versions.is_empty() {
            return Err(SettingsError::NoPreferredVersions);
        }
        self.preferred_versions
            .iter()
            .map(|version| version.parse().map_err(SettingsError::from))
            .collect()
    }

    pub fn download_policy(&self) -> DownloadPolicy {
        DownloadPolicy {
            timeout: Duration::from_secs(self.http_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            retry_delays: self
                .download_retry_delays_secs
                .iter()
                .copied()
                .map(Duration::from_secs)
                .collect(),
        }
    }

    pub fn local_bin(&self, home: &Path) -> PathBuf {
        self.local_bin_dir
            .clone()
            .unwrap_or_else(|| home.join(".local").join("bin"))
    }

    pub fn pyenv_root(&self, home: &Path) -> PathBuf {
        self.pyenv_root
            .clone()
            .unwrap_or_else(|| home.join(".pyenv"))
    }

    pub fn ppa_config(&self, home: &Path, preferred: Vec<PythonVersion>) -> PpaConfig {
        PpaConfig {
            channel: self.ppa.clone(),
            packages: PackageSet {
                core: self.core_packages.clone(),
                optional: self.optional_packages.clone(),
            },
            get_pip_url: self.get_pip_url.clone(),
            get_pip_sha256: self.get_pip_sha256.clone(),
            ..PpaConfig::new(home.to_path_buf(), preferred)
        }
    }

    pub fn pyenv_config(&self) -> PyenvConfig {
        PyenvConfig {
            installer_url: self.pyenv_installer_url.clone(),
            installer_sha256: self.pyenv_installer_sha256.clone(),
            build_packages: self.pyenv_build_packages.clone(),
        }
    }

    pub fn docker_config(&self, user: Option<String>) -> DockerConfig {
        DockerConfig {
            installer_url: self.docker_installer_url.clone(),
            installer_sha256: self.docker_installer_sha256.clone(),
            user,
        }
    }
}
