use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use pyrig_backend::{
    BackendError, PackageSet, ProfileInit, PythonVersion, ResolvedRuntime, RuntimeProvider,
    ShimStyle, StepOutcome,
};
use pyrig_core::{ScriptSource, download_install_script};
use pyrig_platform::CommandSpec;

use crate::client::PyenvClient;
use crate::version::newest_patch;

pub const DEFAULT_PYENV_INSTALLER_URL: &str = "https://pyenv.run";

/// Headers and tools CPython's configure script needs on Ubuntu.
#[must_use]
pub fn default_build_packages() -> Vec<String> {
    [
        "build-essential",
        "curl",
        "git",
        "libbz2-dev",
        "libffi-dev",
        "liblzma-dev",
        "libncursesw5-dev",
        "libreadline-dev",
        "libsqlite3-dev",
        "libssl-dev",
        "libxml2-dev",
        "libxmlsec1-dev",
        "tk-dev",
        "xz-utils",
        "zlib1g-dev",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone)]
pub struct PyenvConfig {
    pub installer_url: String,
    pub installer_sha256: Option<String>,
    pub build_packages: Vec<String>,
}

impl Default for PyenvConfig {
    fn default() -> Self {
        Self {
            installer_url: DEFAULT_PYENV_INSTALLER_URL.to_string(),
            installer_sha256: None,
            build_packages: default_build_packages(),
        }
    }
}

/// Interpreters compiled from source by pyenv.
pub struct PyenvProvider {
    client: PyenvClient,
    scripts: Arc<dyn ScriptSource>,
    config: PyenvConfig,
}

impl PyenvProvider {
    #[must_use]
    pub fn new(client: PyenvClient, scripts: Arc<dyn ScriptSource>, config: PyenvConfig) -> Self {
        Self {
            client,
            scripts,
            config,
        }
    }

    fn root_display(&self) -> String {
        self.client.root().display().to_string()
    }

    fn init_lines(&self) -> Vec<String> {
        vec![
            format!("export PYENV_ROOT=\"{}\"", self.root_display()),
            "export PATH=\"$PYENV_ROOT/bin:$PATH\"".to_string(),
            "eval \"$(pyenv init -)\"".to_string(),
        ]
    }

    async fn run_installer(&self) -> Result<(), BackendError> {
        let script = download_install_script(
            self.scripts.as_ref(),
            &self.config.installer_url,
            self.config.installer_sha256.as_deref(),
        )
        .await
        .map_err(|error| BackendError::bootstrap("pyenv", error.to_string()))?;

        let spec = CommandSpec::new("bash")
            .arg(script.path().display().to_string())
            .env("PYENV_ROOT", self.root_display())
            .streamed();
        let output = self.client.runner().run(&spec).await;
        drop(script);

        match output {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => Err(BackendError::bootstrap("pyenv", output.failure_details())),
            Err(error) => Err(BackendError::bootstrap("pyenv", error.to_string())),
        }
    }
}

#[async_trait]
impl RuntimeProvider for PyenvProvider {
    fn name(&self) -> &'static str {
        "pyenv"
    }

    fn display_name(&self) -> &'static str {
        "pyenv (source build)"
    }

    fn dependencies(&self) -> PackageSet {
        PackageSet {
            core: self.config.build_packages.clone(),
            optional: Vec::new(),
        }
    }

    fn profile_init(&self) -> Option<ProfileInit> {
        Some(ProfileInit {
            marker: "pyenv init",
            label: "pyenv",
            command: self.init_lines().join("\n"),
        })
    }

    async fn prepare(&self) -> StepOutcome {
        if self.client.is_installed().await {
            info!("pyenv is already installed in {}", self.root_display());
            return StepOutcome::Success;
        }

        info!("Installing pyenv into {}", self.root_display());
        if let Err(error) = self.run_installer().await {
            return StepOutcome::Fatal(error);
        }

        if self.client.is_installed().await {
            StepOutcome::Success
        } else {
            StepOutcome::Fatal(BackendError::bootstrap(
                "pyenv",
                format!(
                    "the installer finished but {} does not run",
                    self.client.executable().display()
                ),
            ))
        }
    }

    async fn resolve_version(
        &self,
        preferred: &[PythonVersion],
    ) -> Result<PythonVersion, BackendError> {
        let available = self.client.list_available().await?;

        for candidate in preferred {
            let resolved = if candidate.patch.is_some() {
                available.iter().find(|version| *version == candidate)
            } else {
                newest_patch(&available, candidate)
            };
            if let Some(version) = resolved {
                info!("Selected Python {version}");
                return Ok(version.clone());
            }
        }

        Err(BackendError::NoInstallableVersion {
            candidates: preferred.iter().map(ToString::to_string).collect(),
        })
    }

    async fn install(&self, version: &PythonVersion) -> Result<ResolvedRuntime, BackendError> {
        info!("Building Python {version}, this can take several minutes");
        self.client.install(version).await?;
        self.client.set_global(version).await?;

        let shims = self.client.shims_dir();
        Ok(ResolvedRuntime {
            version: version.clone(),
            interpreter: shims.join("python"),
            pip: shims.join("pip"),
            style: ShimStyle::Wrapper {
                preamble: self.init_lines(),
            },
        })
    }

    async fn bootstrap_pip(&self, _runtime: &ResolvedRuntime) -> StepOutcome {
        match self.client.upgrade_pip().await {
            Ok(()) => StepOutcome::Success,
            Err(error) => StepOutcome::Fatal(BackendError::bootstrap("pip", error.to_string())),
        }
    }
}
