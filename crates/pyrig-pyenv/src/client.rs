use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use pyrig_backend::PythonVersion;
use pyrig_platform::{CommandRunner, CommandSpec};

use crate::error::PyenvError;
use crate::version::parse_install_list;

/// Runs the pyenv checkout under `root` directly, so it works before the
/// user's shell has been taught about pyenv.
#[derive(Clone)]
pub struct PyenvClient {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
}

impl PyenvClient {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, root: PathBuf) -> Self {
        Self { runner, root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    #[must_use]
    pub fn executable(&self) -> PathBuf {
        self.root.join("bin").join("pyenv")
    }

    #[must_use]
    pub fn shims_dir(&self) -> PathBuf {
        self.root.join("shims")
    }

    fn command(&self, args: &[&str]) -> CommandSpec {
        CommandSpec::new(self.executable().display().to_string())
            .env("PYENV_ROOT", self.root.display().to_string())
            .args(args.iter().copied())
    }

    async fn execute(&self, spec: CommandSpec) -> Result<String, PyenvError> {
        let output = self.runner.run(&spec).await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(PyenvError::CommandFailed {
                command: spec.to_string(),
                stderr: output.failure_details(),
            })
        }
    }

    pub async fn is_installed(&self) -> bool {
        match self.execute(self.command(&["--version"])).await {
            Ok(version) => {
                debug!("Found {}", version.trim());
                true
            }
            Err(error) => {
                debug!("pyenv not usable at {}: {error}", self.root.display());
                false
            }
        }
    }

    /// # Errors
    /// Returns an error if `pyenv install --list` fails.
    pub async fn list_available(&self) -> Result<Vec<PythonVersion>, PyenvError> {
        let output = self.execute(self.command(&["install", "--list"])).await?;
        Ok(parse_install_list(&output))
    }

    /// Build `version` from source; a no-op when it is already installed.
    ///
    /// # Errors
    /// Returns an error if the build fails.
    pub async fn install(&self, version: &PythonVersion) -> Result<(), PyenvError> {
        let version = version.to_string();
        self.execute(self.command(&["install", "-s", &version]).streamed())
            .await
            .map(|_| ())
    }

    /// # Errors
    /// Returns an error if `pyenv global` rejects the version.
    pub async fn set_global(&self, version: &PythonVersion) -> Result<(), PyenvError> {
        let version = version.to_string();
        self.execute(self.command(&["global", &version]))
            .await
            .map(|_| ())
    }

    /// # Errors
    /// Returns an error if pip cannot upgrade itself.
    pub async fn upgrade_pip(&self) -> Result<(), PyenvError> {
        self.execute(self.command(&[
            "exec", "python", "-m", "pip", "install", "--upgrade", "pip",
        ]))
        .await
        .map(|_| ())
    }
}
