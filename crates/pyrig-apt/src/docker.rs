use std::sync::Arc;

use log::{info, warn};

use pyrig_backend::{BackendError, StepOutcome};
use pyrig_core::{ScriptSource, download_install_script};
use pyrig_platform::CommandSpec;

use crate::fallback::install_with_fallback;
use crate::manager::AptManager;

pub const DEFAULT_DOCKER_INSTALLER_URL: &str = "https://get.docker.com";
const COMPOSE_PACKAGE: &str = "docker-compose-plugin";
const DOCKER_GROUP: &str = "docker";

#[derive(Debug, Clone)]
pub struct DockerConfig {
    pub installer_url: String,
    pub installer_sha256: Option<String>,
    pub user: Option<String>,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            installer_url: DEFAULT_DOCKER_INSTALLER_URL.to_string(),
            installer_sha256: None,
            user: None,
        }
    }
}

/// Docker Engine via the upstream convenience script, plus the Compose
/// plugin from the Docker apt repository that script configures.
pub struct DockerInstaller {
    apt: AptManager,
    scripts: Arc<dyn ScriptSource>,
    config: DockerConfig,
}

impl DockerInstaller {
    #[must_use]
    pub fn new(apt: AptManager, scripts: Arc<dyn ScriptSource>, config: DockerConfig) -> Self {
        Self {
            apt,
            scripts,
            config,
        }
    }

    async fn engine_present(&self) -> bool {
        self.apt
            .runner()
            .run(&CommandSpec::new("docker").arg("--version"))
            .await
            .is_ok_and(|output| output.success())
    }

    /// Run the convenience installer unless `docker` already works.
    ///
    /// # Errors
    /// Returns a bootstrap error when the script cannot be downloaded or exits
    /// unsuccessfully.
    pub async fn install_engine(&self) -> Result<(), BackendError> {
        if self.engine_present().await {
            info!("Docker Engine is already installed");
            return Ok(());
        }

        let script = download_install_script(
            self.scripts.as_ref(),
            &self.config.installer_url,
            self.config.installer_sha256.as_deref(),
        )
        .await
        .map_err(|error| BackendError::bootstrap("docker", error.to_string()))?;

        let spec = self
            .apt
            .privileged("sh")
            .arg(script.path().display().to_string());
        let output = self.apt.runner().run(&spec).await;
        drop(script);

        match output {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => Err(BackendError::bootstrap("docker", output.failure_details())),
            Err(error) => Err(BackendError::bootstrap("docker", error.to_string())),
        }
    }

    /// # Errors
    /// Returns [`BackendError::EscalationExhausted`] when every install
    /// strategy fails.
    pub async fn install_compose(&self) -> Result<(), BackendError> {
        let names = [COMPOSE_PACKAGE.to_string()];
        install_with_fallback(&self.apt, COMPOSE_PACKAGE, &names)
            .await
            .map(|_| ())
    }

    /// Let the invoking user talk to the daemon without sudo.
    pub async fn add_user_to_group(&self) -> StepOutcome {
        let Some(user) = self.config.user.as_deref() else {
            return StepOutcome::SkippedWarning(
                "could not determine the current user; add yourself to the docker group manually"
                    .to_string(),
            );
        };

        let spec = self
            .apt
            .privileged("usermod")
            .args(["-aG", DOCKER_GROUP, user]);
        match self.apt.runner().run(&spec).await {
            Ok(output) if output.success() => {
                info!("Added {user} to the {DOCKER_GROUP} group; log out and back in for it to apply");
                StepOutcome::Success
            }
            Ok(output) => {
                warn!("`{spec}` failed: {}", output.failure_details());
                StepOutcome::SkippedWarning(format!(
                    "could not add {user} to the {DOCKER_GROUP} group: {}",
                    output.failure_details()
                ))
            }
            Err(error) => StepOutcome::SkippedWarning(format!(
                "could not add {user} to the {DOCKER_GROUP} group: {error}"
            )),
        }
    }
}
