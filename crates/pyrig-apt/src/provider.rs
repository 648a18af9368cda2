use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};

use pyrig_backend::{
    Availability, BackendError, InstallMode, PackageManager, PackageSet, PythonVersion,
    ResolvedRuntime, RuntimeProvider, ShimStyle, StepOutcome,
};
use pyrig_core::{ScriptSource, download_install_script};
use pyrig_platform::CommandSpec;

use crate::conflict::resolve_conflicts;
use crate::fallback::install_with_fallback;
use crate::manager::AptManager;
use crate::probe::probe_channel;

pub const DEFAULT_CHANNEL: &str = "ppa:deadsnakes/ppa";
pub const DEFAULT_GET_PIP_URL: &str = "https://bootstrap.pypa.io/get-pip.py";

const INTERPRETER_PATTERN: &str = "python3.1*";
const SYSTEM_PYTHON: &str = "/usr/bin/python3";

#[derive(Debug, Clone)]
pub struct PpaConfig {
    pub channel: String,
    pub preferred: Vec<PythonVersion>,
    pub packages: PackageSet,
    pub get_pip_url: String,
    pub get_pip_sha256: Option<String>,
    pub home: PathBuf,
}

impl PpaConfig {
    #[must_use]
    pub fn new(home: PathBuf, preferred: Vec<PythonVersion>) -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            preferred,
            packages: PackageSet::default(),
            get_pip_url: DEFAULT_GET_PIP_URL.to_string(),
            get_pip_sha256: None,
            home,
        }
    }
}

/// Interpreters from a Launchpad PPA, installed through apt.
pub struct PpaProvider {
    apt: AptManager,
    scripts: Arc<dyn ScriptSource>,
    config: PpaConfig,
}

impl PpaProvider {
    #[must_use]
    pub fn new(apt: AptManager, scripts: Arc<dyn ScriptSource>, config: PpaConfig) -> Self {
        Self {
            apt,
            scripts,
            config,
        }
    }

    async fn os_codename(&self) -> Option<String> {
        let output = self
            .apt
            .runner()
            .run(&CommandSpec::new("lsb_release").arg("-cs"))
            .await
            .ok()?;
        let codename = output.stdout.trim();
        (output.success() && !codename.is_empty()).then(|| codename.to_string())
    }

    /// Package name of the interpreter `/usr/bin/python3` resolves to.
    async fn system_interpreter(&self) -> Option<String> {
        let output = self
            .apt
            .runner()
            .run(&CommandSpec::new("readlink").args(["-f", SYSTEM_PYTHON]))
            .await
            .ok()?;
        if !output.success() {
            return None;
        }
        let name = Path::new(output.stdout.trim()).file_name()?.to_str()?;
        name.starts_with("python3.").then(|| name.to_string())
    }

    async fn install_distutils(&self, version: &PythonVersion) {
        let package = version.companion_package("distutils");
        match self.apt.availability(&package).await {
            Availability::Unavailable => {
                debug!("{package} is not published for {version}, skipping");
            }
            Availability::Available | Availability::Unknown => {
                if let Err(error) = self
                    .apt
                    .install(std::slice::from_ref(&package), InstallMode::Plain)
                    .await
                {
                    warn!("Could not install {package}: {error}");
                }
            }
        }
    }
}

#[async_trait]
impl RuntimeProvider for PpaProvider {
    fn name(&self) -> &'static str {
        "ppa"
    }

    fn display_name(&self) -> &'static str {
        "deadsnakes PPA"
    }

    fn dependencies(&self) -> PackageSet {
        self.config.packages.clone()
    }

    async fn prepare(&self) -> StepOutcome {
        let channel = &self.config.channel;
        info!("Enabling {channel}");

        if let Err(error) = self.apt.add_channel(channel).await {
            return StepOutcome::Fatal(error);
        }
        if let Err(error) = self.apt.refresh_index().await {
            return StepOutcome::Fatal(error);
        }

        let probe = probe_channel(&self.apt, &self.config.preferred).await;
        if probe.all_unavailable() {
            let release = self
                .os_codename()
                .await
                .map_or_else(|| "this OS release".to_string(), |c| format!("'{c}'"));
            return StepOutcome::Fatal(BackendError::channel(
                channel.clone(),
                format!(
                    "it has no Python packages for {release}. Use `pyrig pyenv` to build from source, or upgrade the OS"
                ),
            ));
        }

        if probe.available().next().is_none() {
            let unknown: Vec<String> = probe.unknown().map(PythonVersion::package_name).collect();
            return StepOutcome::SkippedWarning(format!(
                "could not confirm that {channel} publishes {}",
                unknown.join(", ")
            ));
        }

        StepOutcome::Success
    }

    async fn resolve_conflicts(&self) -> StepOutcome {
        let targets: Vec<String> = self
            .config
            .preferred
            .iter()
            .map(PythonVersion::package_name)
            .collect();
        let system = self.system_interpreter().await;
        resolve_conflicts(&self.apt, INTERPRETER_PATTERN, &targets, system.as_deref()).await
    }

    async fn resolve_version(
        &self,
        preferred: &[PythonVersion],
    ) -> Result<PythonVersion, BackendError> {
        let mut first_unknown = None;

        for candidate in preferred {
            match self.apt.availability(&candidate.package_name()).await {
                Availability::Available => {
                    info!("Selected Python {candidate}");
                    return Ok(candidate.clone());
                }
                Availability::Unknown if first_unknown.is_none() => {
                    first_unknown = Some(candidate.clone());
                }
                Availability::Unknown | Availability::Unavailable => {}
            }
        }

        if let Some(candidate) = first_unknown {
            warn!("No candidate is confirmed installable, trying Python {candidate} anyway");
            return Ok(candidate);
        }

        Err(BackendError::NoInstallableVersion {
            candidates: preferred.iter().map(PythonVersion::package_name).collect(),
        })
    }

    async fn install(&self, version: &PythonVersion) -> Result<ResolvedRuntime, BackendError> {
        let packages = vec![
            version.package_name(),
            version.companion_package("dev"),
            version.companion_package("venv"),
        ];
        install_with_fallback(&self.apt, &version.package_name(), &packages).await?;

        let series = version.series_name();
        Ok(ResolvedRuntime {
            version: version.clone(),
            interpreter: PathBuf::from("/usr/bin").join(version.package_name()),
            pip: self
                .config
                .home
                .join(".local")
                .join("bin")
                .join(format!("pip{series}")),
            style: ShimStyle::Symlink,
        })
    }

    async fn bootstrap_pip(&self, runtime: &ResolvedRuntime) -> StepOutcome {
        self.install_distutils(&runtime.version).await;

        let script = match download_install_script(
            self.scripts.as_ref(),
            &self.config.get_pip_url,
            self.config.get_pip_sha256.as_deref(),
        )
        .await
        {
            Ok(script) => script,
            Err(error) => {
                return StepOutcome::Fatal(BackendError::bootstrap("pip", error.to_string()));
            }
        };

        let spec = CommandSpec::new(runtime.interpreter.display().to_string())
            .arg(script.path().display().to_string())
            .arg("--user");
        let result = self.apt.runner().run(&spec).await;
        drop(script);

        match result {
            Ok(output) if output.success() => StepOutcome::Success,
            Ok(output) => StepOutcome::Fatal(BackendError::bootstrap(
                "pip",
                output.failure_details(),
            )),
            Err(error) => StepOutcome::Fatal(BackendError::bootstrap("pip", error.to_string())),
        }
    }
}
