use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;

use pyrig_apt::{AptManager, DockerInstaller, PpaProvider};
use pyrig_backend::{
    BackendError, PackageManager, ProfileInit, PythonVersion, RuntimeProvider, StepOutcome,
};
use pyrig_core::{RunReport, ScriptSource, ensure_unprivileged, install_core, install_optional};
use pyrig_platform::{CommandRunner, HostEnvironment};
use pyrig_pyenv::{PyenvClient, PyenvProvider};
use pyrig_shell::{
    ConfigError, DOCKER_TARGETS, PYTHON_TARGETS, PathUpdate, ShellConfig, ShellType, VerifyTarget,
    ensure_profile_init, install_shims, update_profile_path, verify_commands,
};

use crate::cli::Command;
use crate::settings::Settings;

const DOCKER_CORE_PACKAGES: [&str; 2] = ["ca-certificates", "curl"];

/// Everything a run touches on the host.
pub struct Context {
    pub runner: Arc<dyn CommandRunner>,
    pub scripts: Arc<dyn ScriptSource>,
    pub env: HostEnvironment,
    pub settings: Settings,
    pub preferred: Vec<PythonVersion>,
}

impl Context {
    fn apt(&self) -> AptManager {
        AptManager::new(self.runner.clone()).with_sudo(self.settings.use_sudo)
    }

    fn local_bin(&self) -> PathBuf {
        self.settings.local_bin(&self.env.home)
    }

    fn shell_config(&self) -> Result<ShellConfig, ConfigError> {
        let shell_type = ShellType::from_shell_path(self.env.shell.as_deref());
        let path = self
            .settings
            .profile_path
            .clone()
            .unwrap_or_else(|| shell_type.profile_path(&self.env.home));
        ShellConfig::load(shell_type, path)
    }
}

/// Run `command`'s steps in order, stopping at the first fatal outcome.
pub async fn run(command: Command, ctx: &Context) -> RunReport {
    info!("Host: {}", ctx.env.kind.display_name());

    let mut report = RunReport::new();
    match command {
        Command::Ppa => {
            let provider = PpaProvider::new(
                ctx.apt(),
                ctx.scripts.clone(),
                ctx.settings.ppa_config(&ctx.env.home, ctx.preferred.clone()),
            );
            python_flow(&provider, ctx, &mut report).await;
        }
        Command::Pyenv => {
            let client =
                PyenvClient::new(ctx.runner.clone(), ctx.settings.pyenv_root(&ctx.env.home));
            let provider =
                PyenvProvider::new(client, ctx.scripts.clone(), ctx.settings.pyenv_config());
            python_flow(&provider, ctx, &mut report).await;
        }
        Command::Docker => docker_flow(ctx, &mut report).await,
    }

    report.log_summary();
    report
}

/// Steps shared by every flow: privilege check, index refresh and mandatory
/// packages. Returns `false` once one of them is fatal.
async fn base_steps(
    ctx: &Context,
    apt: &AptManager,
    core: &[String],
    report: &mut RunReport,
) -> bool {
    report.record("preflight", ensure_unprivileged(ctx.runner.as_ref()).await.into())
        && report.record("index refresh", apt.refresh_index().await.into())
        && report.record("core packages", install_core(apt, core).await.into())
}

async fn python_flow(provider: &dyn RuntimeProvider, ctx: &Context, report: &mut RunReport) {
    let apt = ctx.apt();
    let packages = provider.dependencies();
    info!("Installing Python via {}", provider.display_name());

    if !base_steps(ctx, &apt, &packages.core, report).await {
        return;
    }

    let optional = install_optional(&apt, &packages.optional).await;
    report.record("optional packages", with_wsl_hint(optional, &ctx.env));

    if !report.record("prepare", provider.prepare().await) {
        return;
    }

    if let Some(init) = provider.profile_init() {
        report.record("profile init", profile_init(ctx, &init));
    }

    if !report.record("conflict cleanup", provider.resolve_conflicts().await) {
        return;
    }

    let version = match provider.resolve_version(&ctx.preferred).await {
        Ok(version) => {
            report.record("version", StepOutcome::Success);
            version
        }
        Err(error) => {
            report.record("version", StepOutcome::Fatal(error));
            return;
        }
    };

    let runtime = match provider.install(&version).await {
        Ok(runtime) => {
            report.record("install", StepOutcome::Success);
            runtime
        }
        Err(error) => {
            report.record("install", StepOutcome::Fatal(error));
            return;
        }
    };

    if !report.record("pip", provider.bootstrap_pip(&runtime).await) {
        return;
    }

    let local_bin = ctx.local_bin();
    let shims = install_shims(&local_bin, &runtime)
        .map(|_| ())
        .map_err(|error| BackendError::Shim {
            details: error.to_string(),
        });
    if !report.record("shims", shims.into()) {
        return;
    }

    report.record("profile PATH", profile_path(ctx, &local_bin));
    verify(ctx, PYTHON_TARGETS, report).await;
}

async fn docker_flow(ctx: &Context, report: &mut RunReport) {
    let apt = ctx.apt();
    let core: Vec<String> = DOCKER_CORE_PACKAGES.iter().map(ToString::to_string).collect();

    if !base_steps(ctx, &apt, &core, report).await {
        return;
    }

    let docker = DockerInstaller::new(
        apt,
        ctx.scripts.clone(),
        ctx.settings.docker_config(ctx.env.user.clone()),
    );

    if !report.record("docker engine", docker.install_engine().await.into()) {
        return;
    }
    if !report.record("compose plugin", docker.install_compose().await.into()) {
        return;
    }
    report.record("docker group", docker.add_user_to_group().await);
    verify(ctx, DOCKER_TARGETS, report).await;
}

fn with_wsl_hint(outcome: StepOutcome, env: &HostEnvironment) -> StepOutcome {
    match outcome {
        StepOutcome::SkippedWarning(reason) if env.kind.is_wsl() => StepOutcome::SkippedWarning(
            format!("{reason} (common on minimal WSL images; the install continues without them)"),
        ),
        other => other,
    }
}

fn profile_init(ctx: &Context, init: &ProfileInit) -> StepOutcome {
    match ctx
        .shell_config()
        .and_then(|mut config| ensure_profile_init(&mut config, init))
    {
        Ok(_) => StepOutcome::Success,
        Err(error) => StepOutcome::SkippedWarning(format!(
            "could not add {} initialization to your shell profile: {error}",
            init.label
        )),
    }
}

fn profile_path(ctx: &Context, local_bin: &Path) -> StepOutcome {
    let update = ctx
        .shell_config()
        .and_then(|mut config| update_profile_path(&mut config, &ctx.env, local_bin));
    match update {
        Ok(PathUpdate::Added { .. } | PathUpdate::AlreadyInPath) => StepOutcome::Success,
        Ok(PathUpdate::AlreadyInProfile) => {
            info!(
                "{} is set up in your profile; open a new shell to use it",
                local_bin.display()
            );
            StepOutcome::Success
        }
        Err(error) => StepOutcome::SkippedWarning(format!(
            "could not add {} to PATH: {error}",
            local_bin.display()
        )),
    }
}

async fn verify(ctx: &Context, targets: &[VerifyTarget], report: &mut RunReport) {
    let results =
        verify_commands(ctx.runner.as_ref(), &ctx.env, &ctx.local_bin(), targets).await;
    let missing: Vec<&str> = results
        .iter()
        .filter(|result| !result.is_ok())
        .map(|result| result.label)
        .collect();

    let outcome = if missing.is_empty() {
        StepOutcome::Success
    } else {
        StepOutcome::SkippedWarning(format!("not working yet: {}", missing.join(", ")))
    };
    report.record("verify", outcome);
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pyrig_apt::DEFAULT_GET_PIP_URL;
    use pyrig_core::fakes::StaticScriptSource;
    use pyrig_platform::fakes::ScriptedRunner;
    use pyrig_platform::{CommandOutput, HostKind};

    use super::*;

    const POLICY_312: &str =
        "python3.12:\n  Installed: (none)\n  Candidate: 3.12.7-1+jammy1\n  Version table:\n";

    fn context(
        home: &Path,
        runner: &Arc<ScriptedRunner>,
        scripts: StaticScriptSource,
        settings: Settings,
    ) -> Context {
        let preferred = settings.preferred().expect("valid preferred versions");
        Context {
            runner: runner.clone(),
            scripts: Arc::new(scripts),
            env: HostEnvironment {
                kind: HostKind::Native,
                home: home.to_path_buf(),
                path: "/usr/bin:/bin".to_string(),
                shell: Some("/bin/bash".to_string()),
                user: Some("dev".to_string()),
            },
            settings,
            preferred,
        }
    }

    fn unprivileged() -> ScriptedRunner {
        ScriptedRunner::new().on("id -u", CommandOutput::ok("1000\n"))
    }

    #[tokio::test]
    async fn root_is_refused_before_anything_runs() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let runner = Arc::new(ScriptedRunner::new().on("id -u", CommandOutput::ok("0\n")));
        let ctx = context(temp_dir.path(), &runner, StaticScriptSource::new(), Settings::default());

        let report = run(Command::Ppa, &ctx).await;

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.fatal().map(|(_, e)| e), Some(&BackendError::Privilege));
        assert_eq!(runner.calls(), vec!["id -u".to_string()]);
    }

    #[tokio::test]
    async fn mandatory_failure_aborts_before_optional_packages() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let runner = Arc::new(unprivileged().on(
            "sudo apt-get install -y build-essential",
            CommandOutput::failed(100, "E: Unable to locate package build-essential"),
        ));
        let settings = Settings {
            core_packages: vec!["build-essential".to_string()],
            optional_packages: vec!["libgdbm-dev".to_string()],
            ..Settings::default()
        };
        let ctx = context(temp_dir.path(), &runner, StaticScriptSource::new(), settings);

        let report = run(Command::Ppa, &ctx).await;

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.fatal().map(|(step, _)| step), Some("core packages"));
        assert!(!runner.was_called("apt-cache policy libgdbm-dev"));
        assert!(!runner.was_called("sudo apt-get install -y libgdbm-dev"));
        assert!(!runner.was_called("sudo add-apt-repository"));
    }

    #[tokio::test]
    async fn missing_optional_packages_never_fail_the_run_step() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let runner = Arc::new(unprivileged());
        let settings = Settings {
            optional_packages: vec!["libgdbm-dev".to_string()],
            ..Settings::default()
        };
        let ctx = context(temp_dir.path(), &runner, StaticScriptSource::new(), settings);

        let report = run(Command::Ppa, &ctx).await;

        assert!(matches!(
            report.outcome("optional packages"),
            Some(StepOutcome::SkippedWarning(_))
        ));
        assert!(!runner.was_called("sudo apt-get install -y libgdbm-dev"));
    }

    #[tokio::test]
    async fn empty_channel_exits_before_installing_python() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let runner = Arc::new(unprivileged().on("lsb_release -cs", CommandOutput::ok("focal\n")));
        let ctx = context(temp_dir.path(), &runner, StaticScriptSource::new(), Settings::default());

        let report = run(Command::Ppa, &ctx).await;

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.fatal().map(|(step, _)| step), Some("prepare"));
        assert!(runner.was_called("sudo add-apt-repository -y ppa:deadsnakes/ppa"));
        assert!(!runner.was_called("sudo apt-get install -y python3"));
        assert!(!runner.was_called("sudo apt-get remove"));
        assert!(!temp_dir.path().join(".local/bin").exists());
    }

    #[tokio::test]
    async fn ppa_flow_installs_shims_and_profile_line() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let runner = Arc::new(
            unprivileged()
                .on(
                    "apt-cache search",
                    CommandOutput::ok("python3.12 - Interactive high-level object-oriented language\n"),
                )
                .on("apt-cache policy python3.12-distutils", CommandOutput::ok(""))
                .on("apt-cache policy python3.12", CommandOutput::ok(POLICY_312))
                .on("dpkg-query -W", CommandOutput::failed(1, "")),
        );
        let scripts = StaticScriptSource::new().with_script(DEFAULT_GET_PIP_URL, "print('pip')\n");
        let settings = Settings {
            optional_packages: vec![],
            ..Settings::default()
        };
        let ctx = context(temp_dir.path(), &runner, scripts, settings);

        let report = run(Command::Ppa, &ctx).await;

        assert_eq!(report.exit_code(), 0);
        assert_eq!(
            report.steps(),
            vec![
                "preflight",
                "index refresh",
                "core packages",
                "optional packages",
                "prepare",
                "conflict cleanup",
                "version",
                "install",
                "pip",
                "shims",
                "profile PATH",
                "verify",
            ]
        );
        assert!(runner.was_called("sudo apt-get install -y python3.12 python3.12-dev python3.12-venv"));
        let bin = temp_dir.path().join(".local/bin");
        assert_eq!(
            std::fs::read_link(bin.join("python")).expect("python shim"),
            PathBuf::from("/usr/bin/python3.12")
        );
        let profile =
            std::fs::read_to_string(temp_dir.path().join(".bashrc")).expect("profile written");
        assert!(profile.contains("export PATH=\"$HOME/.local/bin:$PATH\""));
    }

    #[tokio::test]
    async fn docker_group_failure_is_only_a_warning() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let runner = Arc::new(
            unprivileged()
                .on("docker --version", CommandOutput::ok("Docker version 27.3.1\n"))
                .on("sudo usermod", CommandOutput::failed(6, "group 'docker' does not exist")),
        );
        let ctx = context(temp_dir.path(), &runner, StaticScriptSource::new(), Settings::default());

        let report = run(Command::Docker, &ctx).await;

        assert_eq!(report.exit_code(), 0);
        assert!(runner.was_called("sudo apt-get install -y ca-certificates curl"));
        assert!(runner.was_called("sudo apt-get install -y docker-compose-plugin"));
        assert!(matches!(
            report.outcome("docker group"),
            Some(StepOutcome::SkippedWarning(_))
        ));
    }
}
