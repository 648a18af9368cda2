use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, warn};

use pyrig_backend::{
    Availability, BackendError, InstallMode, InstalledPackage, PackageManager,
};
use pyrig_platform::{CommandOutput, CommandRunner, CommandSpec};

/// Rows from `apt-cache search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchRows {
    Names(Vec<String>),
    /// Output did not look like `name - description` rows.
    Unrecognized,
}

/// apt/dpkg driven through a [`CommandRunner`].
#[derive(Clone)]
pub struct AptManager {
    runner: Arc<dyn CommandRunner>,
    use_sudo: bool,
}

impl AptManager {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            use_sudo: true,
        }
    }

    #[must_use]
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    #[must_use]
    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    pub(crate) fn privileged(&self, program: &str) -> CommandSpec {
        CommandSpec::new(program).elevated(self.use_sudo)
    }

    async fn execute(&self, spec: CommandSpec) -> Result<CommandOutput, BackendError> {
        let output = self.runner.run(&spec).await?;
        if output.success() {
            Ok(output)
        } else {
            let details = output.failure_details();
            error!("`{spec}` failed: {details}");
            Err(BackendError::command_failed(spec.to_string(), details))
        }
    }

    /// Package names matching `pattern` according to `apt-cache search`.
    pub async fn search_names(&self, pattern: &str) -> SearchRows {
        let spec = CommandSpec::new("apt-cache").args(["search", "--names-only", pattern]);
        match self.runner.run(&spec).await {
            Ok(output) if output.success() => parse_search_rows(&output.stdout),
            Ok(output) => {
                debug!("`{spec}` failed: {}", output.failure_details());
                SearchRows::Unrecognized
            }
            Err(error) => {
                debug!("`{spec}` could not run: {error}");
                SearchRows::Unrecognized
            }
        }
    }
}

#[async_trait]
impl PackageManager for AptManager {
    fn name(&self) -> &'static str {
        "apt"
    }

    async fn refresh_index(&self) -> Result<(), BackendError> {
        self.execute(self.privileged("apt-get").arg("update"))
            .await
            .map(|_| ())
            .map_err(|error| BackendError::IndexRefresh {
                details: error.to_string(),
            })
    }

    async fn install(&self, packages: &[String], mode: InstallMode) -> Result<(), BackendError> {
        let mut spec = self.privileged("apt-get").args(["install", "-y"]);
        if mode == InstallMode::Reinstall {
            spec = spec.arg("--reinstall");
        }
        self.execute(spec.args(packages.iter().cloned()))
            .await
            .map(|_| ())
    }

    async fn availability(&self, package: &str) -> Availability {
        let spec = CommandSpec::new("apt-cache").args(["policy", package]);
        match self.runner.run(&spec).await {
            Ok(output) if output.success() => parse_policy(&output.stdout),
            Ok(output) => {
                debug!("`{spec}` failed: {}", output.failure_details());
                Availability::Unknown
            }
            Err(error) => {
                debug!("`{spec}` could not run: {error}");
                Availability::Unknown
            }
        }
    }

    async fn add_channel(&self, channel: &str) -> Result<(), BackendError> {
        self.execute(self.privileged("add-apt-repository").args(["-y", channel]))
            .await
            .map(|_| ())
            .map_err(|error| BackendError::channel(channel, error.to_string()))
    }

    async fn repair(&self) -> Result<(), BackendError> {
        // fix-broken runs even when reconfigure fails.
        if let Err(error) = self
            .execute(self.privileged("dpkg").args(["--configure", "-a"]))
            .await
        {
            warn!("Continuing with fix-broken after reconfigure failed: {error}");
        }
        self.execute(self.privileged("apt-get").args(["install", "-f", "-y"]))
            .await
            .map(|_| ())
    }

    async fn purge(&self, packages: &[String]) -> Result<(), BackendError> {
        self.execute(
            self.privileged("apt-get")
                .args(["remove", "--purge", "-y"])
                .args(packages.iter().cloned()),
        )
        .await
        .map(|_| ())
    }

    async fn clean_orphans(&self) -> Result<(), BackendError> {
        self.execute(self.privileged("apt-get").args(["autoremove", "-y"]))
            .await?;
        self.execute(self.privileged("apt-get").arg("clean"))
            .await?;
        Ok(())
    }

    async fn installed(&self, pattern: &str) -> Result<Vec<InstalledPackage>, BackendError> {
        let spec = CommandSpec::new("dpkg-query").args([
            "-W",
            "-f=${Package}\\t${Version}\\t${Status}\\n",
            pattern,
        ]);
        let output = self.runner.run(&spec).await?;

        // dpkg-query exits 1 when nothing matches the pattern.
        if !output.success() && output.stdout.trim().is_empty() {
            debug!("No installed packages match {pattern}");
            return Ok(Vec::new());
        }

        Ok(parse_installed(&output.stdout))
    }
}

fn parse_policy(stdout: &str) -> Availability {
    // apt-cache policy prints nothing at all for names it has never heard of.
    if stdout.trim().is_empty() {
        return Availability::Unavailable;
    }

    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("Candidate:"))
        .map_or(Availability::Unknown, |candidate| {
            if candidate.trim() == "(none)" {
                Availability::Unavailable
            } else {
                Availability::Available
            }
        })
}

fn parse_search_rows(stdout: &str) -> SearchRows {
    let mut names = Vec::new();
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.split_once(" - ") {
            Some((name, _)) if !name.contains(char::is_whitespace) => {
                names.push(name.to_string());
            }
            _ => return SearchRows::Unrecognized,
        }
    }
    SearchRows::Names(names)
}

fn parse_installed(stdout: &str) -> Vec<InstalledPackage> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let name = fields.next()?.trim();
            let version = fields.next()?.trim();
            let status = fields.next()?.trim();
            // Purged packages linger in the database with an empty version.
            if name.is_empty() || version.is_empty() {
                return None;
            }
            Some(InstalledPackage {
                name: name.to_string(),
                version: version.to_string(),
                status: status.to_string(),
            })
        })
        .collect()
}
