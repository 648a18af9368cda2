use std::path::{Path, PathBuf};

use log::{info, warn};

use pyrig_platform::{CommandRunner, CommandSpec, HostEnvironment};

/// A command whose presence and version the verifier reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyTarget {
    pub label: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
}

pub const PYTHON_TARGETS: &[VerifyTarget] = &[
    VerifyTarget {
        label: "python",
        program: "python",
        args: &["--version"],
    },
    VerifyTarget {
        label: "pip",
        program: "pip",
        args: &["--version"],
    },
    VerifyTarget {
        label: "system python3",
        program: "python3",
        args: &["--version"],
    },
];

pub const DOCKER_TARGETS: &[VerifyTarget] = &[
    VerifyTarget {
        label: "docker",
        program: "docker",
        args: &["--version"],
    },
    VerifyTarget {
        label: "docker compose",
        program: "docker",
        args: &["compose", "version"],
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Found { path: PathBuf, version: String },
    NotFound,
    Failed { path: PathBuf, details: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub label: &'static str,
    pub probe: Probe,
}

impl VerificationResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self.probe, Probe::Found { .. })
    }
}

async fn probe(runner: &dyn CommandRunner, path: &str, home: &Path, target: &VerifyTarget) -> Probe {
    let Ok(resolved) = which::which_in(target.program, Some(path), home) else {
        return Probe::NotFound;
    };

    let spec = CommandSpec::new(resolved.display().to_string()).args(target.args.iter().copied());
    match runner.run(&spec).await {
        Ok(output) if output.success() => {
            // Old interpreters print their version on stderr.
            let text = if output.stdout.trim().is_empty() {
                output.stderr
            } else {
                output.stdout
            };
            Probe::Found {
                path: resolved,
                version: text.lines().next().unwrap_or_default().trim().to_string(),
            }
        }
        Ok(output) => Probe::Failed {
            path: resolved,
            details: output.failure_details(),
        },
        Err(error) => Probe::Failed {
            path: resolved,
            details: error.to_string(),
        },
    }
}

/// Look up each target on `PATH` as it will be once `local_bin` is on it and
/// report what answers. Nothing here fails the run.
pub async fn verify_commands(
    runner: &dyn CommandRunner,
    env: &HostEnvironment,
    local_bin: &Path,
    targets: &[VerifyTarget],
) -> Vec<VerificationResult> {
    let path = env.path_with(local_bin);
    let mut results = Vec::with_capacity(targets.len());

    for target in targets {
        let probe = probe(runner, &path, &env.home, target).await;
        match &probe {
            Probe::Found { path, version } => {
                info!("{}: {version} ({})", target.label, path.display());
            }
            Probe::NotFound => warn!("{}: not found on PATH", target.label),
            Probe::Failed { path, details } => {
                warn!("{}: {} failed: {details}", target.label, path.display());
            }
        }
        results.push(VerificationResult {
            label: target.label,
            probe,
        });
    }

    results
}
