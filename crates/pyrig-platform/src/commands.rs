use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, info, trace};
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    #[error("failed to spawn `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("`{command}` was terminated by a signal")]
    Signalled { command: String },
}

/// A single external command invocation, described independently of how it
/// is executed so that fakes can match on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub elevated: bool,
    pub stream_output: bool,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            elevated: false,
            stream_output: false,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run through `sudo` when `elevated` is true.
    #[must_use]
    pub fn elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    /// Let the child write straight to the terminal instead of capturing.
    #[must_use]
    pub fn streamed(mut self) -> Self {
        self.stream_output = true;
        self
    }

    fn build(&self) -> Command {
        // Keep debconf from prompting.
        let noninteractive = ("DEBIAN_FRONTEND", "noninteractive");

        let mut cmd = if self.elevated {
            // sudo resets the environment, so variables travel as VAR=value.
            let mut cmd = Command::new("sudo");
            cmd.arg(format!("{}={}", noninteractive.0, noninteractive.1));
            for (key, value) in &self.env {
                cmd.arg(format!("{key}={value}"));
            }
            cmd.arg(&self.program);
            cmd
        } else {
            let mut cmd = Command::new(&self.program);
            cmd.env(noninteractive.0, noninteractive.1);
            for (key, value) in &self.env {
                cmd.env(key, value);
            }
            cmd
        };
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        if self.stream_output {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elevated {
            write!(f, "sudo ")?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    #[must_use]
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Trimmed stderr, or a generic message when the command printed nothing.
    #[must_use]
    pub fn failure_details(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            match self.code {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by a signal".to_string(),
            }
        } else {
            stderr.to_string()
        }
    }
}

/// Handle to the host's process table. Every step talks to the outside world
/// through this trait so that runs can be replayed against a fake.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunnerError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        info!("Running: {spec}");

        let mut cmd = spec.build();
        let output = cmd.output().await.map_err(|e| RunnerError::Spawn {
            command: spec.to_string(),
            message: e.to_string(),
        })?;

        debug!("`{}` exit status: {:?}", spec.program, output.status);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stdout.is_empty() {
            trace!("stdout: {stdout}");
        }
        if !stderr.is_empty() {
            trace!("stderr: {stderr}");
        }

        let code = output.status.code();
        if code.is_none() {
            return Err(RunnerError::Signalled {
                command: spec.to_string(),
            });
        }

        Ok(CommandOutput {
            code,
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_sudo_prefix_when_elevated() {
        let spec = CommandSpec::new("apt-get")
            .args(["install", "-y", "curl"])
            .elevated(true);

        assert_eq!(spec.to_string(), "sudo apt-get install -y curl");
    }

    #[test]
    fn display_omits_sudo_for_user_commands() {
        let spec = CommandSpec::new("pyenv").arg("--version");

        assert_eq!(spec.to_string(), "pyenv --version");
    }

    #[test]
    fn failure_details_falls_back_to_exit_code() {
        let output = CommandOutput::failed(100, "  ");

        assert_eq!(output.failure_details(), "exited with status 100");
    }

    #[test]
    fn failure_details_prefers_stderr() {
        let output = CommandOutput::failed(100, "E: Unable to locate package foo\n");

        assert_eq!(output.failure_details(), "E: Unable to locate package foo");
    }

    #[tokio::test]
    async fn system_runner_captures_stdout() {
        let output = SystemRunner::new()
            .run(&CommandSpec::new("sh").args(["-c", "echo hello"]))
            .await
            .expect("sh should be available");

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn system_runner_reports_spawn_failure() {
        let result = SystemRunner::new()
            .run(&CommandSpec::new("pyrig-definitely-missing-binary"))
            .await;

        assert!(matches!(result, Err(RunnerError::Spawn { .. })));
    }
}
