use pyrig_platform::RunnerError;
use thiserror::Error;

/// Reasons a run aborts. Anything that reaches the orchestrator as a
/// `BackendError` is fatal; recoverable conditions are logged and skipped
/// where they occur.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error(
        "refusing to run as root: shims and profile edits would land in root's home. Re-run as your normal user"
    )]
    Privilege,

    #[error("Failed to install required packages ({}): {details}", packages.join(", "))]
    MandatoryDependency {
        packages: Vec<String>,
        details: String,
    },

    #[error("Package channel {channel} is unusable: {details}")]
    Channel { channel: String, details: String },

    #[error("Failed to refresh the package index: {details}")]
    IndexRefresh { details: String },

    #[error(
        "None of {} is installable from the configured sources. Alternatives: build from source with `pyrig pyenv`, use a container image (for example `docker run -it python:3`), or build CPython manually",
        candidates.join(", ")
    )]
    NoInstallableVersion { candidates: Vec<String> },

    #[error("Installing {target} failed after every fallback strategy: {details}")]
    EscalationExhausted { target: String, details: String },

    #[error("Failed to bootstrap {tool}: {details}")]
    Bootstrap { tool: &'static str, details: String },

    #[error("Command failed: `{command}`: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("IO error ({kind}): {message}")]
    IoError {
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Failed to install shims: {details}")]
    Shim { details: String },
}

impl BackendError {
    pub fn channel(channel: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Channel {
            channel: channel.into(),
            details: details.into(),
        }
    }

    pub fn bootstrap(tool: &'static str, details: impl Into<String>) -> Self {
        Self::Bootstrap {
            tool,
            details: details.into(),
        }
    }

    pub fn command_failed(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            stderr: stderr.into(),
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<RunnerError> for BackendError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::Spawn { command, message } => Self::CommandFailed {
                command,
                stderr: message,
            },
            RunnerError::Signalled { command } => Self::CommandFailed {
                command,
                stderr: "terminated by a signal".to_string(),
            },
        }
    }
}
