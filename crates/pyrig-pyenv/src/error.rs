use pyrig_backend::BackendError;
use pyrig_platform::RunnerError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PyenvError {
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

impl From<PyenvError> for BackendError {
    fn from(err: PyenvError) -> Self {
        match err {
            PyenvError::CommandFailed { command, stderr } => {
                BackendError::command_failed(command, stderr)
            }
            PyenvError::Runner(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_maps_to_backend_command_failure() {
        let error = PyenvError::CommandFailed {
            command: "pyenv install -s 3.13.1".to_string(),
            stderr: "BUILD FAILED".to_string(),
        };

        assert_eq!(
            BackendError::from(error),
            BackendError::command_failed("pyenv install -s 3.13.1", "BUILD FAILED")
        );
    }
}
