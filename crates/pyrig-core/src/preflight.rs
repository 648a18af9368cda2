use log::debug;
use pyrig_backend::BackendError;
use pyrig_platform::{CommandRunner, CommandSpec};

/// Refuse to run as the superuser.
///
/// # Errors
/// Returns [`BackendError::Privilege`] when the effective uid is 0, or a
/// command failure when the uid cannot be determined.
pub async fn ensure_unprivileged(runner: &dyn CommandRunner) -> Result<(), BackendError> {
    let spec = CommandSpec::new("id").arg("-u");
    let output = runner.run(&spec).await?;
    if !output.success() {
        return Err(BackendError::command_failed(
            spec.to_string(),
            output.failure_details(),
        ));
    }

    let uid: u32 = output.stdout.trim().parse().map_err(|_| {
        BackendError::command_failed(
            spec.to_string(),
            format!("unexpected uid output: {:?}", output.stdout.trim()),
        )
    })?;
    debug!("Effective uid: {uid}");

    if uid == 0 {
        Err(BackendError::Privilege)
    } else {
        Ok(())
    }
}
