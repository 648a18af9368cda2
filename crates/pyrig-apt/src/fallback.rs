use log::{info, warn};

use pyrig_backend::{BackendError, InstallMode, PackageManager};
use pyrig_core::Escalation;

/// Install `packages`, escalating from a plain install to a forced reinstall
/// and finally to a package database repair followed by one more install.
/// The last install runs even when the repair fails, and decides the result.
///
/// # Errors
/// Returns [`BackendError::EscalationExhausted`] with the last strategy's
/// failure when all three attempts fail.
pub async fn install_with_fallback(
    packages: &dyn PackageManager,
    target: &str,
    names: &[String],
) -> Result<&'static str, BackendError> {
    let strategy = Escalation::new(target)
        .then("install", || packages.install(names, InstallMode::Plain))
        .then("reinstall", || packages.install(names, InstallMode::Reinstall))
        .then("repair and install", || async move {
            if let Err(error) = packages.repair().await {
                warn!("Package database repair failed, installing anyway: {error}");
            }
            packages.install(names, InstallMode::Plain).await
        })
        .run()
        .await
        .map_err(|error| BackendError::EscalationExhausted {
            target: error.target.clone(),
            details: error
                .last()
                .map_or_else(|| error.to_string(), ToString::to_string),
        })?;

    info!("Installed {target} via {strategy}");
    Ok(strategy)
}
