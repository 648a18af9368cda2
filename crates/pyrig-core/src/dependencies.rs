use log::{debug, info, warn};
use pyrig_backend::{Availability, BackendError, InstallMode, PackageManager, StepOutcome};

/// Install the mandatory package set in one transaction.
///
/// # Errors
/// Returns [`BackendError::MandatoryDependency`] if the package manager fails.
pub async fn install_core(
    packages: &dyn PackageManager,
    names: &[String],
) -> Result<(), BackendError> {
    if names.is_empty() {
        return Ok(());
    }

    info!("Installing required packages: {}", names.join(" "));
    packages
        .install(names, InstallMode::Plain)
        .await
        .map_err(|error| BackendError::MandatoryDependency {
            packages: names.to_vec(),
            details: error.to_string(),
        })
}

/// Install best-effort packages one at a time. Packages the index does not
/// carry, and packages whose install fails, are skipped with a warning.
pub async fn install_optional(packages: &dyn PackageManager, names: &[String]) -> StepOutcome {
    let mut skipped = Vec::new();

    for name in names {
        match packages.availability(name).await {
            Availability::Unavailable => {
                warn!("Optional package {name} is not in the package index, skipping");
                skipped.push(name.clone());
                continue;
            }
            Availability::Unknown => {
                debug!("Availability of {name} is unknown, attempting install anyway");
            }
            Availability::Available => {}
        }

        if let Err(error) = packages
            .install(std::slice::from_ref(name), InstallMode::Plain)
            .await
        {
            warn!("Optional package {name} failed to install: {error}");
            skipped.push(name.clone());
        }
    }

    if skipped.is_empty() {
        StepOutcome::Success
    } else {
        StepOutcome::SkippedWarning(format!(
            "optional packages not installed: {}",
            skipped.join(", ")
        ))
    }
}
