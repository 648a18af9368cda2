use log::{debug, info, warn};

use pyrig_backend::{PackageManager, StepOutcome};

/// Detect pre-release interpreter builds left by an earlier run and clear
/// them out. Only packages named in `targets` are considered, and `protected`
/// (the package behind the system `python3`) is never removed.
///
/// Cleanup is best effort: repair, purge and orphan cleanup failures are
/// collected as warnings. Only the final index refresh is fatal.
pub async fn resolve_conflicts(
    packages: &dyn PackageManager,
    pattern: &str,
    targets: &[String],
    protected: Option<&str>,
) -> StepOutcome {
    let installed = match packages.installed(pattern).await {
        Ok(installed) => installed,
        Err(error) => {
            return StepOutcome::SkippedWarning(format!(
                "could not inspect installed packages: {error}"
            ));
        }
    };

    let suspects: Vec<String> = installed
        .iter()
        .filter(|package| targets.contains(&package.name) && package.is_prerelease())
        .filter(|package| {
            let is_system = protected == Some(package.name.as_str());
            if is_system {
                info!(
                    "Leaving {} {} alone, it provides the system python3",
                    package.name, package.version
                );
            }
            !is_system
        })
        .map(|package| {
            info!(
                "Conflicting install: {} {} ({})",
                package.name, package.version, package.status
            );
            package.name.clone()
        })
        .collect();

    if suspects.is_empty() {
        debug!("No conflicting interpreter packages");
        return StepOutcome::Success;
    }

    warn!("Removing pre-release packages: {}", suspects.join(" "));
    let mut suppressed = Vec::new();

    if let Err(error) = packages.repair().await {
        suppressed.push(format!("repair: {error}"));
    }
    if let Err(error) = packages.purge(&suspects).await {
        suppressed.push(format!("purge: {error}"));
    }
    if let Err(error) = packages.clean_orphans().await {
        suppressed.push(format!("cleanup: {error}"));
    }

    if let Err(error) = packages.refresh_index().await {
        return StepOutcome::Fatal(error);
    }

    if suppressed.is_empty() {
        StepOutcome::Success
    } else {
        for message in &suppressed {
            warn!("Ignored during conflict cleanup: {message}");
        }
        StepOutcome::SkippedWarning(format!(
            "removed {} with errors ignored: {}",
            suspects.join(", "),
            suppressed.join("; ")
        ))
    }
}
