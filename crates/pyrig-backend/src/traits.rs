use async_trait::async_trait;

use crate::error::BackendError;
use crate::types::{
    Availability, InstalledPackage, PackageSet, ProfileInit, PythonVersion, ResolvedRuntime,
    StepOutcome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    Plain,
    Reinstall,
}

/// The host's system package manager.
#[async_trait]
pub trait PackageManager: Send + Sync {
    fn name(&self) -> &'static str;

    async fn refresh_index(&self) -> Result<(), BackendError>;

    async fn install(&self, packages: &[String], mode: InstallMode) -> Result<(), BackendError>;

    async fn availability(&self, package: &str) -> Availability;

    async fn add_channel(&self, channel: &str) -> Result<(), BackendError>;

    /// Finish interrupted configuration and fix broken dependencies.
    async fn repair(&self) -> Result<(), BackendError>;

    async fn purge(&self, packages: &[String]) -> Result<(), BackendError>;

    /// Remove orphaned packages and clear the download cache.
    async fn clean_orphans(&self) -> Result<(), BackendError>;

    async fn installed(&self, pattern: &str) -> Result<Vec<InstalledPackage>, BackendError>;
}

/// A source of Python interpreters (a package channel or a version manager).
#[async_trait]
pub trait RuntimeProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn dependencies(&self) -> PackageSet;

    /// Shell profile block the provider needs, if any.
    fn profile_init(&self) -> Option<ProfileInit> {
        None
    }

    /// Make the provider's source usable (add a channel, bootstrap a tool).
    async fn prepare(&self) -> StepOutcome;

    /// Clear out leftovers from earlier broken installs.
    async fn resolve_conflicts(&self) -> StepOutcome {
        StepOutcome::Success
    }

    /// Pick the first version in `preferred` that can actually be installed.
    async fn resolve_version(
        &self,
        preferred: &[PythonVersion],
    ) -> Result<PythonVersion, BackendError>;

    async fn install(&self, version: &PythonVersion) -> Result<ResolvedRuntime, BackendError>;

    async fn bootstrap_pip(&self, runtime: &ResolvedRuntime) -> StepOutcome;
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::types::ShimStyle;

    struct FixedProvider {
        versions: Vec<PythonVersion>,
    }

    #[async_trait]
    impl RuntimeProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn display_name(&self) -> &'static str {
            "Fixed versions"
        }

        fn dependencies(&self) -> PackageSet {
            PackageSet::default()
        }

        async fn prepare(&self) -> StepOutcome {
            StepOutcome::Success
        }

        async fn resolve_version(
            &self,
            preferred: &[PythonVersion],
        ) -> Result<PythonVersion, BackendError> {
            preferred
                .iter()
                .find(|want| self.versions.iter().any(|have| have.same_series(want)))
                .cloned()
                .ok_or_else(|| BackendError::NoInstallableVersion {
                    candidates: preferred.iter().map(PythonVersion::package_name).collect(),
                })
        }

        async fn install(&self, version: &PythonVersion) -> Result<ResolvedRuntime, BackendError> {
            Ok(ResolvedRuntime {
                version: version.clone(),
                interpreter: PathBuf::from(format!("/usr/bin/{}", version.package_name())),
                pip: PathBuf::from("/usr/bin/pip"),
                style: ShimStyle::Symlink,
            })
        }

        async fn bootstrap_pip(&self, _runtime: &ResolvedRuntime) -> StepOutcome {
            StepOutcome::Success
        }
    }

    #[tokio::test]
    async fn default_hooks_are_no_ops() {
        let provider = FixedProvider { versions: vec![] };

        assert!(provider.profile_init().is_none());
        assert_eq!(provider.resolve_conflicts().await, StepOutcome::Success);
    }

    #[tokio::test]
    async fn provider_is_usable_as_trait_object() {
        let provider: Box<dyn RuntimeProvider> = Box::new(FixedProvider {
            versions: vec![PythonVersion::series(3, 12)],
        });
        let preferred = [PythonVersion::series(3, 13), PythonVersion::series(3, 12)];

        let version = provider
            .resolve_version(&preferred)
            .await
            .expect("3.12 is available");
        let runtime = provider.install(&version).await.expect("install succeeds");

        assert_eq!(version, PythonVersion::series(3, 12));
        assert_eq!(runtime.interpreter, PathBuf::from("/usr/bin/python3.12"));
    }
}
