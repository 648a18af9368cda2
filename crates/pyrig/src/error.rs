use thiserror::Error;

use pyrig_core::InstallScriptError;
use pyrig_platform::HostPathsError;

use crate::settings::SettingsError;
use crate::single_instance::LockError;

/// Problems that stop pyrig before any install step runs.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Paths(#[from] HostPathsError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Download(#[from] InstallScriptError),
}
