mod error;
mod traits;
mod types;

pub use error::BackendError;
pub use traits::{InstallMode, PackageManager, RuntimeProvider};
pub use types::{
    Availability, InstalledPackage, PackageSet, ProfileInit, PythonVersion, ResolvedRuntime,
    ShimStyle, StepOutcome, VersionParseError,
};
