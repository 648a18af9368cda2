//! Reusable mechanics shared by the install flows:
//! - Mandatory and best-effort package installation.
//! - Installer script download with timeout/retry and optional pinning.
//! - Ordered fallback strategies for installs that may need escalation.
//! - The privilege preflight.
//! - Per-run step report.

mod dependencies;
mod escalation;
mod install_script;
mod preflight;
mod report;

pub mod fakes;

/// Core/optional dependency installation policies.
pub use dependencies::{install_core, install_optional};
/// Sequential fallback executor.
pub use escalation::{Escalation, EscalationError};
/// Installer script download helper and sources.
pub use install_script::{
    DownloadPolicy, HttpScriptSource, InstallScriptError, ScriptSource, download_install_script,
};
/// Superuser guard.
pub use preflight::ensure_unprivileged;
/// Step outcome aggregation.
pub use report::RunReport;
