#![allow(clippy::missing_errors_doc)]

mod config;
mod detect;
mod profile;
mod shims;
mod verify;

pub use config::{ConfigError, ShellConfig, ShellConfigEdit};
pub use detect::ShellType;
pub use profile::{PathUpdate, ensure_profile_init, path_export_line, update_profile_path};
pub use shims::{ShimError, install_shims, wrapper_script};
pub use verify::{
    DOCKER_TARGETS, PYTHON_TARGETS, Probe, VerificationResult, VerifyTarget, verify_commands,
};
