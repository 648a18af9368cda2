mod client;
mod error;
mod provider;
mod version;

pub use client::PyenvClient;
pub use error::PyenvError;
pub use provider::{DEFAULT_PYENV_INSTALLER_URL, PyenvConfig, PyenvProvider, default_build_packages};
pub use version::{newest_patch, parse_install_list};
