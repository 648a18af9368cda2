mod conflict;
mod docker;
mod fallback;
mod manager;
mod probe;
mod provider;

pub use conflict::resolve_conflicts;
pub use docker::{DEFAULT_DOCKER_INSTALLER_URL, DockerConfig, DockerInstaller};
pub use fallback::install_with_fallback;
pub use manager::{AptManager, SearchRows};
pub use probe::{ChannelProbe, probe_channel};
pub use provider::{DEFAULT_CHANNEL, DEFAULT_GET_PIP_URL, PpaConfig, PpaProvider};
