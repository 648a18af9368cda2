mod commands;
mod environment;
mod paths;

pub mod fakes;

pub use commands::{CommandOutput, CommandRunner, CommandSpec, RunnerError, SystemRunner};
pub use environment::{HostEnvironment, HostKind};
pub use paths::{HostPaths, HostPathsError};
