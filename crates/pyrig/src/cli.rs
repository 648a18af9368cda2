use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pyrig")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Install a current Python (or Docker) on Ubuntu and WSL", long_about = None)]
pub struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true, env = "PYRIG_CONFIG")]
    pub config: Option<PathBuf>,

    /// More terminal output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Install from the deadsnakes PPA with apt (default)
    Ppa,
    /// Build from source with pyenv
    Pyenv,
    /// Install Docker Engine and the Compose plugin
    Docker,
}

impl Cli {
    #[must_use]
    pub fn flow(&self) -> Command {
        self.command.unwrap_or(Command::Ppa)
    }
}
