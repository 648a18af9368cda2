mod cli;
mod error;
mod logging;
mod orchestrator;
mod settings;
mod single_instance;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use pyrig_core::HttpScriptSource;
use pyrig_platform::{HostEnvironment, HostPaths, SystemRunner};

use crate::cli::Cli;
use crate::error::StartupError;
use crate::orchestrator::Context;
use crate::settings::Settings;
use crate::single_instance::RunLock;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(error) => {
            // Logging may not be up yet.
            if log::max_level() == log::LevelFilter::Off {
                eprintln!("pyrig: {error}");
            } else {
                error!("{error}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<i32, StartupError> {
    let paths = HostPaths::new()?;
    let settings = Settings::load(cli.config.as_deref(), &paths)?;
    let preferred = settings.preferred()?;

    if let Err(error) = paths.ensure_dirs() {
        eprintln!("pyrig: could not create {}: {error}", paths.data_dir.display());
    }
    logging::init_logging(cli.verbose, &paths.log_file(), settings.max_log_size_bytes);

    let env = HostEnvironment::capture()?;
    let _lock = RunLock::acquire(&paths.lock_file())?;
    info!("pyrig {} starting", env!("CARGO_PKG_VERSION"));

    let scripts = HttpScriptSource::new(&settings.download_policy())?;
    let ctx = Context {
        runner: Arc::new(SystemRunner::new()),
        scripts: Arc::new(scripts),
        env,
        settings,
        preferred,
    };

    let report = orchestrator::run(cli.flow(), &ctx).await;
    Ok(report.exit_code())
}
