use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::OpenOptions;
use std::path::Path;

fn trim_log_file_if_oversized(log_path: &Path, max_log_size: u64) {
    if let Ok(metadata) = std::fs::metadata(log_path)
        && metadata.len() > max_log_size
        && let Ok(contents) = std::fs::read(log_path)
    {
        let half = contents.len() / 2;
        let keep_from = contents[half..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(half, |pos| half + pos + 1);
        let _ = std::fs::write(log_path, &contents[keep_from..]);
    }
}

fn terminal_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Colored status lines on the terminal plus a timestamped debug log at
/// `log_path`. The file sink is skipped when it cannot be opened.
pub fn init_logging(verbosity: u8, log_path: &Path, max_log_size: u64) {
    trim_log_file_if_oversized(log_path, max_log_size);

    let term_config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .add_filter_allow_str("pyrig")
        .build();
    let file_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("pyrig")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        terminal_level(verbosity),
        term_config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, file_config, file)),
        Err(error) => eprintln!("pyrig: not writing {}: {error}", log_path.display()),
    }

    let _ = CombinedLogger::init(loggers);

    log::debug!("Logging to {}", log_path.display());
}
