use crate::error::{CliError, Result as CliResult};

use studio_config::LoggingConfig;

use std::io::IsTerminal;
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::debug;

/// Initialize logging for the CLI.
///
/// Stdout carries the command's JSON result, so log lines go to stderr or,
/// when `logging.file` is set, to that file. Colors only apply to a terminal.
pub fn initialize(config: &LoggingConfig) -> CliResult<()> {
    let level_filter = config.level.0;
    let base_dispatch = Dispatch::new().level(level_filter);

    let dispatch = if let Some(ref log_path) = config.file {
        let file = fern::log_file(log_path)
            .map_err(|e| CliError::logger(format!("Failed to open log file {log_path}: {e}")))?;

        Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{date} - {level}] {message} [{target}]",
                    date = humantime::format_rfc3339(SystemTime::now()),
                    level = record.level(),
                    target = record.target(),
                ))
            })
            .chain(file)
    } else if config.colored && std::io::stderr().is_terminal() {
        let colors = ColoredLevelConfig::new()
            .trace(Color::Magenta)
            .debug(Color::Blue)
            .info(Color::Green)
            .warn(Color::Yellow)
            .error(Color::Red);

        Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "[{date} - {level}] {message}",
                    date = humantime::format_rfc3339_seconds(SystemTime::now()),
                    level = colors.color(record.level()),
                ))
            })
            .chain(std::io::stderr())
    } else {
        Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{date} - {level}] {message}",
                    date = humantime::format_rfc3339_seconds(SystemTime::now()),
                    level = record.level(),
                ))
            })
            .chain(std::io::stderr())
    };

    base_dispatch
        .chain(dispatch)
        .apply()
        .map_err(|e| CliError::logger(format!("Failed to initialize logger: {e}")))?;

    debug!("Logger initialized: level={level_filter:?}");

    // Bridge tracing to log
    tracing_log::LogTracer::init().ok();

    Ok(())
}
