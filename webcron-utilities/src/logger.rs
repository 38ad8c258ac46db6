use std::{env, path::PathBuf, time::SystemTime};

use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, info};
use webcron_models::errors::SendableError;

use crate::dirutils;

#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub level: LevelFilter,
    pub file: Option<PathBuf>,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file: Some(PathBuf::from("webcron.log")),
        }
    }
}

fn colored_level(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".red().bold(),
        Level::Warn => "WARN".yellow(),
        Level::Info => "INFO".green(),
        Level::Debug => "DEBUG".blue(),
        Level::Trace => "TRACE".dimmed(),
    }
}

pub fn setup_logger(options: &LoggerOptions) -> Result<(), SendableError> {
    let stdout = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                colored_level(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stdout());

    let mut dispatch = fern::Dispatch::new()
        .level(options.level)
        .level_for("sqlx", LevelFilter::Warn)
        .chain(stdout);

    if let Some(path) = &options.file {
        let path = dirutils::ensure_parent_dir(path)?;
        let file = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{} {} {}] {}",
                    humantime::format_rfc3339_seconds(SystemTime::now()),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .chain(fern::log_file(path)?);
        dispatch = dispatch.chain(file);
    }

    dispatch.apply()?;
    Ok(())
}

pub fn print_env() -> std::io::Result<()> {
    let path = env::current_dir()?;
    info!("The current directory is {}", path.display());
    Ok(())
}
