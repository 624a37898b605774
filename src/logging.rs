use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};
use thiserror::Error;
use crate::config::Config;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("logger already initialised")]
    AlreadySet(#[from] log::SetLoggerError),
}

/// Install the global logger described by the configuration.
///
/// Logging is off unless a level is configured. With a log file the records
/// are appended there, otherwise they go to stderr.
pub fn init(config: &Config) -> Result<(), LoggingError> {
    if config.log_level == LevelFilter::Off {
        return Ok(());
    }
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::Open {
                    path: path.clone(),
                    source,
                })?;
            WriteLogger::init(config.log_level, log_config, file)?;
        }
        None => {
            TermLogger::init(config.log_level, log_config, TerminalMode::Stderr, ColorChoice::Auto)?;
        }
    }
    Ok(())
}
