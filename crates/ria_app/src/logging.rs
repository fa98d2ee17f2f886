//! Logger setup for the `ria` binary.
//!
//! File output goes to `./ria.log` in the current working directory.

use std::fmt;
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILE: &str = "./ria.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogDestination {
    File,
    /// Terminal output goes to stderr so it never mixes with command output.
    #[default]
    Terminal,
    Both,
}

impl FromStr for LogDestination {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(LogDestination::File),
            "terminal" => Ok(LogDestination::Terminal),
            "both" => Ok(LogDestination::Both),
            other => Err(format!(
                "unknown log destination {other:?} (expected terminal, file or both)"
            )),
        }
    }
}

impl fmt::Display for LogDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogDestination::File => "file",
            LogDestination::Terminal => "terminal",
            LogDestination::Both => "both",
        })
    }
}

pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File => match create_file_logger(level, config) {
            Some(file_logger) => vec![file_logger],
            None => return,
        },
        LogDestination::Terminal => vec![terminal_logger(level, config)],
        LogDestination::Both => {
            let mut loggers = vec![terminal_logger(level, config.clone())];
            if let Some(file_logger) = create_file_logger(level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_allow_str(ria_logging::LOG_TARGET)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<dyn SharedLogger> {
    TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto)
}

fn create_file_logger(level: LevelFilter, config: Config) -> Option<Box<dyn SharedLogger>> {
    let log_path = PathBuf::from(LOG_FILE);
    match File::create(&log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}
