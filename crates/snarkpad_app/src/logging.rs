//! Logger initialization for the snarkpad shell.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Destination for log output.
#[allow(dead_code)]
pub enum LogDestination {
    /// Write to the terminal (stdout).
    Terminal,
    /// Write to the given file.
    File(PathBuf),
    /// Write to both terminal and file.
    Both(PathBuf),
}

/// Initialize the global logger. Run output stays on the worker_* macros;
/// this only decides where those lines land.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    match destination {
        LogDestination::Terminal => loggers.push(terminal(level, config)),
        LogDestination::File(path) => {
            if let Some(logger) = file(level, config, &path) {
                loggers.push(logger);
            }
        }
        LogDestination::Both(path) => {
            loggers.push(terminal(level, config.clone()));
            if let Some(logger) = file(level, config, &path) {
                loggers.push(logger);
            }
        }
    }

    let _ = CombinedLogger::init(loggers);
}

fn terminal(level: LevelFilter, config: Config) -> Box<dyn SharedLogger> {
    TermLogger::new(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}

fn file(level: LevelFilter, config: Config, path: &Path) -> Option<Box<dyn SharedLogger>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: could not create log file at {path:?}: {err}");
            None
        }
    }
}
