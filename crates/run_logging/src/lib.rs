#![deny(missing_docs)]
//! Shared logging front-end for the greeter workspace.
//!
//! Every crate logs through the `run_*` macros below so that the backend can be
//! swapped in one place. The binary installs a `simplelog` backend with
//! [`initialize`]; tests call [`initialize_for_tests`].

use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use log;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use thiserror::Error;

/// Default log file written when the destination includes a file.
pub const DEFAULT_LOG_FILE: &str = "./greeter.log";

/// Logs a trace-level message.
#[macro_export]
macro_rules! run_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message.
#[macro_export]
macro_rules! run_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!($($arg)*);
    }};
}

/// Logs an info-level message.
#[macro_export]
macro_rules! run_info {
    ($($arg:tt)*) => {{
        $crate::log::info!($($arg)*);
    }};
}

/// Logs a warn-level message.
#[macro_export]
macro_rules! run_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!($($arg)*);
    }};
}

/// Logs an error-level message.
#[macro_export]
macro_rules! run_error {
    ($($arg:tt)*) => {{
        $crate::log::error!($($arg)*);
    }};
}

/// Where log records are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogDestination {
    /// Terminal only (stderr for warnings and errors).
    #[default]
    Terminal,
    /// The given file only.
    File(PathBuf),
    /// Terminal and the given file.
    Both(PathBuf),
}

/// Error returned when a destination name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log destination '{0}' (expected terminal, file or both)")]
pub struct UnknownDestination(pub String);

impl FromStr for LogDestination {
    type Err = UnknownDestination;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "terminal" => Ok(Self::Terminal),
            "file" => Ok(Self::File(PathBuf::from(DEFAULT_LOG_FILE))),
            "both" => Ok(Self::Both(PathBuf::from(DEFAULT_LOG_FILE))),
            other => Err(UnknownDestination(other.to_string())),
        }
    }
}

/// Installs the global logger.
///
/// Silently keeps the existing logger if one was already installed, and falls
/// back to terminal output when the log file cannot be created.
pub fn initialize(destination: &LogDestination, level: LevelFilter) {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::Terminal => vec![terminal_logger(level, config)],
        LogDestination::File(path) => match file_logger(path, level, config.clone()) {
            Some(logger) => vec![logger],
            None => vec![terminal_logger(level, config)],
        },
        LogDestination::Both(path) => {
            let mut loggers = vec![terminal_logger(level, config.clone())];
            if let Some(logger) = file_logger(path, level, config) {
                loggers.push(logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

/// Initializes a terminal logger for tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<dyn SharedLogger> {
    TermLogger::new(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}

fn file_logger(path: &Path, level: LevelFilter, config: Config) -> Option<Box<dyn SharedLogger>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: could not create log file at {:?}: {}", path, err);
            None
        }
    }
}
