#![deny(missing_docs)]
//! Shared logging utilities for the job tracker workspace.
//!
//! This crate provides the `tracker_*` logging macros used across the
//! codebase, the logger initialization used by an embedding UI, and a
//! minimal test initializer for the global logger.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

#[doc(hidden)]
pub use log;

/// Log target shared by every `tracker_*` macro.
pub const LOG_TARGET: &str = "scrape_tracker";

/// Default log file, relative to the current working directory.
pub const DEFAULT_LOG_FILE: &str = "./tracker.log";

/// Logs a trace-level message under the tracker log target.
#[macro_export]
macro_rules! tracker_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the tracker log target.
#[macro_export]
macro_rules! tracker_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the tracker log target.
#[macro_export]
macro_rules! tracker_info {
    ($($arg:tt)*) => {{
        $crate::log::info!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the tracker log target.
#[macro_export]
macro_rules! tracker_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the tracker log target.
#[macro_export]
macro_rules! tracker_error {
    ($($arg:tt)*) => {{
        $crate::log::error!(target: $crate::LOG_TARGET, $($arg)*);
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the given file, truncating it.
    File(PathBuf),
    /// Write to the terminal.
    Terminal,
    /// Write to both the terminal and the given file.
    Both(PathBuf),
}

impl LogDestination {
    /// File destination at [`DEFAULT_LOG_FILE`].
    pub fn default_file() -> Self {
        LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE))
    }
}

/// Initialize the global logger with the specified destination and level.
///
/// Returns `false` if no logger could be installed, either because the log
/// file could not be created or because a logger is already set.
pub fn initialize(destination: LogDestination, level: LevelFilter) -> bool {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File(path) => match create_file_logger(&path, level, config) {
            Some(file_logger) => vec![file_logger],
            None => return false,
        },
        LogDestination::Terminal => vec![terminal_logger(level, config)],
        LogDestination::Both(path) => {
            let mut loggers: Vec<Box<dyn SharedLogger>> =
                vec![terminal_logger(level, config.clone())];
            if let Some(file_logger) = create_file_logger(&path, level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    CombinedLogger::init(loggers).is_ok()
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
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

fn terminal_logger(level: LevelFilter, config: Config) -> Box<TermLogger> {
    TermLogger::new(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_points_at_tracker_log() {
        assert_eq!(
            LogDestination::default_file(),
            LogDestination::File(PathBuf::from("./tracker.log"))
        );
    }

    #[test]
    fn unwritable_log_file_is_reported() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing_dir = temp.path().join("missing").join("tracker.log");
        assert!(create_file_logger(&missing_dir, LevelFilter::Info, build_config()).is_none());
    }

    #[test]
    fn writable_log_file_is_created() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("tracker.log");
        assert!(create_file_logger(&path, LevelFilter::Info, build_config()).is_some());
        assert!(path.exists());
    }

    #[test]
    fn macros_accept_format_arguments() {
        initialize_for_tests();
        let job = "local-1";
        tracker_debug!("job {} progressed to {}%", job, 40);
        tracker_info!("job {job} completed");
        tracker_warn!("dropped fragment for {}", job);
        tracker_trace!("noop");
        tracker_error!("job {} failed: {}", job, "boom");
    }
}
