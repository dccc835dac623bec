//! Logger for the drive executable
//!
//! Log lines go to stdout and to the session's log file, prefixed with the
//! seconds elapsed in the session and a coloured level tag. The control
//! modules emit trace lines every cycle, so noisy targets can be given their
//! own level with [`LoggerConfig::level_for`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::{self, info};
use colored::{ColoredString, Colorize};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Levels used by the logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Level of every target without its own entry.
    pub min_level: LevelFilter,

    /// Per-target levels, matched on the module path prefix of the record.
    pub target_levels: Vec<(String, LevelFilter)>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised while setting up the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must be at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("A target level was given for an empty target ({0})")]
    EmptyTarget(LevelFilter),

    #[error("Cannot open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("Cannot install the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LoggerConfig {
    pub fn new(min_level: LevelFilter) -> Self {
        Self {
            min_level,
            target_levels: Vec::new(),
        }
    }

    /// Log records from `target` (and its submodules) at `level` instead of
    /// the minimum level.
    pub fn level_for(mut self, target: &str, level: LevelFilter) -> Self {
        self.target_levels.push((target.to_string(), level));
        self
    }

    /// Check the levels can be installed.
    pub fn validate(&self) -> Result<(), LoggerInitError> {
        if self.min_level < log::Level::Info {
            return Err(LoggerInitError::InvalidMinLogLevel(self.min_level))
        }

        for (target, level) in self.target_levels.iter() {
            if target.is_empty() {
                return Err(LoggerInitError::EmptyTarget(*level))
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the logger for this process.
///
/// Only one logger can be installed per process, a second call returns
/// `FernInitError`.
pub fn logger_init(
    config: &LoggerConfig,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    config.validate()?;

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            }
            else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .level(config.min_level);

    for (target, level) in config.target_levels.iter() {
        dispatch = dispatch.level_for(target.clone(), *level);
    }

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", config.min_level);
    for (target, level) in config.target_levels.iter() {
        info!("    Log level for {}: {:?}", target, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Three letter tag of a level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_validation() {
        let config = LoggerConfig::new(LevelFilter::Debug)
            .level_for("drive_lib::wheel_module", LevelFilter::Info);
        assert!(config.validate().is_ok());
        assert_eq!(config.target_levels.len(), 1);

        assert!(matches!(
            LoggerConfig::new(LevelFilter::Warn).validate(),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn))
        ));

        assert!(matches!(
            LoggerConfig::new(LevelFilter::Info)
                .level_for("", LevelFilter::Off)
                .validate(),
            Err(LoggerInitError::EmptyTarget(LevelFilter::Off))
        ));
    }

    #[test]
    fn test_init_rejects_bad_config() {
        // Rejected before the log file is touched or a logger installed
        let session = session::Session {
            session_root: PathBuf::from("/no/such/session"),
            log_file_path: PathBuf::from("/no/such/session/test.log"),
        };

        assert!(matches!(
            logger_init(&LoggerConfig::new(LevelFilter::Error), &session),
            Err(LoggerInitError::InvalidMinLogLevel(_))
        ));
    }
}
