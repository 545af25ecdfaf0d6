//! Galaxy3D Engine - process-wide logging state
//!
//! The camera model itself carries no global state. The only thing shared
//! across the process is the logger and its verbosity, which must be set
//! explicitly with `Engine::initialize()` once at startup. Until then (and
//! after `Engine::shutdown()`) every log call is dropped.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, LogLevel, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global logging state storage
static LOGGING: OnceLock<RwLock<LoggingState>> = OnceLock::new();

/// Logger plus the verbosity chosen at initialization
struct LoggingState {
    /// `None` until `Engine::initialize()` is called
    level: Option<LogLevel>,
    logger: Box<dyn Logger>,
}

impl LoggingState {
    fn new() -> Self {
        Self {
            level: None,
            logger: Box::new(DefaultLogger),
        }
    }
}

fn logging() -> &'static RwLock<LoggingState> {
    LOGGING.get_or_init(|| RwLock::new(LoggingState::new()))
}

// ===== PUBLIC API =====

/// Process-wide engine state manager
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_camera::galaxy3d::{Engine, log::LogLevel};
///
/// // Once, at process start
/// Engine::initialize(LogLevel::Info)?;
///
/// // ... create viewers and cameras ...
///
/// Engine::shutdown();
/// # Ok::<(), galaxy_3d_camera::galaxy3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Initialize logging with the given verbosity
    ///
    /// Must be called once per process before anything is logged.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if the engine is already initialized
    /// (call `shutdown()` first) or the logging lock is poisoned.
    pub fn initialize(level: LogLevel) -> Result<()> {
        let mut state = logging().write()
            .map_err(|_| Error::InitializationFailed("Logging lock poisoned".to_string()))?;

        if let Some(current) = state.level {
            return Err(Error::InitializationFailed(format!(
                "Engine already initialized with log level {:?}. Call Engine::shutdown() first.",
                current
            )));
        }

        state.level = Some(level);
        Ok(())
    }

    /// Whether `initialize()` has been called (and not undone by `shutdown()`)
    pub fn is_initialized() -> bool {
        logging().read().map(|state| state.level.is_some()).unwrap_or(false)
    }

    /// Shutdown the engine
    ///
    /// Logging is silenced until the next `initialize()`. A custom logger
    /// set with `set_logger()` stays installed.
    pub fn shutdown() {
        if let Ok(mut state) = logging().write() {
            state.level = None;
        }
    }

    /// Current verbosity (`Off` when not initialized)
    pub fn log_level() -> LogLevel {
        logging()
            .read()
            .ok()
            .and_then(|state| state.level)
            .unwrap_or(LogLevel::Off)
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger, test capture, etc.)
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut state) = logging().write() {
            state.logger = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut state) = logging().write() {
            state.logger = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like camera_info!, camera_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(severity, source, message, None, None);
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by camera_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(severity, source, message, Some(file), Some(line));
    }

    fn dispatch(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: Option<&'static str>,
        line: Option<u32>,
    ) {
        if let Ok(state) = logging().read() {
            let allowed = state.level.map_or(false, |level| level.allows(severity));
            if !allowed {
                return;
            }
            state.logger.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file,
                line,
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
