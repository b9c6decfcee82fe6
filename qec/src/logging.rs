//! Logging infrastructure for qec.
//!
//! A `Logger` is created once by the caller (normally the CLI) and passed
//! explicitly to whatever needs it. The merge engine never logs: it returns a
//! [`MergeReport`](crate::merge::MergeReport) that the caller renders through
//! [`Logger::report`].

use std::env;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::merge::{MergeReport, Severity};

/// Logging level for controlling output verbosity.
///
/// # Examples
///
/// ```
/// use qec::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Suppress all non-essential output.
    Quiet,
    /// Errors and warnings.
    Normal,
    /// Errors, warnings, info and debug messages.
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl LogLevel {
    /// Parses a log level from a string (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not one of `quiet`, `normal` or
    /// `verbose`.
    ///
    /// # Examples
    ///
    /// ```
    /// use qec::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("loud").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("invalid log level: {s}")),
        }
    }
}

/// Lines captured by a [`Logger::capturing`] logger.
pub type CapturedLines = Arc<Mutex<Vec<String>>>;

#[derive(Clone)]
enum Sink {
    Stderr,
    Capture(CapturedLines),
}

/// A level-filtered logger writing to stderr (or to a capture buffer).
///
/// # Examples
///
/// ```
/// use qec::{Logger, LogLevel};
///
/// let logger = Logger::new(LogLevel::Normal);
/// logger.warn("port 80 is published twice");
/// logger.debug("not printed at Normal level");
/// ```
#[derive(Clone)]
pub struct Logger {
    level: LogLevel,
    sink: Sink,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("level", &self.level).finish()
    }
}

impl Logger {
    /// Creates a stderr logger with the specified level.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self {
            level,
            sink: Sink::Stderr,
        }
    }

    /// Creates a logger that records lines in memory instead of printing.
    ///
    /// # Examples
    ///
    /// ```
    /// use qec::{Logger, LogLevel};
    ///
    /// let (logger, lines) = Logger::capturing(LogLevel::Verbose);
    /// logger.info("merged");
    /// assert_eq!(lines.lock().unwrap()[0], "INFO: merged");
    /// ```
    #[must_use]
    pub fn capturing(level: LogLevel) -> (Self, CapturedLines) {
        let lines = CapturedLines::default();
        let logger = Self {
            level,
            sink: Sink::Capture(Arc::clone(&lines)),
        };
        (logger, lines)
    }

    /// Returns the current log level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    fn write(&self, prefix: &str, message: &str) {
        match &self.sink {
            Sink::Stderr => eprintln!("{prefix}: {message}"),
            Sink::Capture(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(format!("{prefix}: {message}"));
                }
            }
        }
    }

    /// Logs an error message (suppressed only at Quiet).
    pub fn error(&self, message: &str) {
        if self.level >= LogLevel::Normal {
            self.write("ERROR", message);
        }
    }

    /// Logs a warning message (Normal and Verbose).
    pub fn warn(&self, message: &str) {
        if self.level >= LogLevel::Normal {
            self.write("WARN", message);
        }
    }

    /// Logs an informational message (Verbose only).
    pub fn info(&self, message: &str) {
        if self.level >= LogLevel::Verbose {
            self.write("INFO", message);
        }
    }

    /// Logs a debug message (Verbose only).
    pub fn debug(&self, message: &str) {
        if self.level >= LogLevel::Verbose {
            self.write("DEBUG", message);
        }
    }

    /// Renders every event of a merge report at its own severity.
    ///
    /// # Examples
    ///
    /// ```
    /// use qec::{Logger, LogLevel};
    /// use qec::merge::{MergeEvent, MergeReport};
    ///
    /// let mut report = MergeReport::default();
    /// report.push(MergeEvent::PortReassigned {
    ///     service: "b_web".into(),
    ///     from: 80,
    ///     to: 180,
    /// });
    ///
    /// let (logger, lines) = Logger::capturing(LogLevel::Verbose);
    /// logger.report(&report);
    /// assert!(lines.lock().unwrap()[0].contains("from 80 to 180"));
    /// ```
    pub fn report(&self, report: &MergeReport) {
        for event in report.events() {
            let message = event.description();
            match event.severity() {
                Severity::Debug => self.debug(&message),
                Severity::Info => self.info(&message),
                Severity::Warning => self.warn(&message),
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Normal)
    }
}

/// Initializes a logger from CLI flags and the environment.
///
/// Priority: `verbose` flag, then `quiet` flag, then the `QEC_LOG_MODE`
/// environment variable, then Normal.
#[must_use]
pub fn init_logger(verbose: bool, quiet: bool) -> Logger {
    if verbose {
        return Logger::new(LogLevel::Verbose);
    }
    if quiet {
        return Logger::new(LogLevel::Quiet);
    }

    if let Ok(env_value) = env::var("QEC_LOG_MODE") {
        if let Ok(level) = LogLevel::parse(&env_value) {
            return Logger::new(level);
        }
    }

    Logger::new(LogLevel::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergeEvent;
    use serial_test::serial;

    fn with_log_mode<F: FnOnce()>(value: Option<&str>, f: F) {
        let saved = env::var("QEC_LOG_MODE").ok();
        match value {
            Some(v) => env::set_var("QEC_LOG_MODE", v),
            None => env::remove_var("QEC_LOG_MODE"),
        }
        f();
        match saved {
            Some(v) => env::set_var("QEC_LOG_MODE", v),
            None => env::remove_var("QEC_LOG_MODE"),
        }
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("quiet").unwrap(), LogLevel::Quiet);
        assert_eq!(LogLevel::parse("Normal").unwrap(), LogLevel::Normal);
        assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
        assert!(LogLevel::parse("").is_err());
    }

    #[test]
    fn test_level_filtering() {
        let (logger, lines) = Logger::capturing(LogLevel::Normal);
        logger.error("e");
        logger.warn("w");
        logger.info("i");
        logger.debug("d");
        assert_eq!(*lines.lock().unwrap(), vec!["ERROR: e", "WARN: w"]);
    }

    #[test]
    fn test_quiet_suppresses_everything() {
        let (logger, lines) = Logger::capturing(LogLevel::Quiet);
        logger.error("e");
        logger.warn("w");
        assert!(lines.lock().unwrap().is_empty());
    }

    #[test]
    fn test_report_uses_event_severity() {
        let mut report = MergeReport::default();
        report.push(MergeEvent::BindingSkipped {
            service: "web".into(),
            published: "80-81".into(),
        });
        report.push(MergeEvent::ResourceRenamed {
            kind: crate::merge::ResourceKind::Service,
            from: "api".into(),
            to: "web_api".into(),
        });

        let (logger, lines) = Logger::capturing(LogLevel::Normal);
        logger.report(&report);
        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("WARN:"));
        assert!(lines[0].contains("80-81"));
    }

    #[test]
    #[serial]
    fn test_init_logger_defaults() {
        with_log_mode(None, || {
            assert_eq!(init_logger(false, false).level(), LogLevel::Normal);
        });
    }

    #[test]
    #[serial]
    fn test_init_logger_flags_override_env() {
        with_log_mode(Some("quiet"), || {
            assert_eq!(init_logger(true, false).level(), LogLevel::Verbose);
            assert_eq!(init_logger(true, true).level(), LogLevel::Verbose);
            assert_eq!(init_logger(false, false).level(), LogLevel::Quiet);
        });
    }

    #[test]
    #[serial]
    fn test_init_logger_env_invalid_fallback() {
        with_log_mode(Some("chatty"), || {
            assert_eq!(init_logger(false, false).level(), LogLevel::Normal);
        });
    }
}
