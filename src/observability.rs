//! Logging capability injected into every component that reports progress or failures.
//!
//! Nothing in this crate writes to process streams on its own; components receive a
//! `&dyn Logger` and the [`crate::SheetsUploader`] facade wraps whatever logger it was given in a
//! [`LevelFilter`] set from [`crate::UploaderConfig::log_level`].

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::error::UploadError;

/// Log verbosity, ordered from quietest to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Nothing is logged.
    Silent,
    /// Failures only.
    Error,
    /// Failures and recoverable problems (retries, throttling).
    Warn,
    /// Operation start/finish lines.
    #[default]
    Info,
    /// Everything, including per-chunk detail.
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(UploadError::validation(format!(
                "invalid log level \"{other}\". Must be one of: silent, error, warn, info, debug"
            ))),
        }
    }
}

/// Sink for log messages.
///
/// Implementors only provide [`Logger::log`]; the level helpers forward to it.
pub trait Logger: Send + Sync {
    /// Record one message. `level` is never [`LogLevel::Silent`].
    fn log(&self, level: LogLevel, message: &str);

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message)
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message)
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message)
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message)
    }
}

/// Drops messages more verbose than `max`.
pub struct LevelFilter {
    inner: Arc<dyn Logger>,
    max: LogLevel,
}

impl LevelFilter {
    /// Wrap `inner`, passing through messages at `max` or quieter.
    pub fn new(inner: Arc<dyn Logger>, max: LogLevel) -> Self {
        Self { inner, max }
    }

    /// Whether a message at `level` would be forwarded.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Silent && level <= self.max
    }
}

impl fmt::Debug for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelFilter").field("max", &self.max).finish()
    }
}

impl Logger for LevelFilter {
    fn log(&self, level: LogLevel, message: &str) {
        if self.enabled(level) {
            self.inner.log(level, message);
        }
    }
}

/// Forwards messages to `tracing` events with target `sheets_uploader`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Silent => {}
            LogLevel::Error => tracing::error!(target: "sheets_uploader", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "sheets_uploader", "{message}"),
            LogLevel::Info => tracing::info!(target: "sheets_uploader", "{message}"),
            LogLevel::Debug => tracing::debug!(target: "sheets_uploader", "{message}"),
        }
    }
}

/// Logs to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdErrLogger;

impl Logger for StdErrLogger {
    fn log(&self, level: LogLevel, message: &str) {
        if level != LogLevel::Silent {
            eprintln!("[sheets-uploader] {}: {message}", level.as_str().to_ascii_uppercase());
        }
    }
}

/// Appends log lines to a local file.
#[derive(Debug)]
pub struct FileLogger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLogger {
    /// Create a file logger that appends lines to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl Logger for FileLogger {
    fn log(&self, level: LogLevel, message: &str) {
        if level == LogLevel::Silent {
            return;
        }
        self.append_line(&format!(
            "{} {} {message}",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            level
        ));
    }
}

/// A logger that fans out messages to a list of loggers.
#[derive(Default)]
pub struct CompositeLogger {
    loggers: Vec<Arc<dyn Logger>>,
}

impl CompositeLogger {
    /// Create a new composite logger from a list of loggers.
    pub fn new(loggers: Vec<Arc<dyn Logger>>) -> Self {
        Self { loggers }
    }
}

impl fmt::Debug for CompositeLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeLogger")
            .field("loggers_len", &self.loggers.len())
            .finish()
    }
}

impl Logger for CompositeLogger {
    fn log(&self, level: LogLevel, message: &str) {
        for l in &self.loggers {
            l.log(level, message);
        }
    }
}
