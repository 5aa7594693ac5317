//! # Logging Utilities
//!
//! `tracing` setup for the mdsview binaries.
//!
//! Console output goes to stderr so headless reports on stdout stay clean.
//! Optionally a second, ANSI-free copy goes to a daily rolling file. The TUI
//! cannot share the terminal with log output, so it logs to a file only.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mdsview_utils::init_logging;
//!
//! // Keep the guard alive for as long as logs should be written
//! let _guard = init_logging().expect("Failed to initialize logging");
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: level filter (e.g. `debug`, `mdsview_core=trace`)
//! - `MDSVIEW_LOG_FORMAT`: `pretty` (default) or `json`
//! - `MDSVIEW_LOG_FILE`: also write logs to this file, rotated daily

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Local;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Selects the output format
pub const LOG_FORMAT_ENV: &str = "MDSVIEW_LOG_FORMAT";

/// Adds a rolling log file next to console output
pub const LOG_FILE_ENV: &str = "MDSVIEW_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Keeps background log writers running
///
/// Dropping it flushes and stops file output.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize console logging from the environment
///
/// Reads `RUST_LOG`, `MDSVIEW_LOG_FORMAT` and `MDSVIEW_LOG_FILE`.
///
/// ## Errors
///
/// - `InvalidFormat`: `MDSVIEW_LOG_FORMAT` is not `pretty` or `json`
/// - `InitializationFailed`: a global subscriber is already installed
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    let format = match env::var(LOG_FORMAT_ENV) {
        Ok(value) => value.parse()?,
        Err(_) => LogFormat::default(),
    };
    init_console(format, None)
}

/// Initialize console logging with an explicit level and format
///
/// `MDSVIEW_LOG_FILE` is still honoured.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    init_console(format, Some(level.into()))
}

/// Initialize file-only logging for the terminal UI
///
/// Logs go to `~/.mdsview/YYYY-MM-DD-mdsview-tui.log`, or the same file name
/// in the system temp directory when there is no home directory. Returns the
/// path so the UI can tell the user where to look.
///
/// ## Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_logging_for_tui(level: Option<LogLevel>) -> Result<(PathBuf, LoggingGuard), LoggingError>
{
    let home = env::var_os("HOME").map(PathBuf::from);
    let path = tui_log_path(home.as_deref(), &Local::now().format("%Y-%m-%d").to_string());
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let (writer, guard) = file_writer(&path, false);
    let layer = file_layer(LogFormat::Pretty, writer, env_filter(level.map(Into::into)));
    install(vec![layer])?;
    Ok((path, LoggingGuard { _file: Some(guard) }))
}

/// Where the TUI log for `date` lives
pub fn tui_log_path(home: Option<&Path>, date: &str) -> PathBuf
{
    let file = format!("{date}-mdsview-tui.log");
    match home {
        Some(home) => home.join(".mdsview").join(file),
        None => env::temp_dir().join(file),
    }
}

fn init_console(format: LogFormat, level: Option<Level>) -> Result<LoggingGuard, LoggingError>
{
    let mut layers = vec![console_layer(format, env_filter(level))];
    let mut guard = None;

    if let Some(path) = env::var_os(LOG_FILE_ENV).map(PathBuf::from) {
        let (writer, file_guard) = file_writer(&path, true);
        layers.push(file_layer(format, writer, env_filter(level)));
        guard = Some(file_guard);
    }

    install(layers)?;
    Ok(LoggingGuard { _file: guard })
}

/// Explicit level first, then `RUST_LOG`, then `info`
fn env_filter(level: Option<Level>) -> EnvFilter
{
    match level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
    }
}

fn file_writer(path: &Path, rolling: bool) -> (NonBlocking, WorkerGuard)
{
    let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path.file_name().unwrap_or_default();
    // TUI file names already carry the date
    let appender = if rolling {
        tracing_appender::rolling::daily(dir, name)
    } else {
        tracing_appender::rolling::never(dir, name)
    };
    tracing_appender::non_blocking(appender)
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    let layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(io::stderr);

    match format {
        LogFormat::Pretty => layer.with_ansi(true).with_filter(filter).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, writer: NonBlocking, filter: EnvFilter) -> BoxedLayer
{
    let layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(false)
        .with_writer(writer);

    match format {
        LogFormat::Pretty => layer.with_filter(filter).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn install(layers: Vec<BoxedLayer>) -> Result<(), LoggingError>
{
    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    #[error("Invalid log format: {0} (expected 'pretty' or 'json')")]
    InvalidFormat(String),

    #[error("Invalid log level: {0} (expected error, warn, info, debug or trace)")]
    InvalidLevel(String),

    /// A global subscriber was already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert!(matches!(LogFormat::from_str("xml"), Err(LoggingError::InvalidFormat(_))));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("Trace").unwrap(), LogLevel::Trace);
        assert!(matches!(LogLevel::from_str("loud"), Err(LoggingError::InvalidLevel(_))));
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
    }

    #[test]
    fn test_tui_log_path()
    {
        let path = tui_log_path(Some(Path::new("/home/dev")), "2026-03-01");
        assert_eq!(path, Path::new("/home/dev/.mdsview/2026-03-01-mdsview-tui.log"));

        let fallback = tui_log_path(None, "2026-03-01");
        assert!(fallback.ends_with("2026-03-01-mdsview-tui.log"));
        assert!(fallback.starts_with(env::temp_dir()));
    }
}
