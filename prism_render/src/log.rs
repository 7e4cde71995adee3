//! Internal logging system for the Prism render core
//!
//! A single process-wide [`Logger`] receives every entry. Until one is
//! installed, entries go to a colored console logger. The `engine_*!` macros
//! below are the only way the rest of the crate emits diagnostics.
//!
//! Every developer-facing configuration mistake the registries recover from
//! (missing names, clamped capacities, dropped variant links) is reported here.

use colored::*;
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for Prism diagnostics.
///
/// Install one with [`set_logger`] to send entries to a file, an editor
/// console or a test capture buffer.
///
/// # Example
///
/// ```no_run
/// use prism_render::prism::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// One diagnostic as handed to the installed [`Logger`]
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,

    /// Wall-clock time the entry was emitted
    pub timestamp: SystemTime,

    /// Source component (e.g., "prism::ShaderManager", "prism::vulkan")
    pub source: String,

    pub message: String,

    /// Emitting file, set by `log_detailed` only
    pub file: Option<&'static str>,

    /// Emitting line, set by `log_detailed` only
    pub line: Option<u32>,
}

/// Severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    Trace,
    Debug,

    /// Lifecycle milestones (device created, cache loaded)
    Info,

    /// Configuration mistakes that were recovered from
    Warn,

    /// Backend failures (with file:line details)
    Error,
}

/// Console logger installed until `set_logger` replaces it.
///
/// Lines read `[timestamp] [SEVERITY] [source] message`, with ` (file:line)`
/// appended when the entry carries a location.
pub struct DefaultLogger;

impl DefaultLogger {
    fn severity_label(severity: LogSeverity) -> ColoredString {
        match severity {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        }
    }

    /// Render one entry as a console line
    pub fn format_line(entry: &LogEntry) -> String {
        let local: DateTime<Local> = entry.timestamp.into();
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            local.format("%Y-%m-%d %H:%M:%S%.3f"),
            Self::severity_label(entry.severity),
            entry.source.bright_blue(),
            entry.message,
        );
        if let (Some(file), Some(number)) = (entry.file, entry.line) {
            line.push_str(&format!(" ({}:{})", file, number));
        }
        line
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        println!("{}", Self::format_line(entry));
    }
}

// ===== GLOBAL LOGGER =====

static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn installed() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

fn install(logger: Box<dyn Logger>) {
    if let Ok(mut current) = installed().write() {
        *current = logger;
    }
}

fn dispatch(
    severity: LogSeverity,
    source: &str,
    message: String,
    location: Option<(&'static str, u32)>,
) {
    let entry = LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_owned(),
        message,
        file: location.map(|(file, _)| file),
        line: location.map(|(_, line)| line),
    };
    if let Ok(current) = installed().read() {
        current.log(&entry);
    }
}

/// Route all subsequent diagnostics to `logger`
pub fn set_logger<L: Logger + 'static>(logger: L) {
    install(Box::new(logger));
}

/// Reinstall the console `DefaultLogger`
pub fn reset_logger() {
    install(Box::new(DefaultLogger));
}

/// Emit an entry without a source location
pub fn log(severity: LogSeverity, source: &str, message: String) {
    dispatch(severity, source, message, None);
}

/// Emit an entry tagged with `file:line` (backend failures)
pub fn log_detailed(
    severity: LogSeverity,
    source: &str,
    message: String,
    file: &'static str,
    line: u32,
) {
    dispatch(severity, source, message, Some((file, line)));
}

// ===== LOGGING MACROS =====
//
// Every macro takes the emitting component first, then `format!` arguments:
//
//     prism_render::engine_warn!("prism::ShaderManager", "Shader '{}' not found", "grass.shader");

#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Trace, $source, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Debug, $source, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Info, $source, format!($($arg)*))
    };
}

/// Recovered configuration mistakes (missing names, dropped links)
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::Warn, $source, format!($($arg)*))
    };
}

/// Backend failures; the entry carries `file!()` and `line!()`
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

/// Log an ERROR and build an `Error::BackendError` carrying the same message
///
/// # Example
///
/// ```ignore
/// let module = device.create_shader_module(&info, None)
///     .map_err(|e| engine_err!("prism::vulkan", "Failed to create shader module: {:?}", e))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::error::Error::BackendError(message)
    }};
}

/// Log a WARN and build an `Error::InvalidResource` carrying the same message
#[macro_export]
macro_rules! engine_warn_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::log(
            $crate::log::LogSeverity::Warn,
            $source,
            message.clone()
        );
        $crate::error::Error::InvalidResource(message)
    }};
}

/// Log an ERROR and return `Err(Error::BackendError)` from the enclosing function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log a WARN and return `Err(Error::InvalidResource)` from the enclosing function
#[macro_export]
macro_rules! engine_bail_warn {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_warn_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
