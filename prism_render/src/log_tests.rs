//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, DefaultLogger, the global
//! logger slot, and the error-building macros.

use crate::error::Error;
use crate::log::{self, Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::test_utils::CaptureLogger;
use serial_test::serial;
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "prism::test".to_string(),
        message: format!("{:?} message", severity),
        file,
        line,
    }
}

// ============================================================================
// SEVERITY / ENTRY TESTS
// ============================================================================

#[test]
fn test_severity_filters_by_ordering() {
    let all = [
        LogSeverity::Error,
        LogSeverity::Trace,
        LogSeverity::Warn,
        LogSeverity::Debug,
        LogSeverity::Info,
    ];
    let loud: Vec<_> = all.iter().filter(|s| **s >= LogSeverity::Warn).collect();

    assert_eq!(loud, vec![&LogSeverity::Error, &LogSeverity::Warn]);
    assert_eq!(all.iter().min(), Some(&LogSeverity::Trace));
}

#[test]
fn test_cloned_entry_keeps_location() {
    let original = entry(LogSeverity::Error, Some("vulkan_device.rs"), Some(42));
    let copy = original.clone();

    assert_eq!(copy.message, "Error message");
    assert_eq!(copy.file, Some("vulkan_device.rs"));
    assert_eq!(copy.line, Some(42));
    assert_eq!(copy.timestamp, original.timestamp);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_format_line_appends_location_only_when_present() {
    let plain = DefaultLogger::format_line(&entry(LogSeverity::Warn, None, None));
    let located = DefaultLogger::format_line(&entry(LogSeverity::Error, Some("vk.rs"), Some(12)));

    assert!(plain.ends_with("Warn message"));
    assert!(plain.contains("prism::test"));
    assert!(plain.contains("WARN"));
    assert!(located.ends_with("Error message (vk.rs:12)"));
    assert!(located.contains("ERROR"));
}

#[test]
fn test_format_line_ignores_partial_location() {
    let line = DefaultLogger::format_line(&entry(LogSeverity::Info, Some("vk.rs"), None));
    assert!(line.ends_with("Info message"));
}

#[test]
fn test_default_logger_prints_every_severity() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&entry(severity, Some("test.rs"), Some(7)));
    }
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
    assert_send_sync::<CaptureLogger>();
}

// ============================================================================
// GLOBAL LOGGER TESTS
// ============================================================================

#[test]
#[serial]
fn test_set_logger_routes_entries() {
    let (logger, entries) = CaptureLogger::new();
    log::set_logger(logger);

    log::log(LogSeverity::Info, "prism::test", "hello".to_string());
    log::log_detailed(LogSeverity::Error, "prism::test", "boom".to_string(), "a.rs", 3);

    {
        let captured = CaptureLogger::from_source(&entries, "prism::test");
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].message, "hello");
        assert!(captured[0].file.is_none());
        assert_eq!(captured[1].file, Some("a.rs"));
        assert_eq!(captured[1].line, Some(3));
    }

    log::reset_logger();
}

#[test]
#[serial]
fn test_reset_logger_stops_capture() {
    let (logger, entries) = CaptureLogger::new();
    log::set_logger(logger);
    log::reset_logger();

    crate::engine_info!("prism::test", "goes to the console");

    assert!(CaptureLogger::from_source(&entries, "prism::test").is_empty());
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_warn_macro_formats_message() {
    let (logger, entries) = CaptureLogger::new();
    log::set_logger(logger);

    crate::engine_warn!("prism::log_test", "Shader '{}' not found", "grass.shader");

    {
        let captured = CaptureLogger::from_source(&entries, "prism::log_test");
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].severity, LogSeverity::Warn);
        assert_eq!(captured[0].message, "Shader 'grass.shader' not found");
    }

    log::reset_logger();
}

#[test]
#[serial]
fn test_engine_err_logs_and_builds_backend_error() {
    let (logger, entries) = CaptureLogger::new();
    log::set_logger(logger);

    let err = crate::engine_err!("prism::log_test", "vk call failed: {}", -3);

    match err {
        Error::BackendError(msg) => assert_eq!(msg, "vk call failed: -3"),
        other => panic!("unexpected error: {:?}", other),
    }
    {
        let captured = CaptureLogger::from_source(&entries, "prism::log_test");
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].severity, LogSeverity::Error);
        assert!(captured[0].file.is_some());
    }

    log::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_warn_returns_invalid_resource() {
    fn lookup(found: bool) -> crate::error::Result<u32> {
        if !found {
            crate::engine_bail_warn!("prism::test", "module '{}' missing", "vs");
        }
        Ok(1)
    }

    let (logger, entries) = CaptureLogger::new();
    log::set_logger(logger);

    assert!(lookup(true).is_ok());
    match lookup(false) {
        Err(Error::InvalidResource(msg)) => assert_eq!(msg, "module 'vs' missing"),
        other => panic!("unexpected result: {:?}", other),
    }
    let captured = CaptureLogger::from_source(&entries, "prism::test");
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Warn);

    log::reset_logger();
}
