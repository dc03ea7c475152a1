//! Integration tests for the log registry
//!
//! These tests verify:
//! - Per-sink thresholds and per-name overrides
//! - Configuration loading end to end, including file sinks
//! - Logger identity across reconfiguration
//! - Composite error reporting
//! - Close and reload lifecycle
//! - Log injection prevention

use parking_lot::Mutex;
use rust_log_registry::appenders::{ConsoleAppender, RotatingFileAppender};
use rust_log_registry::config::{ConfigSection, LogConfig};
use rust_log_registry::{
    fields, Appender, Closable, CompositeLogger, FieldValue, Fields, LogLevel, LogRegistry, LoggerError, OutputFormat, Record,
    Result, SinkDescriptor,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Records every write; optionally fails each one after recording it
#[derive(Default)]
struct SpySink {
    records: Mutex<Vec<Record>>,
    fail: bool,
}

impl SpySink {
    fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn count(&self) -> usize {
        self.records.lock().len()
    }
}

impl Appender for SpySink {
    fn append(&self, record: &Record) -> Result<()> {
        self.records.lock().push(record.clone());
        if self.fail {
            return Err(LoggerError::writer("spy failure"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "spy"
    }
}

#[derive(Default)]
struct CountingCloser(AtomicUsize);

impl Closable for CountingCloser {
    fn close(&self) -> Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read log file")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_console_info_file_warn_with_db_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("app.log");
    let console = SharedBuf::default();

    let file = Arc::new(
        RotatingFileAppender::new(&log_file, OutputFormat::Text).expect("Failed to create appender"),
    );
    let registry = LogRegistry::with_descriptors(vec![]);
    registry.initialize(vec![
        SinkDescriptor::new(
            Arc::new(ConsoleAppender::with_writer(console.clone(), OutputFormat::Text)),
            LogLevel::Info,
        ),
        SinkDescriptor::new(file.clone(), LogLevel::Warn)
            .with_filter("db", LogLevel::Debug)
            .with_closer(file.clone()),
    ]);

    let db = registry.logger("db");
    db.debug("slow query", fields! { "ms" => 250 });
    registry.close().expect("Failed to close");

    assert!(console.lines().is_empty());
    let lines = read_lines(&log_file);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("lvl=debug msg=\"slow query\" logger=db ms=250"));
}

#[test]
fn test_apply_config_file_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = LogRegistry::new();
    let config = LogConfig::new(["console", "file"])
        .with_logs_path(temp_dir.path())
        .with_section("log", ConfigSection::new().with("level", "info"))
        .with_section("log.console", ConfigSection::new().with("format", "text"))
        .with_section(
            "log.file",
            ConfigSection::new().with("level", "warn").with("filters", "db:debug"),
        );

    registry.apply_config(&config).expect("Failed to apply config");

    let descriptors = registry.descriptors();
    assert_eq!(descriptors.len(), 2);
    assert_eq!(descriptors[0].threshold_for("db"), LogLevel::Info);
    assert_eq!(descriptors[1].threshold_for("db"), LogLevel::Debug);
    assert_eq!(descriptors[1].threshold_for("http"), LogLevel::Warn);

    registry.logger("db").debug("from db", Fields::new());
    registry.logger("http").info("from http", Fields::new());
    registry.logger("http").warn("http warning", Fields::new());
    registry.close().expect("Failed to close");

    let lines = read_lines(&temp_dir.path().join("app.log"));
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("msg=\"from db\""));
    assert!(lines[1].contains("msg=\"http warning\""));
}

#[test]
fn test_mode_filter_wins_over_global_filter() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = LogRegistry::new();
    let config = LogConfig::new(["file", "console"])
        .with_logs_path(temp_dir.path())
        .with_section("log", ConfigSection::new().with("filters", "x:warn"))
        .with_section("log.file", ConfigSection::new().with("filters", "x:debug"))
        .with_section("log.console", ConfigSection::new());

    registry.apply_config(&config).expect("Failed to apply config");

    let descriptors = registry.descriptors();
    assert_eq!(descriptors[0].threshold_for("x"), LogLevel::Debug);
    // Global filters apply to every mode that does not override them
    assert_eq!(descriptors[1].threshold_for("x"), LogLevel::Warn);
    assert_eq!(descriptors[1].threshold_for("y"), LogLevel::Info);
    registry.close().expect("Failed to close");
}

#[test]
fn test_logger_follows_reconfiguration() {
    let first = Arc::new(SpySink::default());
    let second = Arc::new(SpySink::default());
    let registry = LogRegistry::with_descriptors(vec![]);

    let early = registry.logger("early");
    registry.initialize(vec![SinkDescriptor::new(first.clone(), LogLevel::Trace)]);
    registry.initialize(vec![SinkDescriptor::new(second.clone(), LogLevel::Trace)]);

    early.info("after both", Fields::new());
    assert_eq!(first.count(), 0);
    assert_eq!(second.count(), 1);
    assert!(Arc::ptr_eq(&early, &registry.logger("early")));
    assert_eq!(registry.metrics().reconfigurations(), 2);
}

#[test]
fn test_composite_reports_first_error_and_attempts_all() {
    let failing = Arc::new(SpySink::failing());
    let healthy = Arc::new(SpySink::default());
    let registry = LogRegistry::with_descriptors(vec![
        SinkDescriptor::new(failing.clone(), LogLevel::Trace),
        SinkDescriptor::new(healthy.clone(), LogLevel::Trace),
    ]);

    let logger = registry.logger("x");
    let err = logger
        .log(fields! { "k" => "v" })
        .expect_err("first sink should fail");

    assert!(matches!(err, LoggerError::WriterError(ref m) if m == "spy failure"));
    assert_eq!(failing.count(), 1);
    assert_eq!(healthy.count(), 1);
    assert_eq!(registry.metrics().write_failures(), 1);

    // Leveled methods swallow the error but still count it
    logger.info("swallowed", Fields::new());
    assert_eq!(healthy.count(), 2);
    assert_eq!(registry.metrics().write_failures(), 2);
}

#[test]
fn test_composite_standalone() {
    let registry = LogRegistry::with_descriptors(vec![SinkDescriptor::new(
        Arc::new(SpySink::default()),
        LogLevel::Error,
    )]);
    let composite: Arc<CompositeLogger> = registry.logger("n").delegate();

    assert_eq!(composite.sinks().len(), 1);
    assert_eq!(composite.sinks()[0].threshold(), LogLevel::Error);
}

#[test]
fn test_close_twice() {
    let closer = Arc::new(CountingCloser::default());
    let registry = LogRegistry::with_descriptors(vec![]);
    registry.initialize(vec![
        SinkDescriptor::new(Arc::new(SpySink::default()), LogLevel::Info).with_closer(closer.clone()),
    ]);

    registry.close().expect("first close");
    registry.close().expect("second close");

    assert_eq!(closer.0.load(Ordering::SeqCst), 1);
    assert_eq!(registry.closable_count(), 0);
}

#[test]
fn test_reload_after_external_rotation() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = LogRegistry::new();
    let config = LogConfig::new(["file"])
        .with_logs_path(temp_dir.path())
        .with_section("log.file", ConfigSection::new().with("log_rotate", "false"));
    registry.apply_config(&config).expect("Failed to apply config");

    let log_file = temp_dir.path().join("app.log");
    let moved = temp_dir.path().join("app.log.1");
    let logger = registry.logger("svc");

    logger.info("before", Fields::new());
    fs::rename(&log_file, &moved).expect("Failed to move log file");
    registry.reload().expect("Failed to reload");
    logger.info("after", Fields::new());
    registry.close().expect("Failed to close");

    assert_eq!(read_lines(&moved).len(), 1);
    let current = read_lines(&log_file);
    assert_eq!(current.len(), 1);
    assert!(current[0].contains("msg=after"));
    assert_eq!(registry.metrics().reloads(), 1);
}

#[test]
fn test_reconfiguration_closes_previous_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let registry = LogRegistry::new();
    let first = LogConfig::new(["file"]).with_section(
        "log.file",
        ConfigSection::new().with("file_name", temp_dir.path().join("a.log").to_str().unwrap()),
    );
    let second = LogConfig::new(["file"]).with_section(
        "log.file",
        ConfigSection::new().with("file_name", temp_dir.path().join("b.log").to_str().unwrap()),
    );

    registry.apply_config(&first).expect("Failed to apply first config");
    let logger = registry.logger("svc");
    logger.info("one", Fields::new());

    registry.apply_config(&second).expect("Failed to apply second config");
    logger.info("two", Fields::new());
    registry.close().expect("Failed to close");

    assert_eq!(read_lines(&temp_dir.path().join("a.log")).len(), 1);
    let b = read_lines(&temp_dir.path().join("b.log"));
    assert_eq!(b.len(), 1);
    assert!(b[0].contains("msg=two"));
}

#[test]
fn test_log_injection_prevention() {
    let buf = SharedBuf::default();
    let registry = LogRegistry::with_descriptors(vec![SinkDescriptor::new(
        Arc::new(ConsoleAppender::with_writer(buf.clone(), OutputFormat::Text)),
        LogLevel::Info,
    )]);

    let malicious = "User login\nlvl=error msg=\"Fake error injected\"\nContinuation";
    registry.logger("auth").info(malicious, fields! { "user" => "eve\nroot" });

    let lines = buf.lines();
    assert_eq!(lines.len(), 1, "Log should be a single line, not multiple");
    assert!(lines[0].contains("\\n"));
}

#[test]
fn test_child_logger_context() {
    let buf = SharedBuf::default();
    let registry = LogRegistry::with_descriptors(vec![SinkDescriptor::new(
        Arc::new(ConsoleAppender::with_writer(buf.clone(), OutputFormat::Json)),
        LogLevel::Trace,
    )]);

    let api = registry.logger_with("api", fields! { "region" => "eu" });
    let users = api.child("api.users", fields! { "table" => "users" });
    users.warn("slow", fields! { "ms" => 900 });

    let lines = buf.lines();
    let parsed: serde_json::Value = serde_json::from_str(&lines[0]).expect("valid JSON");
    assert_eq!(parsed["logger"], "api.users");
    assert_eq!(parsed["region"], "eu");
    assert_eq!(parsed["table"], "users");
    assert_eq!(parsed["ms"], 900);
    assert_eq!(parsed["lvl"], "warn");
    assert!(registry.logger_names().contains(&"api.users".to_string()));
}

#[test]
fn test_raw_record_passes_every_threshold() {
    let spy = Arc::new(SpySink::default());
    let registry = LogRegistry::with_descriptors(vec![SinkDescriptor::new(spy.clone(), LogLevel::Critical)]);

    registry.root().log(fields! { "event" => "boot" }).expect("raw log");
    registry.root().error("filtered", Fields::new());

    assert_eq!(spy.count(), 1);
    assert!(spy.records.lock()[0].level.is_none());
}

#[test]
fn test_odd_keyvals_rejected() {
    let flat = vec![FieldValue::from("a"), FieldValue::from(1), FieldValue::from("b")];
    let err = Fields::try_from_flat(flat).expect_err("odd list");
    assert!(matches!(err, LoggerError::OddKeyvals { len: 3 }));
}
